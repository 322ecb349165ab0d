pub mod client;
pub mod config;
pub mod error;
pub mod harvest;
pub mod pager;
pub mod tasks;
pub mod types;
pub mod writer;

pub use client::GitHubClient;
pub use config::{GitHubConfig, HarvestConfig, OutputConfig, RateLimitConfig};
pub use error::{HarvestError, Result};
pub use harvest::{
    Harvester, TaskReport, BUG_CLASSIFICATION_FILE, CODE_REPAIR_FILE, CODE_SEARCH_FILE,
    COMMIT_GEN_FILE,
};
pub use pager::{PageTransport, Paginator};
pub use tasks::{
    bug_classification_records, code_search_records, commit_records, is_fix_message,
    CommitDatasets,
};
pub use types::{
    BugClassificationRecord, CodeSearchRecord, CommitRecord, FetchOutcome, FetchSummary,
    PageRequest, RawPage, Repository,
};

pub struct HarvesterBuilder {
    config: HarvestConfig,
    repo: Option<Repository>,
    max_items: Option<usize>,
}

impl HarvesterBuilder {
    pub fn new() -> Self {
        Self {
            config: HarvestConfig::default(),
            repo: None,
            max_items: None,
        }
    }

    pub fn token(self, token: impl Into<String>) -> Self {
        std::env::set_var(&self.config.github.token_env_var, token.into());
        self
    }

    pub fn token_env_var(mut self, var_name: impl Into<String>) -> Self {
        self.config.github.token_env_var = var_name.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.github.api_base_url = url.into();
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.github.user_agent = agent.into();
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.config.github.timeout_seconds = seconds;
        self
    }

    pub fn repository(mut self, repo: Repository) -> Self {
        self.repo = Some(repo);
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.config.output.directory = dir.into();
        self
    }

    pub fn page_pause_ms(mut self, millis: u64) -> Self {
        self.config.rate_limiting.delay_between_requests_ms = millis;
        self
    }

    pub fn rate_limit_cooldown_secs(mut self, seconds: u64) -> Self {
        self.config.rate_limiting.rate_limit_cooldown_secs = seconds;
        self
    }

    pub fn build(self) -> Result<Harvester> {
        let repo = self.repo.ok_or_else(|| {
            HarvestError::ConfigError("repository not set on HarvesterBuilder".to_string())
        })?;
        Harvester::new(self.config, repo, self.max_items)
    }
}

impl Default for HarvesterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
