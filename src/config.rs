use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HarvestConfig {
    pub github: GitHubConfig,
    pub rate_limiting: RateLimitConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    pub token_env_var: String,
    pub api_base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token_env_var: "GITHUB_TOKEN".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            user_agent: "github-harvest/0.1.0".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Courtesy pause between successive page fetches.
    pub delay_between_requests_ms: u64,
    /// How long to suspend after the API reports an exhausted rate limit.
    /// One hour plus a small buffer so the quota window has fully rolled over.
    pub rate_limit_cooldown_secs: u64,
    pub per_page: u8,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            delay_between_requests_ms: 1000,
            rate_limit_cooldown_secs: 3601,
            per_page: 100,
        }
    }
}

impl RateLimitConfig {
    pub fn delay_duration(&self) -> Duration {
        Duration::from_millis(self.delay_between_requests_ms)
    }

    pub fn cooldown_duration(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}
