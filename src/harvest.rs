use log::{error, info};
use serde::Serialize;
use std::path::PathBuf;

use crate::client::GitHubClient;
use crate::config::HarvestConfig;
use crate::error::Result;
use crate::pager::{PageTransport, Paginator};
use crate::tasks;
use crate::types::{FetchOutcome, FetchSummary, Repository};
use crate::writer::write_jsonl;

pub const CODE_SEARCH_FILE: &str = "task_1_code_search.jsonl";
pub const CODE_REPAIR_FILE: &str = "task_2_code_repair.jsonl";
pub const BUG_CLASSIFICATION_FILE: &str = "task_3_bug_classification.jsonl";
pub const COMMIT_GEN_FILE: &str = "task_4_commit_gen.jsonl";

const LIST_PARAMS: &[(&str, &str)] = &[
    ("state", "all"),
    ("sort", "updated"),
    ("direction", "desc"),
];

#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task: String,
    pub path: PathBuf,
    pub records_written: usize,
    pub pages_fetched: u32,
    pub rate_limit_pauses: u32,
}

/// Runs the dataset extraction tasks for one repository: fetch, reshape,
/// write. Tasks are independent and run strictly one after another.
pub struct Harvester {
    client: GitHubClient,
    config: HarvestConfig,
    repo: Repository,
    max_items: Option<usize>,
}

impl Harvester {
    pub fn new(config: HarvestConfig, repo: Repository, max_items: Option<usize>) -> Result<Self> {
        let client = GitHubClient::with_config(config.github.clone())?;
        Ok(Self {
            client,
            config,
            repo,
            max_items,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.client.has_credential()
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub async fn rate_limit(&self) -> Result<String> {
        self.client.rate_limit().await
    }

    async fn fetch(&self, resource: &str, params: &[(&str, &str)]) -> Result<FetchOutcome> {
        let url = self.client.api_url(&self.repo, resource);
        Paginator::new(&self.client, &self.config.rate_limiting)
            .fetch(&url, params, self.max_items)
            .await
    }

    /// Task 1: issue titles as code-search queries.
    pub async fn run_code_search(&self) -> Result<Vec<TaskReport>> {
        info!(
            "Task 1: collecting code search (issues) data from {}",
            self.repo.full_name
        );

        let summary = match self.fetch("issues", LIST_PARAMS).await? {
            FetchOutcome::NotStarted => return Ok(Vec::new()),
            FetchOutcome::Fetched(summary) => summary,
        };

        let records = tasks::code_search_records(&summary.records);
        let report =
            self.write_dataset(tasks::TASK_CODE_SEARCH, CODE_SEARCH_FILE, &records, &summary)?;
        Ok(vec![report])
    }

    /// Task 3: pull requests with labels for bug classification.
    pub async fn run_bug_classification(&self) -> Result<Vec<TaskReport>> {
        info!(
            "Task 3: collecting bug classification (pull request) data from {}",
            self.repo.full_name
        );

        let summary = match self.fetch("pulls", LIST_PARAMS).await? {
            FetchOutcome::NotStarted => return Ok(Vec::new()),
            FetchOutcome::Fetched(summary) => summary,
        };

        let records = tasks::bug_classification_records(&summary.records);
        let report = self.write_dataset(
            tasks::TASK_BUG_CLASSIFICATION,
            BUG_CLASSIFICATION_FILE,
            &records,
            &summary,
        )?;
        Ok(vec![report])
    }

    /// Tasks 2 & 4: one commit fetch feeding both the commit-gen and the
    /// code-repair dataset.
    pub async fn run_commit_tasks(&self) -> Result<Vec<TaskReport>> {
        info!(
            "Tasks 2 & 4: collecting commit data (code repair & commit gen) from {}",
            self.repo.full_name
        );

        let summary = match self.fetch("commits", &[]).await? {
            FetchOutcome::NotStarted => return Ok(Vec::new()),
            FetchOutcome::Fetched(summary) => summary,
        };

        let datasets = tasks::commit_records(&summary.records);
        let gen_report = self.write_dataset(
            tasks::TASK_COMMIT_GEN,
            COMMIT_GEN_FILE,
            &datasets.commit_gen,
            &summary,
        )?;
        let repair_report = self.write_dataset(
            tasks::TASK_CODE_REPAIR,
            CODE_REPAIR_FILE,
            &datasets.code_repair,
            &summary,
        )?;
        Ok(vec![gen_report, repair_report])
    }

    /// Runs every task in order. A failing task is logged and the next one
    /// still runs; the process-level contract is "always complete".
    pub async fn run_all(&self) -> Vec<TaskReport> {
        let mut reports = Vec::new();

        match self.run_code_search().await {
            Ok(task_reports) => reports.extend(task_reports),
            Err(err) => error!("Code search task failed: {}", err),
        }
        match self.run_bug_classification().await {
            Ok(task_reports) => reports.extend(task_reports),
            Err(err) => error!("Bug classification task failed: {}", err),
        }
        match self.run_commit_tasks().await {
            Ok(task_reports) => reports.extend(task_reports),
            Err(err) => error!("Commit tasks failed: {}", err),
        }

        reports
    }

    fn write_dataset<T: Serialize>(
        &self,
        task: &str,
        filename: &str,
        records: &[T],
        summary: &FetchSummary,
    ) -> Result<TaskReport> {
        let path = self.config.output.directory.join(filename);
        let written = write_jsonl(&path, records)?;
        info!("Saved {} records to {}", written, path.display());

        Ok(TaskReport {
            task: task.to_string(),
            path,
            records_written: written,
            pages_fetched: summary.pages_fetched,
            rate_limit_pauses: summary.rate_limit_pauses,
        })
    }
}
