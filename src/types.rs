use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HarvestError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub full_name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        let owner = owner.into();
        let name = name.into();
        let full_name = format!("{}/{}", owner, name);
        Self {
            owner,
            name,
            full_name,
        }
    }

    pub fn from_full_name(full_name: &str) -> Result<Self> {
        let parts: Vec<&str> = full_name.split('/').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(HarvestError::InvalidRepository(format!(
                "expected 'owner/name', got: {}",
                full_name
            )));
        }
        Ok(Self::new(parts[0], parts[1]))
    }
}

/// One page request as handed to the transport.
#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub url: &'a str,
    pub params: &'a [(&'a str, &'a str)],
    pub page: u32,
    pub per_page: u8,
}

/// One page of raw API records plus the continuation indicator taken
/// from the response metadata.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub records: Vec<Value>,
    pub has_next: bool,
}

/// Result of a paginated fetch.
///
/// `NotStarted` means no credential was configured and no request was made.
/// It is deliberately distinct from an empty `FetchSummary`, which means the
/// source was queried and had nothing (or nothing more) to give.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    NotStarted,
    Fetched(FetchSummary),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSummary {
    pub records: Vec<Value>,
    pub pages_fetched: u32,
    /// Number of rate-limit cooldowns taken during the fetch.
    pub rate_limit_pauses: u32,
    pub collected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSearchRecord {
    pub task: String,
    pub id: u64,
    /// Issue title, used as the natural-language query.
    pub query: String,
    pub body: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugClassificationRecord {
    pub task: String,
    pub id: u64,
    pub pr_number: u64,
    pub title: String,
    pub labels: Vec<String>,
    pub diff_url: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub task: String,
    pub sha: String,
    pub message: String,
    pub author: Option<String>,
}
