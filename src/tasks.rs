use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::types::{BugClassificationRecord, CodeSearchRecord, CommitRecord};

pub const TASK_CODE_SEARCH: &str = "code_search";
pub const TASK_CODE_REPAIR: &str = "code_repair";
pub const TASK_BUG_CLASSIFICATION: &str = "bug_classification";
pub const TASK_COMMIT_GEN: &str = "commit_gen";

fn fix_keywords() -> &'static Regex {
    static FIX_KEYWORDS: OnceLock<Regex> = OnceLock::new();
    FIX_KEYWORDS.get_or_init(|| {
        Regex::new(r"(?i)\b(fix(es|ed)?|bug|patch(ed)?|correct(s|ed)?)\b").unwrap()
    })
}

/// Whole-word, case-insensitive check for bug-fixing commit messages.
pub fn is_fix_message(message: &str) -> bool {
    fix_keywords().is_match(message)
}

/// Code search dataset: issue titles as natural-language queries.
/// Pull requests show up in the issues listing and are skipped.
pub fn code_search_records(issues: &[Value]) -> Vec<CodeSearchRecord> {
    issues
        .iter()
        .filter(|issue| issue.get("pull_request").is_none())
        .filter_map(|issue| {
            Some(CodeSearchRecord {
                task: TASK_CODE_SEARCH.to_string(),
                id: issue.get("id")?.as_u64()?,
                query: issue.get("title")?.as_str()?.to_string(),
                body: issue
                    .get("body")
                    .and_then(|b| b.as_str())
                    .map(String::from),
                url: issue.get("html_url")?.as_str()?.to_string(),
            })
        })
        .collect()
}

/// Bug classification dataset: pull requests with their label names
/// flattened; the diff_url is fetched by a later pipeline stage.
pub fn bug_classification_records(pull_requests: &[Value]) -> Vec<BugClassificationRecord> {
    pull_requests
        .iter()
        .filter_map(|pr| {
            Some(BugClassificationRecord {
                task: TASK_BUG_CLASSIFICATION.to_string(),
                id: pr.get("id")?.as_u64()?,
                pr_number: pr.get("number")?.as_u64()?,
                title: pr.get("title")?.as_str()?.to_string(),
                labels: pr
                    .get("labels")
                    .and_then(|l| l.as_array())
                    .map(|labels| {
                        labels
                            .iter()
                            .filter_map(|label| label.get("name")?.as_str().map(String::from))
                            .collect()
                    })
                    .unwrap_or_default(),
                diff_url: pr.get("diff_url")?.as_str()?.to_string(),
                state: pr.get("state")?.as_str()?.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct CommitDatasets {
    pub commit_gen: Vec<CommitRecord>,
    pub code_repair: Vec<CommitRecord>,
}

/// Commit datasets: every non-merge commit yields a commit-gen record, and
/// commits whose message mentions a fix keyword additionally yield a
/// code-repair record. Merge commits carry no single diff and are skipped.
pub fn commit_records(commits: &[Value]) -> CommitDatasets {
    let mut commit_gen = Vec::new();
    let mut code_repair = Vec::new();

    for commit in commits {
        let parent_count = commit
            .get("parents")
            .and_then(|p| p.as_array())
            .map(|p| p.len())
            .unwrap_or(0);
        if parent_count > 1 {
            continue;
        }

        let record = match commit_record(commit) {
            Some(record) => record,
            None => continue,
        };

        if is_fix_message(&record.message) {
            code_repair.push(CommitRecord {
                task: TASK_CODE_REPAIR.to_string(),
                ..record.clone()
            });
        }
        commit_gen.push(record);
    }

    CommitDatasets {
        commit_gen,
        code_repair,
    }
}

fn commit_record(commit: &Value) -> Option<CommitRecord> {
    let details = commit.get("commit")?;
    Some(CommitRecord {
        task: TASK_COMMIT_GEN.to_string(),
        sha: commit.get("sha")?.as_str()?.to_string(),
        message: details.get("message")?.as_str()?.to_string(),
        author: details
            .get("author")
            .and_then(|a| a.get("name"))
            .and_then(|n| n.as_str())
            .map(String::from),
    })
}
