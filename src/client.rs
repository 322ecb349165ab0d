use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use crate::config::GitHubConfig;
use crate::error::{HarvestError, Result};
use crate::pager::PageTransport;
use crate::types::{PageRequest, RawPage, Repository};

pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
    config: GitHubConfig,
}

impl GitHubClient {
    pub fn new() -> Result<Self> {
        Self::with_config(GitHubConfig::default())
    }

    pub fn with_config(config: GitHubConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        // A missing token is not a construction error: fetches report a
        // distinct "not started" outcome instead of making requests.
        let token = std::env::var(&config.token_env_var)
            .ok()
            .filter(|t| !t.is_empty());

        Ok(Self {
            client,
            token,
            config,
        })
    }

    pub fn api_url(&self, repo: &Repository, resource: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.config.api_base_url, repo.owner, repo.name, resource
        )
    }

    fn request_headers(&self, token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| HarvestError::ConfigError(format!("Invalid token: {}", e)))?,
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.config.user_agent)
                .map_err(|e| HarvestError::ConfigError(format!("Invalid user agent: {}", e)))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        Ok(headers)
    }

    fn require_token(&self) -> Result<&str> {
        self.token.as_deref().ok_or_else(|| {
            HarvestError::AuthError(format!(
                "{} environment variable not set",
                self.config.token_env_var
            ))
        })
    }

    pub async fn rate_limit(&self) -> Result<String> {
        let token = self.require_token()?;
        let url = format!("{}/rate_limit", self.config.api_base_url);

        let response = self
            .client
            .get(&url)
            .headers(self.request_headers(token)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status, &body));
        }

        let payload: Value = response.json().await?;
        let core = payload.get("resources").and_then(|r| r.get("core"));
        let remaining = core
            .and_then(|c| c.get("remaining"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let limit = core
            .and_then(|c| c.get("limit"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let reset = core
            .and_then(|c| c.get("reset"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        Ok(format!(
            "Rate limit: {}/{} remaining, resets at {}",
            remaining, limit, reset
        ))
    }
}

#[async_trait]
impl PageTransport for GitHubClient {
    fn has_credential(&self) -> bool {
        self.token.is_some()
    }

    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<RawPage> {
        let token = self.require_token()?;

        debug!("GET {} page {}", request.url, request.page);

        let page = request.page.to_string();
        let per_page = request.per_page.to_string();
        let mut query: Vec<(&str, &str)> = request.params.to_vec();
        query.push(("per_page", per_page.as_str()));
        query.push(("page", page.as_str()));

        let response = self
            .client
            .get(request.url)
            .headers(self.request_headers(token)?)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status, &body));
        }

        let has_next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(link_has_next)
            .unwrap_or(false);

        let records: Vec<Value> = response.json().await?;

        Ok(RawPage { records, has_next })
    }
}

/// Classify a non-success response by the error text GitHub puts in the body.
fn classify_api_error(status: StatusCode, body: &str) -> HarvestError {
    let lowered = body.to_lowercase();

    if lowered.contains("bad credentials") {
        HarvestError::AuthError("GitHub token is invalid or has expired".to_string())
    } else if lowered.contains("rate limit exceeded") {
        HarvestError::RateLimitExceeded
    } else {
        HarvestError::ApiError(format!("Request failed with status {}: {}", status, body))
    }
}

/// GitHub Link headers look like:
/// `<https://api.github.com/repos/o/r/issues?page=2>; rel="next", <...&page=9>; rel="last"`
fn link_has_next(link_header: &str) -> bool {
    link_header
        .split(',')
        .any(|entry| entry.contains(r#"rel="next""#))
}
