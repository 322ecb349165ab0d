use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use serde_json::Value;
use tokio::time::sleep;

use crate::config::RateLimitConfig;
use crate::error::{HarvestError, Result};
use crate::types::{FetchOutcome, FetchSummary, PageRequest, RawPage};

/// Seam between the pagination loop and the HTTP layer.
///
/// The production implementation is [`crate::GitHubClient`]; tests script
/// page sequences so the loop (including the rate-limit cooldown path) runs
/// without a network or a real hour-long wait.
#[async_trait]
pub trait PageTransport {
    fn has_credential(&self) -> bool {
        true
    }

    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<RawPage>;
}

/// Drives page requests against one endpoint, accumulating raw records.
pub struct Paginator<'a, T: PageTransport> {
    transport: &'a T,
    limits: &'a RateLimitConfig,
}

impl<'a, T: PageTransport> Paginator<'a, T> {
    pub fn new(transport: &'a T, limits: &'a RateLimitConfig) -> Self {
        Self { transport, limits }
    }

    /// Fetches pages starting at 1 until the source is exhausted, `max_items`
    /// is reached, or an unrecoverable failure occurs.
    ///
    /// Failure handling:
    /// - authentication rejection aborts the fetch with an error
    /// - a rate-limit rejection suspends for the configured cooldown, then
    ///   retries the same page; accumulated records are kept
    /// - any other failure ends the fetch with the partial accumulation
    pub async fn fetch(
        &self,
        url: &str,
        params: &[(&str, &str)],
        max_items: Option<usize>,
    ) -> Result<FetchOutcome> {
        if !self.transport.has_credential() {
            warn!("No API credential configured, skipping fetch of {}", url);
            return Ok(FetchOutcome::NotStarted);
        }

        let mut records: Vec<Value> = Vec::new();
        let mut page = 1u32;
        let mut pages_fetched = 0u32;
        let mut rate_limit_pauses = 0u32;

        loop {
            if let Some(max) = max_items {
                if records.len() >= max {
                    info!("Item limit ({}) reached, stopping fetch", max);
                    break;
                }
            }

            let request = PageRequest {
                url,
                params,
                page,
                per_page: self.limits.per_page,
            };

            match self.transport.fetch_page(&request).await {
                Ok(raw) => {
                    if raw.records.is_empty() {
                        info!("All data fetched (empty page {})", page);
                        break;
                    }

                    records.extend(raw.records);
                    pages_fetched += 1;
                    info!("Page {} fetched, {} records so far", page, records.len());

                    if !raw.has_next {
                        info!("All data fetched (no next page indicator)");
                        break;
                    }

                    page += 1;
                    sleep(self.limits.delay_duration()).await;
                }
                Err(HarvestError::RateLimitExceeded) => {
                    rate_limit_pauses += 1;
                    warn!(
                        "API rate limit exceeded, cooling down for {}s before retrying page {}",
                        self.limits.rate_limit_cooldown_secs, page
                    );
                    sleep(self.limits.cooldown_duration()).await;
                }
                Err(err @ HarvestError::AuthError(_)) => {
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        "Request for page {} failed ({}), keeping the {} records fetched so far",
                        page,
                        err,
                        records.len()
                    );
                    break;
                }
            }
        }

        if let Some(max) = max_items {
            records.truncate(max);
        }

        Ok(FetchOutcome::Fetched(FetchSummary {
            records,
            pages_fetched,
            rate_limit_pauses,
            collected_at: Utc::now(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    enum Step {
        Page(RawPage),
        RateLimited,
        AuthRejected,
        Broken,
    }

    struct ScriptedTransport {
        script: Mutex<VecDeque<Step>>,
        requested_pages: Mutex<Vec<u32>>,
        credential: bool,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Step>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                requested_pages: Mutex::new(Vec::new()),
                credential: true,
            }
        }

        fn without_credential() -> Self {
            let mut transport = Self::new(Vec::new());
            transport.credential = false;
            transport
        }

        fn requested(&self) -> Vec<u32> {
            self.requested_pages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageTransport for ScriptedTransport {
        fn has_credential(&self) -> bool {
            self.credential
        }

        async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<RawPage> {
            self.requested_pages.lock().unwrap().push(request.page);
            let step = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .expect("transport queried past the end of its script");
            match step {
                Step::Page(page) => Ok(page),
                Step::RateLimited => Err(HarvestError::RateLimitExceeded),
                Step::AuthRejected => {
                    Err(HarvestError::AuthError("bad credentials".to_string()))
                }
                Step::Broken => Err(HarvestError::ApiError("boom".to_string())),
            }
        }
    }

    fn page_of(start: usize, count: usize, has_next: bool) -> Step {
        let records = (start..start + count).map(|seq| json!({ "seq": seq })).collect();
        Step::Page(RawPage { records, has_next })
    }

    fn fast_limits() -> RateLimitConfig {
        RateLimitConfig {
            delay_between_requests_ms: 0,
            rate_limit_cooldown_secs: 0,
            per_page: 100,
        }
    }

    fn summary(outcome: FetchOutcome) -> FetchSummary {
        match outcome {
            FetchOutcome::Fetched(summary) => summary,
            FetchOutcome::NotStarted => panic!("expected a started fetch"),
        }
    }

    #[tokio::test]
    async fn test_two_page_fetch_in_arrival_order() {
        let transport =
            ScriptedTransport::new(vec![page_of(0, 100, true), page_of(100, 37, false)]);
        let limits = fast_limits();
        let pager = Paginator::new(&transport, &limits);

        let outcome = pager.fetch("issues", &[], None).await.unwrap();
        let summary = summary(outcome);

        assert_eq!(summary.records.len(), 137);
        assert_eq!(summary.pages_fetched, 2);
        assert_eq!(summary.rate_limit_pauses, 0);
        for (i, record) in summary.records.iter().enumerate() {
            assert_eq!(record["seq"], i);
        }
        assert_eq!(transport.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_cap_truncates_and_skips_later_pages() {
        // Page 2 is never requested: the cap is checked before each request.
        let transport = ScriptedTransport::new(vec![page_of(0, 100, true)]);
        let limits = fast_limits();
        let pager = Paginator::new(&transport, &limits);

        let outcome = pager.fetch("issues", &[], Some(50)).await.unwrap();
        let summary = summary(outcome);

        assert_eq!(summary.records.len(), 50);
        assert_eq!(summary.records[49]["seq"], 49);
        assert_eq!(transport.requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_zero_cap_makes_no_requests() {
        let transport = ScriptedTransport::new(Vec::new());
        let limits = fast_limits();
        let pager = Paginator::new(&transport, &limits);

        let outcome = pager.fetch("issues", &[], Some(0)).await.unwrap();
        let summary = summary(outcome);

        assert!(summary.records.is_empty());
        assert!(transport.requested().is_empty());
    }

    #[tokio::test]
    async fn test_empty_page_terminates() {
        let transport = ScriptedTransport::new(vec![Step::Page(RawPage {
            records: Vec::new(),
            has_next: true,
        })]);
        let limits = fast_limits();
        let pager = Paginator::new(&transport, &limits);

        let outcome = pager.fetch("commits", &[], None).await.unwrap();
        let summary = summary(outcome);

        assert!(summary.records.is_empty());
        assert_eq!(summary.pages_fetched, 0);
        assert_eq!(transport.requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_missing_next_indicator_terminates() {
        // The second scripted page must never be requested.
        let transport =
            ScriptedTransport::new(vec![page_of(0, 10, false), page_of(10, 10, false)]);
        let limits = fast_limits();
        let pager = Paginator::new(&transport, &limits);

        let outcome = pager.fetch("pulls", &[], None).await.unwrap();
        let summary = summary(outcome);

        assert_eq!(summary.records.len(), 10);
        assert_eq!(transport.requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_rate_limit_retries_same_page() {
        let transport = ScriptedTransport::new(vec![
            page_of(0, 100, true),
            Step::RateLimited,
            page_of(100, 37, false),
        ]);
        let limits = fast_limits();
        let pager = Paginator::new(&transport, &limits);

        let outcome = pager.fetch("commits", &[], None).await.unwrap();
        let summary = summary(outcome);

        assert_eq!(summary.records.len(), 137);
        assert_eq!(summary.rate_limit_pauses, 1);
        assert_eq!(transport.requested(), vec![1, 2, 2]);
    }

    #[tokio::test]
    async fn test_auth_rejection_aborts_with_error() {
        let transport =
            ScriptedTransport::new(vec![page_of(0, 50, true), Step::AuthRejected]);
        let limits = fast_limits();
        let pager = Paginator::new(&transport, &limits);

        let result = pager.fetch("issues", &[], None).await;
        assert!(matches!(result, Err(HarvestError::AuthError(_))));
    }

    #[tokio::test]
    async fn test_other_failures_keep_partial_results() {
        let transport = ScriptedTransport::new(vec![page_of(0, 100, true), Step::Broken]);
        let limits = fast_limits();
        let pager = Paginator::new(&transport, &limits);

        let outcome = pager.fetch("issues", &[], None).await.unwrap();
        let summary = summary(outcome);

        assert_eq!(summary.records.len(), 100);
        assert_eq!(summary.pages_fetched, 1);
    }

    #[tokio::test]
    async fn test_missing_credential_reports_not_started() {
        let transport = ScriptedTransport::without_credential();
        let limits = fast_limits();
        let pager = Paginator::new(&transport, &limits);

        let outcome = pager.fetch("issues", &[], None).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::NotStarted));
        assert!(transport.requested().is_empty());
    }
}
