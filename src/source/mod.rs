//! Data source abstraction layer.
//!
//! This module defines the [`SearchApi`] trait (one request, one page of
//! results) and [`fetch_recent`], which drives a `SearchApi` through as many
//! pages as the pagination policy allows.  The concrete HTTP client lives in
//! [`twitter`]; the shared data types live in [`entry`].
//!
//! ## Pagination policy
//!
//! Each request carries at most one filter, chosen in this order:
//!
//! 1. the continuation token from the previous page of the same call,
//! 2. "newer than `since_id`" when a cursor exists,
//! 3. "created after `start_time`" for the very first poll.
//!
//! Paging stops when a response carries no continuation token, or once the
//! accumulated result count reaches `limit` (a `limit <= 0` means no cap).

mod entry;
mod twitter;

pub use entry::{Author, FeedEntry, Post};
pub use twitter::TwitterSearch;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;

/// The single filter attached to one search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFilter {
    /// Continue a multi-page result set.
    NextToken(String),
    /// Only items newer than this id.
    SinceId(String),
    /// Only items created after this instant.
    StartTime(DateTime<Utc>),
    /// No filter at all.
    Unfiltered,
}

impl PageFilter {
    fn choose(next_token: Option<&str>, since_id: Option<&str>, start_time: Option<DateTime<Utc>>) -> Self {
        if let Some(token) = next_token.filter(|t| !t.is_empty()) {
            return PageFilter::NextToken(token.to_string());
        }
        if let Some(id) = since_id.filter(|id| !id.is_empty()) {
            return PageFilter::SinceId(id.to_string());
        }
        match start_time {
            Some(ts) => PageFilter::StartTime(ts),
            None => PageFilter::Unfiltered,
        }
    }
}

/// One decoded page: author-resolved entries in API (newest-first) order.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub entries: Vec<FeedEntry>,
    pub next_token: Option<String>,
}

/// Trait that every search backend must implement.
///
/// The poller calls it from a background task, so implementations must be
/// `Send + Sync`.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Human-readable label used in log lines.
    fn name(&self) -> &str;

    /// Issue exactly one search request and decode its page.
    async fn search_page(&self, query: &str, filter: &PageFilter) -> Result<SearchPage>;
}

/// Arguments to one [`fetch_recent`] call.
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    pub query: &'a str,
    pub since_id: Option<&'a str>,
    pub start_time: Option<DateTime<Utc>>,
    /// Stop paging once this many entries are collected; `<= 0` = no cap.
    pub limit: i64,
}

/// Fetch every page the pagination policy allows, newest-first.
pub async fn fetch_recent<A>(api: &A, request: &FetchRequest<'_>) -> Result<Vec<FeedEntry>>
where
    A: SearchApi + ?Sized,
{
    let mut entries = Vec::new();
    let mut next_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let filter = PageFilter::choose(next_token.as_deref(), request.since_id, request.start_time);
        let page = api.search_page(request.query, &filter).await?;
        pages += 1;
        entries.extend(page.entries);

        next_token = page.next_token.filter(|t| !t.is_empty());
        if next_token.is_none() {
            break;
        }
        if request.limit > 0 && entries.len() as i64 >= request.limit {
            break;
        }
    }

    debug!(source = api.name(), pages, count = entries.len(), "fetch complete");
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::fake::{post, FakeSearch};
    use super::*;
    use chrono::TimeZone;

    fn request<'a>(since_id: Option<&'a str>, start: Option<DateTime<Utc>>, limit: i64) -> FetchRequest<'a> {
        FetchRequest {
            query: "#rustlang",
            since_id,
            start_time: start,
            limit,
        }
    }

    #[test]
    fn since_id_wins_over_start_time() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            PageFilter::choose(None, Some("10"), Some(ts)),
            PageFilter::SinceId("10".into())
        );
    }

    #[test]
    fn empty_since_id_falls_back_to_start_time() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(PageFilter::choose(None, Some(""), Some(ts)), PageFilter::StartTime(ts));
        assert_eq!(PageFilter::choose(None, None, None), PageFilter::Unfiltered);
    }

    #[test]
    fn token_supersedes_everything() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            PageFilter::choose(Some("tok"), Some("10"), Some(ts)),
            PageFilter::NextToken("tok".into())
        );
    }

    #[tokio::test]
    async fn single_page_without_token_makes_one_request() {
        let api = FakeSearch::new().page(vec![post("2", 2, "a", "x"), post("1", 1, "b", "y")], None);
        let got = fetch_recent(&api, &request(None, None, 10)).await.unwrap();

        assert_eq!(got.len(), 2);
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn follows_tokens_until_exhausted() {
        let api = FakeSearch::new()
            .page(vec![post("6", 6, "a", "")], Some("t1"))
            .page(vec![post("5", 5, "a", "")], Some("t2"))
            .page(vec![post("4", 4, "a", "")], None);

        let got = fetch_recent(&api, &request(Some("3"), None, 0)).await.unwrap();

        assert_eq!(got.iter().map(|e| e.id()).collect::<Vec<_>>(), ["6", "5", "4"]);
        assert_eq!(
            api.calls(),
            vec![
                PageFilter::SinceId("3".into()),
                PageFilter::NextToken("t1".into()),
                PageFilter::NextToken("t2".into()),
            ]
        );
    }

    #[tokio::test]
    async fn stops_once_limit_is_reached() {
        let api = FakeSearch::new()
            .page(vec![post("9", 9, "a", ""), post("8", 8, "a", "")], Some("t1"))
            .page(vec![post("7", 7, "a", ""), post("6", 6, "a", "")], Some("t2"))
            .page(vec![post("5", 5, "a", "")], None);

        let got = fetch_recent(&api, &request(None, None, 3)).await.unwrap();

        assert_eq!(got.len(), 4, "the page that crosses the limit is kept whole");
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn negative_limit_means_no_cap() {
        let api = FakeSearch::new()
            .page(vec![post("2", 2, "a", "")], Some("t1"))
            .page(vec![post("1", 1, "a", "")], None);

        let got = fetch_recent(&api, &request(None, None, -1)).await.unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn empty_token_counts_as_no_token() {
        let api = FakeSearch::new()
            .page(vec![post("1", 1, "a", "")], Some(""))
            .page(vec![post("0", 0, "a", "")], None);

        fetch_recent(&api, &request(None, None, 0)).await.unwrap();
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn a_failing_page_fails_the_call() {
        let api = FakeSearch::new().page(vec![post("1", 1, "a", "")], Some("t1")).failure();
        assert!(fetch_recent(&api, &request(None, None, 0)).await.is_err());
    }
}
