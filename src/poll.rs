//! Background feed polling.
//!
//! The [`Poller`] runs as a tokio task.  Each cycle it asks the search API
//! for everything newer than its cursor, appends the result to the shared
//! [`Feed`] oldest-first, and sleeps.  The very first cycle has no cursor and
//! instead looks back a fixed window from startup.
//!
//! A failed cycle is logged and retried; the cursor is left untouched so no
//! posts are skipped.  Consecutive failures back off exponentially from the
//! poll interval up to [`MAX_BACKOFF`].
//!
//! ## For contributors
//!
//! The poller drives one [`SearchApi`].  To poll another service, implement
//! that trait for it in `source/` and hand it to [`Poller::new`]; pagination
//! and the cursor logic stay here unchanged.  If several services should feed
//! the same screen, spawn one `Poller` per service over the same [`Feed`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::feed::{Feed, Viewport};
use crate::shutdown::Shutdown;
use crate::source::{fetch_recent, FeedEntry, FetchRequest, SearchApi};

/// Upper bound on the delay between failed polls.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Doubling delay, reset on success.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        let factor = 1u32.checked_shl(self.failures).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max.max(self.base))
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }
}

pub struct Poller<A: SearchApi + ?Sized> {
    api: Arc<A>,
    feed: Feed,
    viewport: Viewport,
    query: String,
    /// Lookback origin, used only until a cursor exists.
    start_time: DateTime<Utc>,
    /// Id of the newest entry seen so far.
    cursor: Option<String>,
}

impl<A: SearchApi + ?Sized> Poller<A> {
    pub fn new(
        api: Arc<A>,
        feed: Feed,
        viewport: Viewport,
        query: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            api,
            feed,
            viewport,
            query: query.into(),
            start_time,
            cursor: None,
        }
    }

    #[cfg(test)]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Run one fetch-and-append cycle; returns the number of entries added.
    pub async fn poll_once(&mut self) -> Result<usize> {
        // Roughly one screenful per cycle.
        let limit = i64::from(self.viewport.height().max(1));
        let request = FetchRequest {
            query: &self.query,
            since_id: self.cursor.as_deref(),
            start_time: Some(self.start_time),
            limit,
        };
        let entries = fetch_recent(self.api.as_ref(), &request).await?;

        // API order is newest first.
        let Some(newest) = entries.first() else {
            return Ok(0);
        };
        self.cursor = Some(newest.id().to_string());

        let added = self
            .feed
            .append(entries.into_iter().rev().map(FeedEntry::normalized));
        Ok(added)
    }

    /// Poll every `interval` until `shutdown` fires.
    pub async fn run(mut self, interval: Duration, shutdown: Shutdown) {
        let mut backoff = Backoff::new(interval, MAX_BACKOFF);
        info!(source = self.api.name(), query = %self.query, "poller started");

        loop {
            tokio::select! {
                result = self.poll_once() => match result {
                    Ok(added) => {
                        backoff.reset();
                        if added > 0 {
                            info!(added, total = self.feed.len(), cursor = ?self.cursor, "feed updated");
                        }
                    }
                    Err(e) if e.is_retryable() => {
                        backoff.record_failure();
                        warn!(error = %e, retry_in = ?backoff.delay(), "poll failed, keeping cursor");
                    }
                    Err(e) => {
                        backoff.record_failure();
                        error!(error = %e, retry_in = ?backoff.delay(), "poll failed");
                    }
                },
                _ = shutdown.wait() => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(backoff.delay()) => {}
                _ = shutdown.wait() => break,
            }
        }
        info!("poller stopped");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
