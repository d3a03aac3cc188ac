//! Recent-search client for the Twitter/X v2 API.
//!
//! One [`SearchApi::search_page`] call is one `GET /2/tweets/search/recent`
//! request.  The response's `includes.users` expansion is joined into each
//! post by author id; posts whose author is missing from the expansion are
//! dropped because a row without a handle can't be rendered or linked.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Author, FeedEntry, PageFilter, Post, SearchApi, SearchPage};
use crate::error::{DashError, Result};

const SEARCH_PATH: &str = "/2/tweets/search/recent";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<RawPost>,
    #[serde(default)]
    includes: Includes,
    #[serde(default)]
    meta: Meta,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    id: String,
    text: String,
    created_at: String,
    author_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<Author>,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    next_token: Option<String>,
}

impl SearchResponse {
    /// Join authors into posts and build the page, keeping API order.
    ///
    /// Posts whose author is missing from `includes` or whose timestamp
    /// doesn't parse are dropped; the rest of the page is kept.
    fn into_page(self) -> SearchPage {
        let authors: HashMap<String, Author> = self
            .includes
            .users
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();

        let mut entries = Vec::with_capacity(self.data.len());
        for raw in self.data {
            let Some(author) = authors.get(&raw.author_id) else {
                debug!(id = %raw.id, author_id = %raw.author_id, "dropping post with unresolved author");
                continue;
            };
            let created_at = match DateTime::parse_from_rfc3339(&raw.created_at) {
                Ok(ts) => ts.with_timezone(&Utc),
                Err(e) => {
                    warn!(
                        id = %raw.id,
                        created_at = %raw.created_at,
                        error = %e,
                        "dropping post with unparseable created_at"
                    );
                    continue;
                }
            };
            entries.push(FeedEntry::Twitter(Post::new(
                raw.id,
                raw.text,
                created_at,
                author.clone(),
            )));
        }

        SearchPage {
            entries,
            next_token: self.meta.next_token,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Bearer-authenticated recent-search client.
pub struct TwitterSearch {
    client: Client,
    base_url: String,
    token: String,
}

impl TwitterSearch {
    /// Create a client against `base_url` (e.g. `https://api.twitter.com`).
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("livescroll-tweets/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn query_params(query: &str, filter: &PageFilter) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query", query.to_string()),
            ("tweet.fields", "created_at".to_string()),
            ("expansions", "author_id".to_string()),
        ];
        match filter {
            PageFilter::NextToken(token) => params.push(("next_token", token.clone())),
            PageFilter::SinceId(id) => params.push(("since_id", id.clone())),
            PageFilter::StartTime(ts) => params.push((
                "start_time",
                ts.to_rfc3339_opts(SecondsFormat::Secs, true),
            )),
            PageFilter::Unfiltered => {}
        }
        params
    }
}

#[async_trait]
impl SearchApi for TwitterSearch {
    fn name(&self) -> &str {
        "twitter"
    }

    async fn search_page(&self, query: &str, filter: &PageFilter) -> Result<SearchPage> {
        let url = format!("{}{SEARCH_PATH}", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&Self::query_params(query, filter))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "search request rejected");
            return Err(DashError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str::<SearchResponse>(&body)?.into_page())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
