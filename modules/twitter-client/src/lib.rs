pub mod error;
pub mod types;

pub use error::{Result, TwitterError};
pub use types::{SearchMeta, SearchResponse, Tweet};

const BASE_URL: &str = "https://api.twitter.com/2";

/// The v2 recent-search endpoint accepts 10..=100 results per page.
const MIN_RESULTS: u32 = 10;
const MAX_RESULTS: u32 = 100;

pub struct TwitterClient {
    client: reqwest::Client,
    bearer_token: String,
    base_url: String,
}

impl TwitterClient {
    pub fn new(bearer_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            bearer_token,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Search tweets from the last seven days matching `query`.
    pub async fn search_recent(&self, query: &str, max_results: u32) -> Result<Vec<Tweet>> {
        let max_results = max_results.clamp(MIN_RESULTS, MAX_RESULTS).to_string();
        let url = format!("{}/tweets/search/recent", self.base_url.trim_end_matches('/'));

        tracing::debug!(query, "twitter: recent search");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", query),
                ("max_results", max_results.as_str()),
                ("tweet.fields", "created_at,text,author_id"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TwitterError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: SearchResponse = resp.json().await?;
        tracing::debug!(count = body.data.len(), "twitter: search complete");
        Ok(body.data)
    }
}
