use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A single tweet from the v2 search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub author_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchMeta {
    #[serde(default)]
    pub result_count: u32,
    pub newest_id: Option<String>,
    pub oldest_id: Option<String>,
}

/// Envelope of `GET /2/tweets/search/recent`. `data` is omitted entirely
/// when nothing matched.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<Tweet>,
    pub meta: Option<SearchMeta>,
}
