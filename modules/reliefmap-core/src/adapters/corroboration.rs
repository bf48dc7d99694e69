use anyhow::Result;
use async_trait::async_trait;
use twitter_client::{Tweet, TwitterClient};

use reliefmap_common::CorroborationPost;

use crate::traits::CorroborationSearch;

/// Posts requested per corroboration search.
const MAX_POSTS: u32 = 10;

/// Corroboration via Twitter/X recent search.
pub struct TwitterCorroboration {
    client: TwitterClient,
}

impl TwitterCorroboration {
    pub fn new(client: TwitterClient) -> Self {
        Self { client }
    }
}

fn to_post(tweet: Tweet) -> CorroborationPost {
    CorroborationPost {
        text: tweet.text,
        author: tweet.author_id,
        created_at: tweet.created_at,
    }
}

#[async_trait]
impl CorroborationSearch for TwitterCorroboration {
    async fn search(&self, query: &str) -> Result<Vec<CorroborationPost>> {
        let tweets = self.client.search_recent(query, MAX_POSTS).await?;
        Ok(tweets
            .into_iter()
            .take(MAX_POSTS as usize)
            .map(to_post)
            .collect())
    }
}

/// Used when no bearer token is configured: every search finds nothing.
pub struct NoCorroboration;

#[async_trait]
impl CorroborationSearch for NoCorroboration {
    async fn search(&self, _query: &str) -> Result<Vec<CorroborationPost>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tweet_maps_author_and_time() {
        let tweet: Tweet = serde_json::from_str(
            r#"{"id":"9","text":"Roads under water in Chennai","author_id":"77","created_at":"2024-12-01T10:00:00Z"}"#,
        )
        .unwrap();
        let post = to_post(tweet);
        assert_eq!(post.text, "Roads under water in Chennai");
        assert_eq!(post.author.as_deref(), Some("77"));
        assert!(post.created_at.is_some());
    }

    #[tokio::test]
    async fn disabled_search_is_empty() {
        assert!(NoCorroboration.search("flood Chennai").await.unwrap().is_empty());
    }
}
