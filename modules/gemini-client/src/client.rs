use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use crate::error::{GeminiError, Result};
use crate::types::{GenerateRequest, GenerateResponse};
use crate::util::truncate_to_char_boundary;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const MAX_ERROR_BODY_BYTES: usize = 500;

/// Gemini text-generation client. Cheap to clone; shares one connection pool.
#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| GeminiError::Config(format!("invalid api key header: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        debug!(model = %self.model, "Gemini generateContent request");

        let response = self
            .http
            .post(self.endpoint())
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message: truncate_to_char_boundary(&body, MAX_ERROR_BODY_BYTES).to_string(),
            });
        }

        Ok(response.json().await?)
    }

    /// Send a single prompt at temperature 0 and return the trimmed answer text.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest::prompt(prompt).temperature(0.0);
        let response = self.generate(&request).await?;
        response
            .text()
            .map(|t| t.trim().to_string())
            .ok_or(GeminiError::EmptyResponse)
    }
}
