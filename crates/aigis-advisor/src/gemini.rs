use anyhow::{anyhow, Context};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::{request_body, AdvisorConfig, AdvisorError};

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Minimal client for the `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String, config: &AdvisorConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let url = format!(
            "{}/models/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model
        );
        Ok(Self { http, url, api_key })
    }

    pub(crate) async fn generate(&self, prompt: &str) -> Result<String, AdvisorError> {
        let response = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(prompt))
            .send()
            .await
            .context("Text-generation request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read text-generation response")?;
        if is_quota_error(status, &body) {
            return Err(AdvisorError::Quota);
        }
        if !status.is_success() {
            return Err(anyhow!("Text-generation service returned {}", status).into());
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).context("Failed to decode text-generation response")?;
        first_text(parsed).ok_or_else(|| anyhow!("Text-generation response had no text").into())
    }
}

fn is_quota_error(status: StatusCode, body: &str) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || body.contains("RESOURCE_EXHAUSTED")
}

fn first_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .find(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_detection() {
        assert!(is_quota_error(StatusCode::TOO_MANY_REQUESTS, ""));
        assert!(is_quota_error(
            StatusCode::FORBIDDEN,
            r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#
        ));
        assert!(!is_quota_error(StatusCode::INTERNAL_SERVER_ERROR, "{}"));
    }

    #[test]
    fn test_first_text_skips_empty_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"  "},{"text":"Climb to 150m"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(first_text(response), Some("Climb to 150m".to_owned()));
    }

    #[test]
    fn test_first_text_blocked_response() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(first_text(response), None);
    }

    #[test]
    fn test_url() {
        let config = AdvisorConfig {
            endpoint: "http://localhost:9000/v1beta/".into(),
            ..Default::default()
        };
        let client = GeminiClient::new("k".into(), &config).unwrap();
        assert_eq!(
            client.url,
            "http://localhost:9000/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
