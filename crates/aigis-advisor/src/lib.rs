use std::time::Duration;

use aigis_core::VehicleMode;
use anyhow::Context;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::json;

mod gemini;

pub use gemini::GeminiClient;

/// Returned when no API key is configured.
pub const LOCAL_HEURISTICS: &str = "LOCAL HEURISTICS: SYSTEMS NOMINAL. MAINTAIN CURRENT MISSION PROFILE.";
/// Returned when the provider rejects the call for quota or rate limiting.
pub const QUOTA_FALLBACK: &str = "AI QUOTA EXCEEDED. REVERTING TO LOCAL HEURISTICS.";
/// Returned on any other failure.
pub const ERROR_FALLBACK: &str = "AI LINK DEGRADED. REVERTING TO LOCAL HEURISTICS.";
/// Prefix of every generated advisory.
pub const ADVISORY_PREFIX: &str = "GEMINI: ";

/// The part of the vehicle status an advisory is based on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub mode: VehicleMode,
    pub battery: f64,
    pub altitude: f64,
}

impl StatusSummary {
    pub fn prompt(&self) -> String {
        format!(
            "You are the tactical AI of a search-and-rescue UAV. Current status: state {}, \
             battery {:.0}%, altitude {:.0}m. Reply with a single short tactical advisory \
             of at most 12 words.",
            self.mode, self.battery, self.altitude
        )
    }
}

/// Produces advisory text for a status summary.
///
/// Implementations never fail: every error is turned into a fallback string. The
/// returned future owns everything it needs so it can be spawned.
pub trait Advisor: Send + Sync {
    fn generate(&self, status: StatusSummary) -> BoxFuture<'static, String>;
}

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    /// Text-generation API key. `None` disables the external call.
    pub api_key: Option<String>,
    pub model: String,
    /// Base URL of the generation API
    pub endpoint: String,
    /// Upper bound on a single request
    pub timeout: Duration,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_owned(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_owned(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
enum AdvisorError {
    /// The provider signalled quota exhaustion or rate limiting
    Quota,
    Other(anyhow::Error),
}

impl From<anyhow::Error> for AdvisorError {
    fn from(err: anyhow::Error) -> Self {
        AdvisorError::Other(err)
    }
}

/// Advisor backed by the Gemini API, falling back to fixed strings.
pub struct InsightAdvisor {
    client: Option<GeminiClient>,
}

impl InsightAdvisor {
    pub fn new(config: AdvisorConfig) -> anyhow::Result<Self> {
        let api_key = config.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty());
        let client = match api_key {
            Some(key) => Some(
                GeminiClient::new(key.to_owned(), &config)
                    .context("Failed to build text-generation client")?,
            ),
            None => {
                log::info!("No text-generation API key configured, using local heuristics");
                None
            }
        };
        Ok(Self { client })
    }

    /// An advisor that never calls out.
    pub fn local() -> Self {
        Self { client: None }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }
}

impl Advisor for InsightAdvisor {
    fn generate(&self, status: StatusSummary) -> BoxFuture<'static, String> {
        let client = self.client.clone();
        Box::pin(async move {
            let Some(client) = client else {
                return LOCAL_HEURISTICS.to_owned();
            };
            match client.generate(&status.prompt()).await {
                Ok(text) => format!("{}{}", ADVISORY_PREFIX, text.trim().to_uppercase()),
                Err(AdvisorError::Quota) => {
                    log::warn!("Text-generation quota exhausted");
                    QUOTA_FALLBACK.to_owned()
                }
                Err(AdvisorError::Other(err)) => {
                    log::warn!("Text-generation call failed: {:#}", err);
                    ERROR_FALLBACK.to_owned()
                }
            }
        })
    }
}

fn request_body(prompt: &str) -> serde_json::Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }]
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    fn status() -> StatusSummary {
        StatusSummary {
            mode: VehicleMode::Searching,
            battery: 64.4,
            altitude: 119.6,
        }
    }

    /// Serves a single canned HTTP response and returns the base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            // Read headers, then as much body as content-length announces
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let len = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + len {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        });
        format!("http://{}", addr)
    }

    fn advisor(endpoint: String) -> InsightAdvisor {
        InsightAdvisor::new(AdvisorConfig {
            api_key: Some("test-key".into()),
            endpoint,
            timeout: Duration::from_secs(5),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_unconfigured_uses_local_heuristics() {
        let advisor = InsightAdvisor::new(AdvisorConfig::default()).unwrap();
        assert!(!advisor.is_configured());
        assert_eq!(advisor.generate(status()).await, LOCAL_HEURISTICS);

        let blank = InsightAdvisor::new(AdvisorConfig {
            api_key: Some("   ".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(!blank.is_configured());
    }

    #[tokio::test]
    async fn test_success_is_prefixed_and_uppercased() {
        let endpoint = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"text":" Hold position, sweep sector north. "}]}}]}"#,
        )
        .await;
        assert_eq!(
            advisor(endpoint).generate(status()).await,
            "GEMINI: HOLD POSITION, SWEEP SECTOR NORTH."
        );
    }

    #[tokio::test]
    async fn test_rate_limit_uses_quota_fallback() {
        let endpoint = serve_once(
            "429 Too Many Requests",
            r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .await;
        assert_eq!(advisor(endpoint).generate(status()).await, QUOTA_FALLBACK);
    }

    #[tokio::test]
    async fn test_server_error_uses_generic_fallback() {
        let endpoint = serve_once("500 Internal Server Error", "{}").await;
        assert_eq!(advisor(endpoint).generate(status()).await, ERROR_FALLBACK);
    }

    #[tokio::test]
    async fn test_unreachable_uses_generic_fallback() {
        // Bind and drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let advisor = advisor(format!("http://{}", addr));
        assert_eq!(advisor.generate(status()).await, ERROR_FALLBACK);
    }

    #[test]
    fn test_prompt_mentions_status() {
        let prompt = status().prompt();
        assert!(prompt.contains("SEARCHING"));
        assert!(prompt.contains("battery 64%"));
        assert!(prompt.contains("altitude 120m"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body("hi");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
    }
}
