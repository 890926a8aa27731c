//! Python through a remote execution service.
//!
//! The wire contract is deliberately thin: one `POST` with `{"code": ...}`,
//! answered by a JSON object with optional `output` / `error` strings.
//! There is no retry, and no timeout unless one is configured.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::executor::PythonRunner;

/// Shown whenever the service cannot be reached or answers with non-JSON.
pub const UNREACHABLE_MESSAGE: &str = "Error: Could not reach backend server.";

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    code: &'a str,
}

/// Body returned by the execution service.
///
/// Fields that are missing, `null` or not strings are all treated as absent.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ExecuteResponse {
    #[serde(default, deserialize_with = "string_or_absent")]
    pub output: Option<String>,
    #[serde(default, deserialize_with = "string_or_absent")]
    pub error: Option<String>,
}

impl ExecuteResponse {
    /// Parse a response body. Valid JSON of any other shape is an empty
    /// response; invalid JSON is an error.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    /// The text to display: `output`, else `error`, else nothing.
    /// Empty strings count as absent.
    pub fn display_text(&self) -> String {
        [&self.output, &self.error]
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty())
            .cloned()
            .unwrap_or_default()
    }
}

fn string_or_absent<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(text) => Some(text),
        _ => None,
    })
}

/// Holds the loading flag up until dropped, including when the request
/// future is abandoned mid-flight.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Python runner that posts snippets to the execution service.
#[derive(Debug)]
pub struct RemotePython {
    client: Client,
    endpoint: String,
    in_flight: AtomicBool,
}

impl RemotePython {
    /// Create a runner for `endpoint`.
    pub fn new(endpoint: impl Into<String>, request_timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one snippet and parse the reply.
    pub async fn execute(&self, code: &str) -> Result<ExecuteResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(&ExecuteRequest { code })
            .send()
            .await?;

        debug!(status = %response.status(), "execution service replied");
        let body = response.bytes().await?;
        ExecuteResponse::parse(&body)
    }
}

impl PythonRunner for RemotePython {
    async fn run_python(&self, code: &str) -> Option<String> {
        let _in_flight = InFlight::enter(&self.in_flight);
        let text = match self.execute(code).await {
            Ok(response) => response.display_text(),
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "could not reach execution service");
                UNREACHABLE_MESSAGE.to_string()
            }
        };
        Some(text)
    }

    fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    async fn mount(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(body: &str) -> String {
        ExecuteResponse::parse(body.as_bytes()).unwrap().display_text()
    }

    #[test]
    fn test_output_field_is_displayed() {
        assert_eq!(display(r#"{"output": "42"}"#), "42");
    }

    #[test]
    fn test_error_field_is_displayed() {
        assert_eq!(display(r#"{"error": "boom"}"#), "boom");
    }

    #[test]
    fn test_empty_object_displays_nothing() {
        assert_eq!(display("{}"), "");
    }

    #[test]
    fn test_output_wins_unless_empty() {
        assert_eq!(display(r#"{"output": "1\n", "error": "ignored"}"#), "1\n");
        assert_eq!(display(r#"{"output": "", "error": "name 'x' is not defined"}"#), "name 'x' is not defined");
    }

    #[test]
    fn test_other_shapes_degrade_to_empty() {
        assert_eq!(display(r#"{"output": 42}"#), "");
        assert_eq!(display(r#"{"output": null, "error": ["a"]}"#), "");
        assert_eq!(display("[1, 2, 3]"), "");
        assert_eq!(display(r#""just a string""#), "");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(ExecuteResponse::parse(b"<html>502 Bad Gateway</html>").is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(ExecuteRequest { code: "print(1)" }).unwrap();
        assert_eq!(body, serde_json::json!({ "code": "print(1)" }));
    }

    #[test]
    fn test_in_flight_clears_on_drop() {
        let flag = AtomicBool::new(false);
        {
            let _in_flight = InFlight::enter(&flag);
            assert!(flag.load(Ordering::SeqCst));
        }
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let python = RemotePython::new("http://127.0.0.1:9/api/python", None).unwrap();
        assert_eq!(python.run_python("print(1)").await.as_deref(), Some(UNREACHABLE_MESSAGE));
        assert!(!python.is_loading());
    }
}
