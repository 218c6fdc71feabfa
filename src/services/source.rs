// src/services/source.rs

//! Remote indicator sources.
//!
//! A source issues exactly one request per call and classifies what went
//! wrong; retry policy lives in [`IndicatorClient`](super::IndicatorClient).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{FetchConfig, PeriodWindow};

/// Failure of a single request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Request or body read timed out
    #[error("timeout: {0}")]
    Timeout(String),

    /// Connection could not be established or was reset
    #[error("connection failed: {0}")]
    Connect(String),

    /// Source replied with a non-success status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Body was not JSON
    #[error("invalid JSON body: {0}")]
    Decode(String),

    /// Anything else the transport reports
    #[error("{0}")]
    Other(String),
}

impl SourceError {
    /// Timeouts and connection failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Timeout(_) | SourceError::Connect(_))
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            SourceError::Timeout(error.to_string())
        } else if error.is_connect() || error.is_request() {
            SourceError::Connect(error.to_string())
        } else if let Some(status) = error.status() {
            SourceError::Status(status.as_u16())
        } else if error.is_decode() || error.is_body() {
            SourceError::Decode(error.to_string())
        } else {
            SourceError::Other(error.to_string())
        }
    }
}

/// A remote statistics API that serves one indicator per request.
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetch the raw response body for `code` over `window`.
    async fn request(
        &self,
        code: &str,
        window: PeriodWindow,
    ) -> std::result::Result<Value, SourceError>;
}

/// World Bank v2 indicator API.
pub struct WorldBankSource {
    client: Client,
    base_url: Url,
    per_page: u32,
}

impl WorldBankSource {
    /// Create a source with a configured asynchronous HTTP client.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::config(format!(
                "base URL {} cannot take path segments",
                config.base_url
            )));
        }

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            per_page: config.per_page,
        })
    }

    /// Build `{base}/{code}?date=S:E&format=json&per_page=N`.
    pub fn indicator_url(&self, code: &str, window: PeriodWindow) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(code);
        }
        url.query_pairs_mut()
            .append_pair("date", &window.as_query())
            .append_pair("format", "json")
            .append_pair("per_page", &self.per_page.to_string());
        url
    }
}

#[async_trait]
impl IndicatorSource for WorldBankSource {
    fn name(&self) -> &str {
        "World Bank API"
    }

    async fn request(
        &self,
        code: &str,
        window: PeriodWindow,
    ) -> std::result::Result<Value, SourceError> {
        let url = self.indicator_url(code, window);
        log::debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(SourceError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(SourceError::from_reqwest)?;
        serde_json::from_slice(&body).map_err(|e| SourceError::Decode(e.to_string()))
    }
}

/// Scripted in-memory source for tests.
#[cfg(test)]
pub mod scripted {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use super::*;

    /// Replies to each code from a queue of canned results.
    ///
    /// An exhausted queue answers with `Status(404)`.
    #[derive(Default)]
    pub struct ScriptedSource {
        replies: Mutex<HashMap<String, VecDeque<std::result::Result<Value, SourceError>>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, code: &str, result: std::result::Result<Value, SourceError>) -> Self {
            self.replies
                .lock()
                .unwrap()
                .entry(code.to_string())
                .or_default()
                .push_back(result);
            self
        }

        /// Every code requested so far, in order.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn calls_for(&self, code: &str) -> usize {
            self.calls().iter().filter(|c| c.as_str() == code).count()
        }
    }

    #[async_trait]
    impl IndicatorSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn request(
            &self,
            code: &str,
            _window: PeriodWindow,
        ) -> std::result::Result<Value, SourceError> {
            self.calls.lock().unwrap().push(code.to_string());
            self.replies
                .lock()
                .unwrap()
                .get_mut(code)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Err(SourceError::Status(404)))
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    fn window() -> PeriodWindow {
        PeriodWindow::new(2000, 2025).unwrap()
    }

    fn source_at(base_url: String) -> WorldBankSource {
        let config = FetchConfig {
            base_url,
            timeout_secs: 1,
            ..FetchConfig::default()
        };
        WorldBankSource::new(&config).unwrap()
    }

    /// Serve one connection with a canned raw HTTP response, or hold it
    /// open without replying when `response` is `None`.
    async fn serve_once(response: Option<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            match response {
                Some(response) => {
                    socket.write_all(response.as_bytes()).await.unwrap();
                    let _ = socket.shutdown().await;
                }
                None => tokio::time::sleep(Duration::from_secs(10)).await,
            }
        });
        format!("http://{addr}/v2/indicator")
    }

    #[tokio::test]
    async fn test_not_found_maps_to_status() {
        let base = serve_once(Some(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        ))
        .await;

        let err = source_at(base).request("SP.POP.TOTL", window()).await.unwrap_err();
        assert_eq!(err, SourceError::Status(404));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let base = serve_once(None).await;

        let err = source_at(base).request("SP.POP.TOTL", window()).await.unwrap_err();
        assert!(matches!(err, SourceError::Timeout(_)), "{err:?}");
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_refused_connection_is_transient() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = source_at(format!("http://{addr}/v2/indicator"))
            .request("SP.POP.TOTL", window())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Connect(_)), "{err:?}");
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_html_body_is_a_decode_error() {
        let base = serve_once(Some(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 13\r\nConnection: close\r\n\r\n<html></html>",
        ))
        .await;

        let err = source_at(base).request("SP.POP.TOTL", window()).await.unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)), "{err:?}");
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_json_body_is_returned() {
        let base = serve_once(Some(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 10\r\nConnection: close\r\n\r\n[{}, null]",
        ))
        .await;

        let body = source_at(base).request("SP.POP.TOTL", window()).await.unwrap();
        assert_eq!(body, serde_json::json!([{}, null]));
    }

    #[test]
    fn test_only_timeouts_and_connect_failures_are_transient() {
        assert!(SourceError::Timeout("t".into()).is_transient());
        assert!(SourceError::Connect("c".into()).is_transient());
        assert!(!SourceError::Status(500).is_transient());
        assert!(!SourceError::Decode("d".into()).is_transient());
        assert!(!SourceError::Other("o".into()).is_transient());
    }

    #[test]
    fn test_indicator_url_appends_code_and_query() {
        let source = WorldBankSource::new(&FetchConfig::default()).unwrap();
        let window = PeriodWindow::new(2000, 2025).unwrap();
        let url = source.indicator_url("SP.POP.TOTL", window);
        assert_eq!(
            url.as_str(),
            "https://api.worldbank.org/v2/country/ind/indicator/SP.POP.TOTL?date=2000%3A2025&format=json&per_page=100"
        );
    }

    #[test]
    fn test_indicator_url_handles_trailing_slash() {
        let config = FetchConfig {
            base_url: "https://example.org/v2/indicator/".into(),
            ..FetchConfig::default()
        };
        let source = WorldBankSource::new(&config).unwrap();
        let url = source.indicator_url("NY.GDP.MKTP.CD", PeriodWindow::new(2014, 2025).unwrap());
        assert!(url.as_str().starts_with("https://example.org/v2/indicator/NY.GDP.MKTP.CD?"));
    }

    #[test]
    fn test_rejects_non_hierarchical_base() {
        let config = FetchConfig {
            base_url: "mailto:stats@example.org".into(),
            ..FetchConfig::default()
        };
        assert!(WorldBankSource::new(&config).is_err());
    }
}
