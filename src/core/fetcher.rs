/// Metrics endpoint client
///
/// Fetches one sample per call. A non-2xx status is logged but the body is
/// still used if it parses; transport and parse failures become `FetchError`.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::core::config::DashboardConfig;
use crate::core::logger::PollLogger;
use crate::core::sample::{Capture, MetricSample};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not complete
    #[error("request failed: {0}")]
    Transport(#[source] BoxError),

    /// The body is not valid JSON
    #[error("invalid JSON in response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The body is JSON but not an object of metrics
    #[error("expected a JSON object of metrics, got {found}")]
    Shape { found: &'static str },
}

impl FetchError {
    pub fn transport(err: impl Into<BoxError>) -> Self {
        FetchError::Transport(err.into())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport(_))
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self) -> Result<Capture, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
    url: Url,
    logger: Arc<dyn PollLogger>,
}

impl HttpFetcher {
    /// No request timeout is set: a hung request only stalls its own cycle
    pub fn new(config: &DashboardConfig, logger: Arc<dyn PollLogger>) -> Self {
        Self {
            client: Client::new(),
            url: config.metrics_url().clone(),
            logger,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn request(&self) -> Result<Capture, FetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(FetchError::transport)?;

        let status = response.status();
        if !status.is_success() {
            self.logger
                .warn(&format!("Non-200 response from backend: {}", status.as_u16()));
        }

        let body = response.text().await.map_err(FetchError::transport)?;
        let sample = MetricSample::from_json(&body)?;

        Ok(Capture::new(sample, status.as_u16()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self) -> Result<Capture, FetchError> {
        self.logger
            .info(&format!("Fetching metrics from API: {}", self.url));

        match self.request().await {
            Ok(capture) => {
                self.logger
                    .info(&format!("Metrics received: {}", capture.sample.to_json()));
                Ok(capture)
            }
            Err(e) => {
                self.logger.error(&format!("Error fetching metrics: {}", e));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logger::testing::{Level, RecordingLogger};
    use crate::utils::CPU_USAGE;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response on a loopback port
    async fn serve_once(status_line: &'static str, body: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        addr
    }

    fn fetcher_for(addr: SocketAddr, logger: Arc<RecordingLogger>) -> HttpFetcher {
        let config = DashboardConfig::new(&format!("http://{}", addr)).unwrap();
        HttpFetcher::new(&config, logger)
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let addr = serve_once("200 OK", r#"{"cpu_usage":42,"latency_ms":12}"#).await;
        let logger = Arc::new(RecordingLogger::default());
        let fetcher = fetcher_for(addr, logger.clone());

        let capture = fetcher.fetch().await.unwrap();

        assert_eq!(capture.status, 200);
        assert!(capture.warning().is_none());
        assert_eq!(capture.sample.get(CPU_USAGE), Some(42.0));
        assert!(logger.contains(Level::Info, "Fetching metrics from API: http://"));
        assert!(logger.contains(Level::Info, "Metrics received:"));
        assert_eq!(logger.count(Level::Warn), 0);
        assert_eq!(logger.count(Level::Error), 0);
    }

    #[tokio::test]
    async fn test_non_success_status_with_json_body_is_kept() {
        let addr = serve_once("503 Service Unavailable", r#"{"cpu_usage":7}"#).await;
        let logger = Arc::new(RecordingLogger::default());
        let fetcher = fetcher_for(addr, logger.clone());

        let capture = fetcher.fetch().await.unwrap();

        assert_eq!(capture.status, 503);
        assert_eq!(capture.warning().map(|w| w.status), Some(503));
        assert_eq!(capture.sample.get(CPU_USAGE), Some(7.0));
        assert!(logger.contains(Level::Warn, "Non-200 response from backend: 503"));
        assert_eq!(logger.count(Level::Error), 0);
    }

    #[tokio::test]
    async fn test_non_json_body_is_parse_error() {
        let addr = serve_once("502 Bad Gateway", "<html>bad gateway</html>").await;
        let logger = Arc::new(RecordingLogger::default());
        let fetcher = fetcher_for(addr, logger.clone());

        let err = fetcher.fetch().await.unwrap_err();

        assert!(matches!(err, FetchError::Parse(_)));
        assert!(logger.contains(Level::Warn, "502"));
        assert!(logger.contains(Level::Error, "Error fetching metrics"));
        assert!(!logger.contains(Level::Info, "Metrics received"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Grab a free port, then close it so nothing is listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let logger = Arc::new(RecordingLogger::default());
        let fetcher = fetcher_for(addr, logger.clone());

        let err = fetcher.fetch().await.unwrap_err();

        assert!(err.is_transport());
        assert_eq!(logger.count(Level::Error), 1);
    }

    #[test]
    fn test_fetcher_uses_configured_url() {
        let config = DashboardConfig::new("http://proxy.local/dash").unwrap();
        let fetcher = HttpFetcher::new(&config, Arc::new(RecordingLogger::default()));
        assert_eq!(fetcher.url().as_str(), "http://proxy.local/dash/metrics");
    }
}
