//! External API client.
//!
//! Performs one GET per request and decodes the `{results, num_results}`
//! envelope. Every failure is reported as a transient fetch error: the
//! harvester logs it and moves on without advancing its cursor.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, instrument};

use crate::consumer::query_builder::RequestSpec;
use crate::errors::PipelineError;
use nyt_indexer_shared::ApiPage;

/// Abstracts the paginated external API.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Perform one request and decode its page.
    ///
    /// # Returns
    ///
    /// * `Ok(ApiPage)` - The decoded response
    /// * `Err(PipelineError::TransientFetch)` - Transport error, non-2xx status or undecodable body
    async fn fetch(&self, request: &RequestSpec) -> Result<ApiPage, PipelineError>;
}

/// `reqwest`-backed implementation of [`SourceClient`].
pub struct HttpSourceClient {
    client: reqwest::Client,
}

impl HttpSourceClient {
    /// Create a client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nyt-indexer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipelineError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SourceClient for HttpSourceClient {
    #[instrument(skip(self, request), fields(url = %request.redacted()))]
    async fn fetch(&self, request: &RequestSpec) -> Result<ApiPage, PipelineError> {
        let response = self.client.get(request.to_url()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "API request failed");
            return Err(PipelineError::transient_fetch(format!(
                "API responded with status {}",
                status
            )));
        }

        let page: ApiPage = response.json().await?;
        debug!(
            results = page.results.len(),
            num_results = ?page.num_results,
            "Fetched API page"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::{QueryBuilder, QueryParams};
    use nyt_indexer_shared::SourceDescriptor;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers a single HTTP request with `status` and `body`, then closes.
    async fn serve_once(status: &'static str, body: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        addr
    }

    fn request(addr: SocketAddr) -> RequestSpec {
        QueryBuilder::new(&format!("http://{}/svc", addr), "test-key")
            .unwrap()
            .build(&SourceDescriptor::news_sections(), &QueryParams::none())
            .unwrap()
    }

    fn client() -> HttpSourceClient {
        HttpSourceClient::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_decodes_page() {
        let addr = serve_once(
            "200 OK",
            r#"{"status":"OK","num_results":2,"results":[{"section":"world"},{"section":"arts"}]}"#,
        )
        .await;

        let page = client().fetch(&request(addr)).await.unwrap();

        assert_eq!(page.results.len(), 2);
        assert_eq!(page.num_results, Some(2));
    }

    #[tokio::test]
    async fn test_fetch_null_results_is_empty_page() {
        let addr = serve_once("200 OK", r#"{"status":"OK","num_results":0,"results":null}"#).await;

        let page = client().fetch(&request(addr)).await.unwrap();

        assert!(page.is_empty());
        assert_eq!(page.num_results, Some(0));
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_transient() {
        let addr = serve_once("500 Internal Server Error", r#"{"fault":"oops"}"#).await;

        let result = client().fetch(&request(addr)).await;

        match result {
            Err(PipelineError::TransientFetch(msg)) => assert!(msg.contains("500")),
            other => panic!("expected a transient fetch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_garbage_body_is_transient() {
        let addr = serve_once("200 OK", "<html>rate limited</html>").await;

        let result = client().fetch(&request(addr)).await;

        assert!(matches!(result, Err(PipelineError::TransientFetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_transient() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client().fetch(&request(addr)).await;

        assert!(matches!(result, Err(PipelineError::TransientFetch(_))));
    }
}
