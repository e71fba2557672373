//! Octocrab-based transport for GitHub and GitHub Enterprise
//!
//! Uses octocrab's raw GET so the status and headers stay visible to the
//! error classifier instead of being folded into octocrab's own errors.

use async_trait::async_trait;
use log::debug;
use octocrab::service::middleware::retry::RetryConfig;
use octocrab::Octocrab;
use std::sync::Arc;

use crate::transport::{HttpResponse, Transport, TransportError};

/// GitHub transport backed by an octocrab instance
#[derive(Debug, Clone)]
pub struct OctocrabTransport {
    octocrab: Arc<Octocrab>,
}

impl OctocrabTransport {
    /// Wrap an existing octocrab instance
    pub fn new(octocrab: Arc<Octocrab>) -> Self {
        Self { octocrab }
    }

    /// An unauthenticated instance; credentials travel in the URL query
    ///
    /// octocrab's own retry layer is switched off: every failed request is
    /// retried once by [`ApiClient`](crate::ApiClient) and nowhere else.
    pub fn anonymous() -> Result<Self, TransportError> {
        let octocrab = Octocrab::builder()
            .add_retry_config(RetryConfig::None)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        Ok(Self::new(Arc::new(octocrab)))
    }

    /// Get a reference to the underlying octocrab instance
    pub fn octocrab(&self) -> &Octocrab {
        &self.octocrab
    }
}

#[async_trait]
impl Transport for OctocrabTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .octocrab
            ._get(url.to_string())
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = self
            .octocrab
            .body_to_string(response)
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        debug!("GitHub GET returned {} ({} bytes)", status, body.len());
        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ApiClient, ApiEndpoint, ApiError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `502 Bad Gateway` to every request, counting them
    async fn bad_gateway(hits: Arc<AtomicUsize>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let hits = hits.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&chunk[..n]),
                        }
                    }
                    hits.fetch_add(1, Ordering::SeqCst);
                    let _ = socket
                        .write_all(
                            b"HTTP/1.1 502 Bad Gateway\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                        )
                        .await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_server_errors_are_not_retried_by_octocrab() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = bad_gateway(hits.clone()).await;
        let transport = OctocrabTransport::anonymous().unwrap();
        let client = ApiClient::new(Arc::new(transport), ApiEndpoint::github());

        let result: Result<serde_json::Value, _> = client
            .get_url(&format!("{}/repos/octocat/hello", base), Some("tok"))
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ApiError::Unclassified { status: 502, .. }
        ));
        // First attempt with the token, one retry without it
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
