//! Scripted transport for tests and offline runs
//!
//! Responses are registered per URL prefix; the longest matching prefix
//! wins. Each route replays its responses in order and keeps repeating the
//! last one. Unmatched URLs get a `404 Not Found`.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::transport::{HttpResponse, Transport, TransportError};

type Reply = Result<HttpResponse, TransportError>;

#[derive(Debug, Default)]
struct Route {
    prefix: String,
    replies: VecDeque<Reply>,
}

/// Transport answering from registered responses
#[derive(Debug, Clone, Default)]
pub struct CannedTransport {
    routes: Arc<Mutex<Vec<Route>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for URLs starting with `prefix`
    pub fn respond(&self, prefix: impl Into<String>, response: HttpResponse) -> &Self {
        self.push(prefix.into(), Ok(response));
        self
    }

    /// Queue a JSON `200 OK` response
    pub fn respond_json(&self, prefix: impl Into<String>, body: &serde_json::Value) -> &Self {
        self.respond(prefix, HttpResponse::ok(body.to_string()))
    }

    /// Queue a transport failure
    pub fn fail(&self, prefix: impl Into<String>, error: TransportError) -> &Self {
        self.push(prefix.into(), Err(error));
        self
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests().len()
    }

    fn push(&self, prefix: String, reply: Reply) {
        let Ok(mut routes) = self.routes.lock() else {
            return;
        };
        match routes.iter_mut().find(|route| route.prefix == prefix) {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                prefix,
                replies: VecDeque::from([reply]),
            }),
        }
    }

    fn next_reply(&self, url: &str) -> Reply {
        let not_found = || Ok(HttpResponse::with_status(404, "Not Found", "{}"));
        let Ok(mut routes) = self.routes.lock() else {
            return not_found();
        };
        let route = routes
            .iter_mut()
            .filter(|route| url.starts_with(&route.prefix))
            .max_by_key(|route| route.prefix.len());

        match route {
            Some(route) if route.replies.len() > 1 => {
                route.replies.pop_front().unwrap_or_else(not_found)
            }
            Some(route) => route.replies.front().cloned().unwrap_or_else(not_found),
            None => not_found(),
        }
    }
}

#[async_trait]
impl Transport for CannedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        self.next_reply(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_longest_prefix_wins() {
        let transport = CannedTransport::new();
        transport
            .respond("https://api/repos/o/r", HttpResponse::ok("repo"))
            .respond("https://api/repos/o/r/git/trees", HttpResponse::ok("tree"));

        let tree = transport.get("https://api/repos/o/r/git/trees/main").await.unwrap();
        assert_eq!(tree.body, "tree");
        let repo = transport.get("https://api/repos/o/r").await.unwrap();
        assert_eq!(repo.body, "repo");
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_replies_in_order_then_repeat_last() {
        let transport = CannedTransport::new();
        transport
            .respond("u", HttpResponse::with_status(500, "Internal Server Error", ""))
            .respond("u", HttpResponse::ok("second"));

        assert_eq!(transport.get("u").await.unwrap().status, 500);
        assert_eq!(transport.get("u").await.unwrap().body, "second");
        assert_eq!(transport.get("u").await.unwrap().body, "second");
    }

    #[tokio::test]
    async fn test_unmatched_url_is_not_found() {
        let transport = CannedTransport::new();
        let response = transport.get("https://nowhere").await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(transport.requests(), vec!["https://nowhere".to_string()]);
    }
}
