//! Authenticated GET against a host's REST API

use serde::de::DeserializeOwned;
use std::sync::Arc;

use codetree_model::encode_component;

use crate::error::ApiError;
use crate::transport::{HttpResponse, Transport};

/// Where a host's REST API lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    /// e.g. `https://api.github.com`
    pub base_url: String,
    /// Path segment before `{owner}/{repo}`, `repos` or `repositories`
    pub repos_segment: String,
}

impl ApiEndpoint {
    pub fn new(base_url: impl Into<String>, repos_segment: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            repos_segment: repos_segment.into(),
        }
    }

    pub fn github() -> Self {
        Self::new("https://api.github.com", "repos")
    }

    /// GitHub Enterprise serves the API under `/api/v3` of the page host
    pub fn github_enterprise(scheme: &str, host: &str) -> Self {
        Self::new(format!("{}://{}/api/v3", scheme, host), "repos")
    }

    /// Gitee (formerly git.oschina.net) follows the page protocol
    pub fn gitee(scheme: &str, host: &str) -> Self {
        Self::new(format!("{}://{}/api/v5", scheme, host), "repos")
    }

    pub fn bitbucket() -> Self {
        Self::new("https://api.bitbucket.org/2.0", "repositories")
    }
}

/// Host API client
///
/// Cheap to clone; the transport is shared.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    endpoint: ApiEndpoint,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, endpoint: ApiEndpoint) -> Self {
        Self {
            transport,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &ApiEndpoint {
        &self.endpoint
    }

    /// `{base}/{segment}/{owner}/{repo}{path}`
    pub fn repo_url(&self, owner: &str, repo: &str, path: Option<&str>) -> String {
        format!(
            "{}/{}/{}/{}{}",
            self.endpoint.base_url,
            self.endpoint.repos_segment,
            owner,
            repo,
            path.unwrap_or("")
        )
    }

    /// GET a repository-relative path and decode the JSON body
    ///
    /// `path` is `None` for the repository metadata itself. Tree listings
    /// reported as truncated fail with [`ApiError::TooLarge`].
    pub async fn get<T: DeserializeOwned>(
        &self,
        owner: &str,
        repo: &str,
        path: Option<&str>,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let url = self.repo_url(owner, repo, path);
        let response = self.fetch(&url, token).await?;

        let value: serde_json::Value = decode(&response)?;
        let is_tree = path.is_some_and(|p| p.starts_with("/git/trees"));
        if is_tree && value.get("truncated").and_then(|t| t.as_bool()) == Some(true) {
            log::warn!("Tree listing for {}/{} was truncated", owner, repo);
            return Err(ApiError::TooLarge);
        }

        serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// GET a repository-relative path and return the raw body
    pub async fn get_text(
        &self,
        owner: &str,
        repo: &str,
        path: Option<&str>,
        token: Option<&str>,
    ) -> Result<String, ApiError> {
        let url = self.repo_url(owner, repo, path);
        Ok(self.fetch(&url, token).await?.body)
    }

    /// GET an absolute URL, e.g. a pagination `next` link
    pub async fn get_url<T: DeserializeOwned>(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let response = self.fetch(url, token).await?;
        decode(&response)
    }

    /// One attempt, then a single retry with the token dropped
    async fn fetch(&self, url: &str, token: Option<&str>) -> Result<HttpResponse, ApiError> {
        let token = token.map(str::trim).filter(|t| !t.is_empty());

        match self.attempt(url, token).await {
            Ok(response) => Ok(response),
            Err(err) => {
                if token.is_some() {
                    log::warn!("Request to {} failed ({}), retrying without token", url, err);
                } else {
                    log::warn!("Request to {} failed ({}), retrying", url, err);
                }
                self.attempt(url, None).await
            }
        }
    }

    async fn attempt(&self, url: &str, token: Option<&str>) -> Result<HttpResponse, ApiError> {
        // Log the bare URL; the token never reaches the logs
        log::debug!("GET {}", url);

        let target = match token {
            Some(token) => with_access_token(url, token),
            None => url.to_string(),
        };
        let response = self.transport.get(&target).await?;

        if response.is_success() {
            Ok(response)
        } else {
            log::debug!("GET {} -> {} {}", url, response.status, response.status_text);
            Err(ApiError::from_response(&response))
        }
    }
}

fn with_access_token(url: &str, token: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}access_token={}", url, separator, encode_component(token))
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canned::CannedTransport;
    use crate::transport::TransportError;
    use crate::types::{RepoInfo, TreeResponse};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const REPO: &str = "https://api.github.com/repos/octocat/hello";

    fn client(transport: &CannedTransport) -> ApiClient {
        ApiClient::new(Arc::new(transport.clone()), ApiEndpoint::github())
    }

    #[test]
    fn test_repo_url() {
        let transport = CannedTransport::new();
        let client = client(&transport);
        assert_eq!(client.repo_url("octocat", "hello", None), REPO);
        assert_eq!(
            client.repo_url("octocat", "hello", Some("/git/trees/main?recursive=1")),
            format!("{}/git/trees/main?recursive=1", REPO)
        );
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(
            ApiEndpoint::gitee("http", "git.oschina.net").base_url,
            "http://git.oschina.net/api/v5"
        );
        assert_eq!(
            ApiEndpoint::github_enterprise("https", "git.corp.example").base_url,
            "https://git.corp.example/api/v3"
        );
        assert_eq!(ApiEndpoint::bitbucket().repos_segment, "repositories");
    }

    #[test]
    fn test_access_token_separator() {
        assert_eq!(with_access_token("https://x/a", "t"), "https://x/a?access_token=t");
        assert_eq!(
            with_access_token("https://x/a?recursive=1", "t"),
            "https://x/a?recursive=1&access_token=t"
        );
    }

    #[test]
    fn test_access_token_is_encoded() {
        assert_eq!(
            with_access_token("https://x/a", "a&b#c+d=e"),
            "https://x/a?access_token=a%26b%23c%2Bd%3De"
        );
    }

    #[tokio::test]
    async fn test_get_decodes_json() {
        let transport = CannedTransport::new();
        transport.respond_json(REPO, &json!({"default_branch": "develop"}));

        let info: RepoInfo = client(&transport)
            .get("octocat", "hello", None, None)
            .await
            .unwrap();
        assert_eq!(info.default_branch.as_deref(), Some("develop"));
        assert_eq!(transport.requests(), vec![REPO.to_string()]);
    }

    #[tokio::test]
    async fn test_truncated_tree_is_too_large() {
        let transport = CannedTransport::new();
        transport.respond_json(
            &format!("{}/git/trees", REPO),
            &json!({"tree": [{"path": "a", "type": "blob", "sha": "1"}], "truncated": true}),
        );

        let result: Result<TreeResponse, _> = client(&transport)
            .get("octocat", "hello", Some("/git/trees/main?recursive=1"), None)
            .await;
        assert_eq!(result.unwrap_err(), ApiError::TooLarge);
    }

    #[tokio::test]
    async fn test_retry_strips_token_once() {
        let transport = CannedTransport::new();
        transport.respond(
            &format!("{}?access_token=", REPO),
            HttpResponse::with_status(401, "Unauthorized", "{}"),
        );
        transport.respond_json(REPO, &json!({"default_branch": "main"}));

        let info: RepoInfo = client(&transport)
            .get("octocat", "hello", None, Some("bad"))
            .await
            .unwrap();
        assert_eq!(info.default_branch.as_deref(), Some("main"));
        assert_eq!(
            transport.requests(),
            vec![format!("{}?access_token=bad", REPO), REPO.to_string()]
        );
    }

    #[tokio::test]
    async fn test_retry_outcome_is_final() {
        let transport = CannedTransport::new();
        transport.respond(REPO, HttpResponse::with_status(404, "Not Found", "{}"));

        let result: Result<RepoInfo, _> = client(&transport)
            .get("octocat", "hello", None, Some("t0k"))
            .await;
        assert_eq!(result.unwrap_err(), ApiError::PrivateRepository);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_blank_token_retries_once_anonymously() {
        let transport = CannedTransport::new();
        transport.respond(REPO, HttpResponse::with_status(409, "Conflict", "{}"));

        let result: Result<RepoInfo, _> = client(&transport)
            .get("octocat", "hello", None, Some("  "))
            .await;
        assert_eq!(result.unwrap_err(), ApiError::EmptyRepository);
        assert_eq!(transport.requests(), vec![REPO.to_string(), REPO.to_string()]);
    }

    #[tokio::test]
    async fn test_anonymous_request_recovers_on_retry() {
        let transport = CannedTransport::new();
        transport.respond(REPO, HttpResponse::with_status(0, "", ""));
        transport.respond_json(REPO, &json!({"default_branch": "main"}));

        let info: RepoInfo = client(&transport)
            .get("octocat", "hello", None, None)
            .await
            .unwrap();
        assert_eq!(info.default_branch.as_deref(), Some("main"));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_is_connection_error() {
        let transport = CannedTransport::new();
        transport.fail(REPO, TransportError::Request("connection refused".into()));

        let result: Result<RepoInfo, _> = client(&transport).get("octocat", "hello", None, None).await;
        assert!(matches!(result.unwrap_err(), ApiError::Connection(_)));
    }

    #[tokio::test]
    async fn test_invalid_body() {
        let transport = CannedTransport::new();
        transport.respond(REPO, HttpResponse::ok("<html>"));

        let result: Result<RepoInfo, _> = client(&transport).get("octocat", "hello", None, None).await;
        assert!(matches!(result.unwrap_err(), ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_get_url_follows_absolute_links() {
        let transport = CannedTransport::new();
        let next = "https://api.bitbucket.org/2.0/repositories/u/r/src/main/?page=2";
        transport.respond_json(next, &json!({"values": []}));

        let client = ApiClient::new(Arc::new(transport.clone()), ApiEndpoint::bitbucket());
        let page: serde_json::Value = client.get_url(next, None).await.unwrap();
        assert_eq!(page, json!({"values": []}));
    }
}
