//! Access token resolution per host

use log::debug;

/// Resolves access tokens for different hosts
///
/// Tries multiple sources in order:
/// 1. A token given explicitly (config file or command line)
/// 2. Host-specific env var (e.g., `CODETREE_TOKEN_GITEE_COM`)
/// 3. `gh auth token --hostname {host}` command (GitHub hosts only)
/// 4. Generic host variables: `GITHUB_TOKEN`/`GH_TOKEN` for github.com,
///    `GITEE_TOKEN` for Gitee, `BITBUCKET_TOKEN` for Bitbucket
///
/// A missing token is not an error; public repositories load anonymously.
#[derive(Debug, Clone)]
pub struct TokenResolver {
    configured: Option<String>,
    use_gh_cli: bool,
}

impl Default for TokenResolver {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TokenResolver {
    /// Create a resolver; `configured` wins over every other source
    pub fn new(configured: Option<String>) -> Self {
        let configured = configured
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self {
            configured,
            use_gh_cli: true,
        }
    }

    /// Skip the `gh` CLI lookup
    pub fn without_gh_cli(mut self) -> Self {
        self.use_gh_cli = false;
        self
    }

    /// Env var consulted first for a host, e.g. `CODETREE_TOKEN_GITHUB_COM`
    pub fn env_key(host: &str) -> String {
        format!(
            "CODETREE_TOKEN_{}",
            host.replace(['.', '-'], "_").to_uppercase()
        )
    }

    /// Generic env vars consulted last for well-known hosts
    pub fn fallback_vars(host: &str) -> &'static [&'static str] {
        match host {
            "github.com" => &["GITHUB_TOKEN", "GH_TOKEN"],
            "gitee.com" | "git.oschina.net" => &["GITEE_TOKEN"],
            "bitbucket.org" => &["BITBUCKET_TOKEN"],
            _ => &[],
        }
    }

    fn is_github_host(host: &str) -> bool {
        !matches!(host, "gitee.com" | "git.oschina.net" | "bitbucket.org")
    }

    /// Get a token for the given host, if any source has one
    pub async fn get_token(&self, host: &str) -> Option<String> {
        if let Some(token) = &self.configured {
            debug!("Using configured token for host {}", host);
            return Some(token.clone());
        }

        let env_key = Self::env_key(host);
        if let Some(token) = read_env(&env_key) {
            debug!("Using token from env var {} for host {}", env_key, host);
            return Some(token);
        }

        if self.use_gh_cli && Self::is_github_host(host) {
            if let Some(token) = gh_auth_token(host).await {
                debug!("Using token from gh CLI for host {}", host);
                return Some(token);
            }
        }

        for var in Self::fallback_vars(host) {
            if let Some(token) = read_env(var) {
                debug!("Using token from {} for host {}", var, host);
                return Some(token);
            }
        }

        debug!("No token found for host {}", host);
        None
    }
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

async fn gh_auth_token(host: &str) -> Option<String> {
    debug!("Trying gh auth token for host {}", host);
    let output = match tokio::process::Command::new("gh")
        .args(["auth", "token", "--hostname", host])
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            debug!("Failed to run 'gh auth token': {}", e);
            return None;
        }
    };

    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key() {
        assert_eq!(
            TokenResolver::env_key("git.oschina.net"),
            "CODETREE_TOKEN_GIT_OSCHINA_NET"
        );
        assert_eq!(
            TokenResolver::env_key("ghe-01.example.com"),
            "CODETREE_TOKEN_GHE_01_EXAMPLE_COM"
        );
    }

    #[test]
    fn test_github_hosts() {
        assert!(TokenResolver::is_github_host("github.com"));
        assert!(TokenResolver::is_github_host("ghe.example.com"));
        assert!(!TokenResolver::is_github_host("gitee.com"));
        assert!(!TokenResolver::is_github_host("bitbucket.org"));
    }

    #[tokio::test]
    async fn test_configured_token_wins() {
        let resolver = TokenResolver::new(Some(" mine ".to_string())).without_gh_cli();
        assert_eq!(resolver.get_token("gitee.com").await.as_deref(), Some("mine"));
    }

    #[tokio::test]
    async fn test_host_specific_env_var() {
        let host = "tokens.test-host.invalid";
        std::env::set_var(TokenResolver::env_key(host), "from-env");

        let resolver = TokenResolver::new(Some("  ".to_string())).without_gh_cli();
        assert_eq!(resolver.get_token(host).await.as_deref(), Some("from-env"));

        std::env::remove_var(TokenResolver::env_key(host));
        assert_eq!(resolver.get_token(host).await, None);
    }
}
