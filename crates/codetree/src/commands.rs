//! Command line arguments and execution

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use codetree_adapter::{build_adapter, HostKind, PageLocation, ReloadOutcome, SidebarSession, StaticPage};
use codetree_client::{OctocrabTransport, ReqwestTransport, TokenResolver, Transport};
use codetree_config::{AppConfig, Locale};
use std::path::PathBuf;
use std::sync::Arc;

use crate::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tree-view node JSON
    Json,
    /// Indented listing
    Plain,
}

/// Print the file tree of a repository page on GitHub, Gitee or Bitbucket
#[derive(Debug, Parser)]
#[command(name = "codetree", version, about)]
pub struct Cli {
    /// URL of a repository page
    pub url: String,

    /// Access token (overrides the config file and environment)
    #[arg(long)]
    pub token: Option<String>,

    /// Branch to show, as if read from the page's branch selector
    #[arg(long)]
    pub branch: Option<String>,

    /// Only load the top level, folders are left expandable
    #[arg(long)]
    pub lazy: bool,

    /// Language of error messages (zh, en)
    #[arg(long)]
    pub locale: Option<Locale>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Also show the tree on issue, pull request and other non-code pages
    #[arg(long)]
    pub include_non_code: bool,

    /// Host type for hosts not recognized by name (github, gitee, bitbucket)
    #[arg(long)]
    pub host_kind: Option<HostKind>,

    /// Config file to use instead of the default lookup
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Config file merged with command line overrides
    pub fn app_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load_from_path(path)?,
            None => AppConfig::load(),
        };

        if let Some(locale) = self.locale {
            config.locale = locale;
        }
        if self.lazy {
            config.load_entire_tree = false;
        }
        if self.include_non_code {
            config.show_in_non_code_page = true;
        }
        Ok(config)
    }

    pub async fn execute(self) -> Result<()> {
        let config = self.app_config()?;
        let location = PageLocation::parse(&self.url)?;

        let kind = self
            .host_kind
            .or_else(|| HostKind::detect(&location.host))
            .with_context(|| {
                format!(
                    "Unsupported host '{}', pass --host-kind to choose an adapter",
                    location.host
                )
            })?;
        log::info!("Using {} adapter for {}", kind, location.host);

        let transport: Arc<dyn Transport> = match kind {
            HostKind::GitHub => Arc::new(OctocrabTransport::anonymous()?),
            HostKind::Gitee | HostKind::Bitbucket => Arc::new(ReqwestTransport::new()?),
        };
        let adapter = build_adapter(kind, &location, transport);

        let configured = self
            .token
            .clone()
            .or_else(|| config.token().map(str::to_string));
        let token = TokenResolver::new(configured)
            .get_token(&location.host)
            .await;

        let mut page = StaticPage::new(location);
        if let Some(branch) = &self.branch {
            if let Some(source) = adapter.selectors().branch.first() {
                page = source.seed(page, branch);
            }
        }

        let session = SidebarSession::new(adapter, config, token);
        match session.reload(&page).await {
            Ok(ReloadOutcome::Loaded { repo, nodes }) => {
                log::info!("Loaded {} top-level entries of {}", nodes.len(), repo.slug());
                output::print_tree(&repo, &nodes, self.format)
            }
            Ok(ReloadOutcome::NotCodePage) => {
                bail!("{} is not a repository code page", self.url)
            }
            Ok(ReloadOutcome::Stale) => bail!("Tree load was superseded"),
            Err(message) => {
                output::print_error(&message, self.format)?;
                bail!("{}", message.error)
            }
        }
    }
}
