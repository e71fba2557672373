//! Git host REST API client
//!
//! Thin client over the tree, blob and repository endpoints shared by
//! GitHub, Gitee and (with a different base path) Bitbucket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  ApiClient                      │
//! │  - token as `access_token` query parameter      │
//! │  - one retry on failure, token dropped          │
//! │  - truncated trees → ApiError::TooLarge         │
//! └─────────────────────────────────────────────────┘
//!                        │ Transport trait
//!        ┌───────────────┼────────────────┐
//!        ▼               ▼                ▼
//! ┌──────────────┐ ┌──────────────┐ ┌──────────────┐
//! │ Octocrab     │ │ Reqwest      │ │ Canned       │
//! │ (GitHub)     │ │ (Gitee, BB)  │ │ (tests)      │
//! └──────────────┘ └──────────────┘ └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use codetree_client::{ApiClient, ApiEndpoint, OctocrabTransport, TreeResponse};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(OctocrabTransport::anonymous()?);
//! let client = ApiClient::new(transport, ApiEndpoint::github());
//! let tree: TreeResponse = client
//!     .get("rust-lang", "rust", Some("/git/trees/master?recursive=1"), None)
//!     .await?;
//! println!("{} entries", tree.tree.len());
//! # Ok(())
//! # }
//! ```

pub mod canned;
pub mod client;
pub mod error;
pub mod messages;
pub mod octocrab_transport;
pub mod reqwest_transport;
pub mod submodules;
pub mod token;
pub mod transport;
pub mod types;

pub use canned::CannedTransport;
pub use client::{ApiClient, ApiEndpoint};
pub use error::ApiError;
pub use messages::ErrorMessage;
pub use octocrab_transport::OctocrabTransport;
pub use reqwest_transport::ReqwestTransport;
pub use submodules::{decode_blob, fetch_submodules, find_gitmodules, parse_gitmodules};
pub use token::TokenResolver;
pub use transport::{HttpResponse, Transport, TransportError};
pub use types::{BlobResponse, RepoInfo, TreeResponse};

// Re-export the HTTP stacks so consumers don't need to depend on them directly
pub use octocrab;
pub use reqwest;
