//! # kbtree-sdk
//!
//! Rust client for the KBase phylogenetic tree and multiple sequence
//! alignment service.
//!
//! ## Features
//!
//! - **TreeClient**: typed wrappers for every `Tree.*` remote method
//! - **RpcGateway**: the JSON-RPC 1.1 call/response/error contract all methods share
//! - **Transport**: pluggable HTTP layer, with a mock for tests
//! - **IdentityProvider**: username/password exchange for an auth token
//!
//! Tree manipulation, alignment and abundance computation all run on the
//! server; this crate only marshals calls.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kbtree_sdk::{TreeClient, AuthToken};
//! use kbtree_sdk::types::{NewickLabel, TreeOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TreeClient::with_token(
//!         "https://kbase.us/services/trees",
//!         AuthToken::new("my-token"),
//!     )?;
//!     client.set_read_timeout(Some(30_000));
//!
//!     let options = TreeOptions::new().label(NewickLabel::BestGenomeId);
//!     let newick = client.get_tree_with("kb|tree.1", &options).await?;
//!     println!("{}", newick);
//!
//!     let leaves = client.get_leaf_count(&newick).await?;
//!     println!("{} leaves", leaves);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Testing Against a Mock
//!
//! ```rust
//! use kbtree_sdk::TreeClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (client, transport) = TreeClient::new_mock();
//!     transport.set_result("Tree.get_leaf_count", json!(2));
//!
//!     assert_eq!(client.get_leaf_count("(A,B);").await?, 2);
//!     assert_eq!(transport.call_count(), 1);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
mod client;
mod error;
pub mod gateway;
mod transport;
pub mod types;

// Re-export main types
pub use auth::{AuthToken, IdentityProvider};
pub use client::{TreeClient, SERVICE_NAME};
pub use error::SdkError;
pub use gateway::{CallSettings, RpcGateway};
pub use transport::{HttpRequest, HttpResponse, MockTransport};

/// Re-export Transport trait for custom implementations
pub use transport::Transport;

#[cfg(feature = "http")]
pub use auth::HttpIdentityProvider;
#[cfg(feature = "http")]
pub use transport::HttpTransport;
