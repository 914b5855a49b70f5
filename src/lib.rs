//! Sina Weibo API SDK for Rust
//!
//! A client for the Weibo v2 REST API: OAuth2 authorization, a declarative
//! endpoint binder with retry, and a facade that adds local request quotas
//! and the paging loops of list operations.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use weibo_sdk::{Weibo, types::{AppKey, AppSecret}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut weibo = Weibo::builder()
//!         .app_key(AppKey::new("1234567789")?)
//!         .app_secret(AppSecret::new("asdfjkalsdfjl")?)
//!         .redirect_uri("http://www.example.com/callback/")
//!         .build()?;
//!
//!     // Send the user here, then exchange the code from the callback
//!     println!("{}", weibo.get_authorize_url(None, "default")?);
//!     let grant = weibo.request_access_token("code_from_callback").await?;
//!     weibo.set_access_token(grant.access_token, grant.expires);
//!
//!     let messages = weibo.get_direct_msgs(None, 200).await?;
//!     println!("{} direct messages", messages.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Endpoint binder, descriptor table and OAuth2
//! - [`client`] - HTTP client and the rate-limited facade
//! - [`clock`] - Injectable time source
//! - [`error`] - Error types
//! - [`middleware`] - Tower middleware for the transport
//! - [`rate_limit`] - Local request quotas
//! - [`store`] - Persisted per-user tokens
//! - [`types`] - Credentials and the JSON result object
//!
//! ## Error Handling
//!
//! Every operation returns [`WeiboError`]. Its `Display` output is the
//! reason text reported by the API client:
//!
//! ```rust,ignore
//! use weibo_sdk::WeiboError;
//!
//! match result {
//!     Ok(user) => { /* handle success */ }
//!     Err(WeiboError::Api { code, message }) => {
//!         eprintln!("API error: {} - {}", code, message);
//!     }
//!     Err(e) if e.is_quota_exhausted() => {
//!         eprintln!("Local quota spent: {}", e);
//!     }
//!     Err(e) => {
//!         eprintln!("Other error: {}", e);
//!     }
//! }
//! ```

pub mod api;
pub mod client;
pub mod clock;
pub mod error;
pub mod middleware;
pub mod rate_limit;
pub mod store;
pub mod types;
pub mod utils;

pub use client::{Weibo, WeiboBuilder, WeiboClient, WeiboClientBuilder};
pub use error::WeiboError;
pub use utils::encode_params;
