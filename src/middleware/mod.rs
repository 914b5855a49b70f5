//! Middleware components for the Weibo SDK.
//!
//! Middleware wraps the [`WeiboClient`](crate::client::WeiboClient) transport
//! as a Tower [`Layer`] and is installed with
//! [`WeiboBuilder::with_middleware`](crate::client::WeiboBuilder::with_middleware).
//! Several layers can be composed with `ServiceBuilder`.
//!
//! ```ignore
//! use weibo_sdk::middleware::LoggingMiddleware;
//!
//! let weibo = Weibo::builder()
//!     .app_key(app_key)
//!     .app_secret(app_secret)
//!     .with_middleware(LoggingMiddleware::new().verbose())
//!     .build()?;
//! ```

// Re-export tower types for convenience
pub use tower::{Layer, Service, ServiceBuilder};

mod logging;

pub use logging::LoggingMiddleware;
