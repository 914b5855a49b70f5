//! Weibo API modules
//!
//! - [`binder`] - Endpoint descriptors and the generic request executor
//! - [`endpoints`] - Descriptor table of the Weibo v2 REST operations
//! - [`oauth`] - OAuth2 authorization URL and token grants

pub mod binder;
pub mod endpoints;
pub mod oauth;

pub use binder::{
    bind, ApiRequest, CallArgs, EndpointDescriptor, HttpMethod, PaginationMode, PayloadType,
    PostData,
};
pub use oauth::{AccessTokenGrant, GrantType, OAuthApi};
