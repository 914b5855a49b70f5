//! Weibo HTTP Client
//!
//! Holds the application credentials, the API roots and the default retry
//! policy, and executes bound endpoint descriptors.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use reqwest::Client;
use tower::Service;

use crate::api::binder::{bind, CallArgs, EndpointDescriptor};
use crate::clock::{Clock, SystemClock};
use crate::error::WeiboError;
use crate::types::{AccessToken, AppKey, AppSecret, JsonObject};

pub(crate) const DEFAULT_DOMAIN: &str = "api.weibo.com";
pub(crate) const DEFAULT_VERSION: &str = "2";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("weibo-sdk/", env!("CARGO_PKG_VERSION"));

type MiddlewareFuture =
    Pin<Box<dyn Future<Output = Result<reqwest::Response, reqwest::Error>> + Send>>;
pub(crate) type MiddlewareExecutor =
    Arc<dyn Fn(reqwest::Request) -> MiddlewareFuture + Send + Sync>;

/// Weibo API Client
///
/// Reusable HTTP client for calling Weibo APIs. Endpoint calls go through
/// [`call_api`](Self::call_api), which runs the generic binder for a descriptor.
#[derive(Clone)]
pub struct WeiboClient {
    http: Client,
    app_key: AppKey,
    app_secret: AppSecret,
    redirect_uri: Option<String>,
    api_root: String,
    auth_url: String,
    access_token: Option<AccessToken>,
    expires: i64,
    session_user: Option<String>,
    source: Option<String>,
    retry_count: u32,
    retry_delay: Duration,
    retry_errors: Vec<u16>,
    clock: Arc<dyn Clock>,
    middleware_executor: Option<MiddlewareExecutor>,
}

impl std::fmt::Debug for WeiboClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeiboClient")
            .field("app_key", &self.app_key)
            .field("api_root", &self.api_root)
            .field("auth_url", &self.auth_url)
            .field("access_token", &self.access_token.as_ref().map(|_| ".."))
            .field("expires", &self.expires)
            .field("retry_count", &self.retry_count)
            .field(
                "middleware_executor",
                &self.middleware_executor.as_ref().map(|_| ".."),
            )
            .finish_non_exhaustive()
    }
}

impl WeiboClient {
    /// Create a new client builder
    pub fn builder() -> WeiboClientBuilder {
        WeiboClientBuilder::default()
    }

    /// Get the application key (OAuth2 `client_id`)
    pub fn app_key(&self) -> &str {
        self.app_key.as_str()
    }

    pub(crate) fn app_secret(&self) -> &str {
        self.app_secret.as_str()
    }

    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    /// Versioned REST root, e.g. `https://api.weibo.com/2/`
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// OAuth2 root, e.g. `https://api.weibo.com/oauth2/`
    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    /// Absolute expiry of the access token in epoch seconds
    pub fn expires(&self) -> i64 {
        self.expires
    }

    /// Install the access token and its absolute expiry.
    pub fn set_access_token(&mut self, access_token: AccessToken, expires: i64) {
        self.access_token = Some(access_token);
        self.expires = expires;
    }

    /// Authenticated user substituted for `{user}` path variables
    pub fn session_user(&self) -> Option<&str> {
        self.session_user.as_deref()
    }

    pub fn set_session_user(&mut self, uid: impl Into<String>) {
        self.session_user = Some(uid.into());
    }

    /// Default `source` parameter added to every call
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn retry_errors(&self) -> &[u16] {
        &self.retry_errors
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current wall-clock time in epoch seconds
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Returns the underlying [`reqwest::Client`] for raw HTTP requests.
    ///
    /// Note: requests made through this client bypass the middleware pipeline.
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn with_middleware_executor(mut self, executor: MiddlewareExecutor) -> Self {
        self.middleware_executor = Some(executor);
        self
    }

    pub(crate) async fn send_request(
        &self,
        request: reqwest::Request,
    ) -> Result<reqwest::Response, reqwest::Error> {
        if let Some(executor) = &self.middleware_executor {
            (executor)(request).await
        } else {
            self.http.execute(request).await
        }
    }

    /// Execute an endpoint descriptor with the given arguments.
    ///
    /// # Errors
    /// - `WeiboError::Parameter` when the arguments do not fit the descriptor
    /// - `WeiboError::Transport` when no response was received
    /// - `WeiboError::Api` / `WeiboError::Status` for a non-200 final response
    pub async fn call_api(
        &self,
        descriptor: &EndpointDescriptor,
        args: CallArgs,
    ) -> Result<JsonObject, WeiboError> {
        bind(self, descriptor, args).await
    }
}

impl Service<reqwest::Request> for WeiboClient {
    type Response = reqwest::Response;
    type Error = reqwest::Error;
    type Future = MiddlewareFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: reqwest::Request) -> Self::Future {
        let client = self.http.clone();
        Box::pin(async move { client.execute(req).await })
    }
}

fn ensure_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

fn validate_root(name: &str, url: &str) -> Result<(), WeiboError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(WeiboError::Config(format!(
            "{} must start with http:// or https://, got: {}",
            name, url
        )));
    }
    Ok(())
}

/// Builder for WeiboClient
///
/// # Example
///
/// ```rust
/// use weibo_sdk::client::WeiboClient;
/// use weibo_sdk::types::{AppKey, AppSecret};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = WeiboClient::builder()
///         .app_key(AppKey::new("1234567789")?)
///         .app_secret(AppSecret::new("asdfjkalsdfjl")?)
///         .redirect_uri("http://www.example.com/callback/")
///         .build()?;
///
///     assert_eq!(client.api_root(), "https://api.weibo.com/2/");
///     Ok(())
/// }
/// ```
#[derive(Default)]
pub struct WeiboClientBuilder {
    app_key: Option<AppKey>,
    app_secret: Option<AppSecret>,
    redirect_uri: Option<String>,
    domain: Option<String>,
    version: Option<String>,
    api_root: Option<String>,
    auth_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry_count: u32,
    retry_delay: Duration,
    retry_errors: Vec<u16>,
    source: Option<String>,
    session_user: Option<String>,
    access_token: Option<(AccessToken, i64)>,
    clock: Option<Arc<dyn Clock>>,
}

impl std::fmt::Debug for WeiboClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeiboClientBuilder")
            .field("app_key", &self.app_key)
            .field("redirect_uri", &self.redirect_uri)
            .field("domain", &self.domain)
            .field("api_root", &self.api_root)
            .field("auth_url", &self.auth_url)
            .field("retry_count", &self.retry_count)
            .finish_non_exhaustive()
    }
}

impl WeiboClientBuilder {
    /// Set the application key
    pub fn app_key(mut self, app_key: AppKey) -> Self {
        self.app_key = Some(app_key);
        self
    }

    /// Set the application secret
    pub fn app_secret(mut self, app_secret: AppSecret) -> Self {
        self.app_secret = Some(app_secret);
        self
    }

    /// Set the OAuth2 callback URI
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Set the API domain
    ///
    /// Default: `api.weibo.com`
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the API version segment
    ///
    /// Default: `2`
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Override the REST root derived from domain and version
    pub fn api_root(mut self, url: impl Into<String>) -> Self {
        self.api_root = Some(url.into());
        self
    }

    /// Override the OAuth2 root derived from the domain
    pub fn auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = Some(url.into());
        self
    }

    /// Set the total timeout for requests
    ///
    /// Default: 30 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    ///
    /// Default: 10 seconds
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Default number of retries after the first attempt
    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }

    /// Default fixed delay between attempts
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Statuses that trigger a retry. When empty every non-200 status does.
    pub fn retry_errors(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retry_errors = statuses.into_iter().collect();
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn session_user(mut self, uid: impl Into<String>) -> Self {
        self.session_user = Some(uid.into());
        self
    }

    pub fn access_token(mut self, token: AccessToken, expires: i64) -> Self {
        self.access_token = Some((token, expires));
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the WeiboClient
    ///
    /// # Errors
    /// Returns an error if the app key or secret is not set, or an API root
    /// is not an http(s) URL
    pub fn build(self) -> Result<WeiboClient, WeiboError> {
        let app_key = self
            .app_key
            .ok_or_else(|| WeiboError::Config("app_key is required".to_string()))?;
        let app_secret = self
            .app_secret
            .ok_or_else(|| WeiboError::Config("app_secret is required".to_string()))?;

        let domain = self.domain.unwrap_or_else(|| DEFAULT_DOMAIN.to_string());
        let version = self.version.unwrap_or_else(|| DEFAULT_VERSION.to_string());

        let api_root = ensure_trailing_slash(
            self.api_root
                .unwrap_or_else(|| format!("https://{}/{}/", domain, version)),
        );
        let auth_url = ensure_trailing_slash(
            self.auth_url
                .unwrap_or_else(|| format!("https://{}/oauth2/", domain)),
        );
        validate_root("api_root", &api_root)?;
        validate_root("auth_url", &auth_url)?;

        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let connect_timeout = self
            .connect_timeout
            .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));

        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let (access_token, expires) = match self.access_token {
            Some((token, expires)) => (Some(token), expires),
            None => (None, 0),
        };

        Ok(WeiboClient {
            http,
            app_key,
            app_secret,
            redirect_uri: self.redirect_uri.filter(|uri| !uri.is_empty()),
            api_root,
            auth_url,
            access_token,
            expires,
            session_user: self.session_user,
            source: self.source,
            retry_count: self.retry_count,
            retry_delay: self.retry_delay,
            retry_errors: self.retry_errors,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            middleware_executor: None,
        })
    }
}
