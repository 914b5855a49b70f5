use std::sync::Arc;
use std::time::Duration;

use reqwest::{Request as ReqwestRequest, Response as ReqwestResponse};
use tower::{Layer, Service};

use crate::clock::Clock;
use crate::error::WeiboError;
use crate::rate_limit::RateLimitConfig;
use crate::store::TokenStore;
use crate::types::{AccessToken, AppKey, AppSecret};

use super::weibo_client::{MiddlewareExecutor, WeiboClient, WeiboClientBuilder};
use super::Weibo;

#[must_use]
#[derive(Default)]
pub struct WeiboBuilder<M = ()> {
    client: WeiboClientBuilder,
    rate_limits: RateLimitConfig,
    middleware: Option<M>,
}

impl<M> std::fmt::Debug for WeiboBuilder<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeiboBuilder")
            .field("client", &self.client)
            .field("rate_limits", &self.rate_limits)
            .field("middleware", &self.middleware.as_ref().map(|_| ".."))
            .finish()
    }
}

impl<M> WeiboBuilder<M> {
    pub fn app_key(mut self, app_key: AppKey) -> Self {
        self.client = self.client.app_key(app_key);
        self
    }

    pub fn app_secret(mut self, app_secret: AppSecret) -> Self {
        self.client = self.client.app_secret(app_secret);
        self
    }

    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.client = self.client.redirect_uri(uri);
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.client = self.client.domain(domain);
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.client = self.client.version(version);
        self
    }

    pub fn api_root(mut self, url: impl Into<String>) -> Self {
        self.client = self.client.api_root(url);
        self
    }

    pub fn auth_url(mut self, url: impl Into<String>) -> Self {
        self.client = self.client.auth_url(url);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.timeout(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.connect_timeout(timeout);
        self
    }

    pub fn retry_count(mut self, count: u32) -> Self {
        self.client = self.client.retry_count(count);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.client = self.client.retry_delay(delay);
        self
    }

    pub fn retry_errors(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.client = self.client.retry_errors(statuses);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.client = self.client.source(source);
        self
    }

    pub fn session_user(mut self, uid: impl Into<String>) -> Self {
        self.client = self.client.session_user(uid);
        self
    }

    pub fn access_token(mut self, token: AccessToken, expires: i64) -> Self {
        self.client = self.client.access_token(token, expires);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.client = self.client.clock(clock);
        self
    }

    /// Local quota limits
    ///
    /// Default: [`RateLimitConfig::default`]
    pub fn rate_limits(mut self, rate_limits: RateLimitConfig) -> Self {
        self.rate_limits = rate_limits;
        self
    }

    pub fn with_middleware<M2>(self, middleware: M2) -> WeiboBuilder<M2>
    where
        M2: Layer<WeiboClient> + Clone + Send + Sync + 'static,
    {
        WeiboBuilder {
            client: self.client,
            rate_limits: self.rate_limits,
            middleware: Some(middleware),
        }
    }

    pub fn build(self) -> Result<Weibo, WeiboError>
    where
        M: Layer<WeiboClient> + Clone + Send + Sync + 'static,
        M::Service: Service<ReqwestRequest, Response = ReqwestResponse, Error = reqwest::Error>
            + Clone
            + Send
            + Sync
            + 'static,
        <M::Service as Service<ReqwestRequest>>::Future: Send + 'static,
    {
        let mut client = self.client.build()?;

        if let Some(middleware) = self.middleware {
            let service = middleware.layer(client.clone());
            let executor = make_middleware_executor(service);
            client = client.with_middleware_executor(executor);
        }

        Ok(Weibo::new(client, self.rate_limits))
    }

    /// Build a client for `uid` from a stored token.
    ///
    /// Returns `Ok(None)` when the store has no usable token for the user.
    pub fn build_from_store(
        self,
        store: &dyn TokenStore,
        uid: &str,
    ) -> Result<Option<Weibo>, WeiboError>
    where
        M: Layer<WeiboClient> + Clone + Send + Sync + 'static,
        M::Service: Service<ReqwestRequest, Response = ReqwestResponse, Error = reqwest::Error>
            + Clone
            + Send
            + Sync
            + 'static,
        <M::Service as Service<ReqwestRequest>>::Future: Send + 'static,
    {
        let Some(stored) = store.load(uid) else {
            return Ok(None);
        };
        let Ok(token) = AccessToken::new(stored.token) else {
            return Ok(None);
        };
        self.session_user(uid)
            .access_token(token, stored.expires)
            .build()
            .map(Some)
    }
}

fn make_middleware_executor<S>(service: S) -> MiddlewareExecutor
where
    S: Service<ReqwestRequest, Response = ReqwestResponse, Error = reqwest::Error>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    let service = Arc::new(service);

    Arc::new(move |request: ReqwestRequest| {
        let mut service = (*service).clone();
        Box::pin(async move { service.call(request).await })
    })
}
