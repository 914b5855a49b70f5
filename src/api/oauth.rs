//! Weibo OAuth2 API
//!
//! Authorization-code and refresh-token grants against
//! `<auth_url>access_token`, plus the authorize URL users are redirected to.
//! Both grants convert the relative `expires_in` into an absolute epoch
//! timestamp using the client's clock.

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::client::WeiboClient;
use crate::error::WeiboError;
use crate::types::{AccessToken, JsonObject};
use crate::utils::encode_params;

const TOKEN_ENDPOINT: &str = "access_token";
const AUTHORIZE_ENDPOINT: &str = "authorize";

/// Grant type of a token exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::RefreshToken => "refresh_token",
        }
    }

    fn credential_field(&self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "code",
            GrantType::RefreshToken => "refresh_token",
        }
    }
}

/// Result of a token exchange
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenGrant {
    pub access_token: AccessToken,
    /// Absolute expiry in epoch seconds
    pub expires: i64,
    /// Authorized user, when the endpoint reports it
    pub uid: Option<String>,
    pub refresh_token: Option<String>,
    pub remind_in: Option<i64>,
}

impl AccessTokenGrant {
    fn from_response(response: &JsonObject, now: i64) -> Result<Self, WeiboError> {
        let access_token = response
            .str("access_token")
            .ok_or_else(|| WeiboError::Decode("token response without access_token".to_string()))
            .and_then(|token| AccessToken::new(token).map_err(WeiboError::Decode))?;
        let expires_in = response
            .i64("expires_in")
            .ok_or_else(|| WeiboError::Decode("token response without expires_in".to_string()))?;

        Ok(Self {
            access_token,
            expires: now.saturating_add(expires_in),
            uid: response
                .str("uid")
                .map(str::to_string)
                .or_else(|| response.i64("uid").map(|uid| uid.to_string())),
            refresh_token: response.str("refresh_token").map(str::to_string),
            remind_in: response.i64("remind_in"),
        })
    }
}

/// Weibo OAuth2 API
pub struct OAuthApi<'a> {
    client: &'a WeiboClient,
}

impl<'a> OAuthApi<'a> {
    pub fn new(client: &'a WeiboClient) -> Self {
        Self { client }
    }

    fn redirect_uri<'b>(&'b self, redirect_uri: Option<&'b str>) -> Result<&'b str, WeiboError> {
        redirect_uri
            .filter(|uri| !uri.is_empty())
            .or_else(|| self.client.redirect_uri())
            .ok_or_else(WeiboError::missing_redirect_uri)
    }

    /// URL the user is sent to for authorization
    ///
    /// # Arguments
    /// * `redirect_uri` - Callback URI, defaults to the configured one
    /// * `display` - Page style (`default`, `mobile`, `wap`, `client`, ...)
    pub fn authorize_url(
        &self,
        redirect_uri: Option<&str>,
        display: &str,
    ) -> Result<String, WeiboError> {
        let redirect_uri = self.redirect_uri(redirect_uri)?;
        let query = encode_params(&[
            ("client_id", self.client.app_key()),
            ("response_type", "code"),
            ("display", display),
            ("redirect_uri", redirect_uri),
        ])?;
        Ok(format!(
            "{}{}?{}",
            self.client.auth_url(),
            AUTHORIZE_ENDPOINT,
            query
        ))
    }

    /// Exchange an authorization code for an access token
    pub async fn request_access_token(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> Result<AccessTokenGrant, WeiboError> {
        self.exchange(GrantType::AuthorizationCode, code, redirect_uri)
            .await
    }

    /// Exchange a refresh token for a new access token
    pub async fn request_refresh_token(
        &self,
        refresh_token: &str,
        redirect_uri: Option<&str>,
    ) -> Result<AccessTokenGrant, WeiboError> {
        self.exchange(GrantType::RefreshToken, refresh_token, redirect_uri)
            .await
    }

    async fn exchange(
        &self,
        grant_type: GrantType,
        credential: &str,
        redirect_uri: Option<&str>,
    ) -> Result<AccessTokenGrant, WeiboError> {
        let redirect_uri = self.redirect_uri(redirect_uri)?;

        let url = format!("{}{}", self.client.auth_url(), TOKEN_ENDPOINT);
        let body = encode_params(&[
            ("client_id", self.client.app_key()),
            ("client_secret", self.client.app_secret()),
            ("redirect_uri", redirect_uri),
            (grant_type.credential_field(), credential),
            ("grant_type", grant_type.as_str()),
        ])?;

        let request = self
            .client
            .http()
            .post(&url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .build()?;

        let response = self.client.send_request(request).await?;
        let status = response.status();
        let text = response.text().await?;

        let json = match JsonObject::parse(&text) {
            Ok(json) => json,
            Err(_) if !status.is_success() => return Err(WeiboError::Status(status.as_u16())),
            Err(e) => return Err(e),
        };

        if json.contains("error_code") {
            let message = json.str("error").unwrap_or_default().to_string();
            log::warn!(
                "[Weibo] {} grant rejected: {}",
                grant_type.as_str(),
                message
            );
            return Err(WeiboError::OAuth(message));
        }
        if !status.is_success() {
            return Err(WeiboError::Status(status.as_u16()));
        }

        AccessTokenGrant::from_response(&json, self.client.now())
    }
}
