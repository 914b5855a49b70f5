use thiserror::Error;

/// Weibo SDK error types
///
/// `Display` renders the reason string, e.g. `"error_code:<code>,<message>"`
/// for API errors.
#[derive(Debug, Error)]
pub enum WeiboError {
    /// Missing or invalid client configuration
    #[error("{0}")]
    Config(String),

    /// Arguments could not be mapped onto an endpoint descriptor
    #[error("{0}")]
    Parameter(String),

    /// The request never produced an HTTP response
    #[error("Failed to send request: {message}url={url},headers={headers}")]
    Transport {
        message: String,
        url: String,
        headers: String,
    },

    /// The API answered with an `error_code` / `error` envelope
    #[error("error_code:{code},{message}")]
    Api { code: String, message: String },

    /// Non-200 response without a parseable error envelope
    #[error("Weibo error response: status code = {0}")]
    Status(u16),

    /// The OAuth2 token endpoint rejected the grant
    #[error("{0}")]
    OAuth(String),

    /// A 200 response whose body is not valid JSON
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The local request quota is exhausted
    #[error("{0}")]
    TooManyRequests(String),

    /// Reading a local file for upload failed
    #[error("Failed to read upload file: {0}")]
    Io(#[from] std::io::Error),
}

impl WeiboError {
    /// The human-readable reason for this error.
    pub fn reason(&self) -> String {
        self.to_string()
    }

    /// Returns `true` for the local quota error raised by rate-limit guards.
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, WeiboError::TooManyRequests(_))
    }

    /// Returns the remote error code when the API returned an error envelope.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            WeiboError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    pub(crate) fn missing_redirect_uri() -> Self {
        WeiboError::Config("21305: Parameter absent: redirect_uri, OAuth2 request".to_string())
    }
}

impl From<reqwest::Error> for WeiboError {
    fn from(e: reqwest::Error) -> Self {
        let url = e.url().map(|u| u.to_string()).unwrap_or_default();
        WeiboError::Transport {
            message: e.to_string(),
            url,
            headers: String::from("{}"),
        }
    }
}

impl From<serde_json::Error> for WeiboError {
    fn from(e: serde_json::Error) -> Self {
        WeiboError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message_format() {
        let err = WeiboError::Api {
            code: "21327".to_string(),
            message: "expired_token".to_string(),
        };
        assert_eq!(err.reason(), "error_code:21327,expired_token");
        assert_eq!(err.api_code(), Some("21327"));
    }

    #[test]
    fn test_status_error_message_format() {
        let err = WeiboError::Status(502);
        assert_eq!(err.to_string(), "Weibo error response: status code = 502");
        assert!(err.api_code().is_none());
    }

    #[test]
    fn test_parameter_error_keeps_reason() {
        let err = WeiboError::Parameter("Too many parameters supplied!".to_string());
        assert_eq!(err.reason(), "Too many parameters supplied!");
        assert!(!err.is_quota_exhausted());
    }

    #[test]
    fn test_quota_error_is_distinct() {
        let err = WeiboError::TooManyRequests("Too many requests in getUser".to_string());
        assert!(err.is_quota_exhausted());
        assert_eq!(err.reason(), "Too many requests in getUser");
    }

    #[test]
    fn test_transport_error_mentions_url() {
        let err = WeiboError::Transport {
            message: "connection refused".to_string(),
            url: "https://api.weibo.com/2/statuses/show.json".to_string(),
            headers: "{}".to_string(),
        };
        let reason = err.reason();
        assert!(reason.starts_with("Failed to send request: connection refused"));
        assert!(reason.contains("url=https://api.weibo.com/2/statuses/show.json"));
    }

    #[test]
    fn test_missing_redirect_uri_is_config_error() {
        let err = WeiboError::missing_redirect_uri();
        assert!(matches!(err, WeiboError::Config(_)));
        assert!(err.reason().contains("redirect_uri"));
    }
}
