//! Generic API method binder
//!
//! Every REST operation is described by a static [`EndpointDescriptor`].
//! [`bind`] turns a descriptor plus the caller's [`CallArgs`] into an
//! [`ApiRequest`] and executes it:
//!
//! 1. positional arguments are mapped onto `allowed_param`, named arguments
//!    merged in (`None` values dropped);
//! 2. `{name}` placeholders in the path are substituted, `{user}` resolving
//!    to the session user when one is configured;
//! 3. the remaining parameters become the query string (GET) or the
//!    form-encoded body, and the `Authorization: OAuth2 <token>` header is
//!    attached whenever a parameter is present;
//! 4. the request is sent up to `retry_count + 1` times with a fixed
//!    `retry_delay` between attempts;
//! 5. a non-200 final status becomes a [`WeiboError`], a 200 body is parsed
//!    into a [`JsonObject`].

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, log_enabled, Level};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::client::WeiboClient;
use crate::error::WeiboError;
use crate::types::JsonObject;
use crate::utils::{encode_params, encode_path_value, truncate_chars};

const LOG_TARGET: &str = "weibo_sdk::binder";
const LOGGED_POST_CHARS: usize = 500;
const SESSION_USER_VARIABLE: &str = "user";

/// HTTP verb of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }
}

/// Shape hint for an endpoint's response.
///
/// For list endpoints the hint names the key under which Weibo nests the
/// items when the body is an object rather than a bare array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadType {
    Json,
    Status,
    Repost,
    User,
    Comment,
    DirectMessage,
    Ids,
    Tag,
}

impl PayloadType {
    pub fn list_key(&self) -> Option<&'static str> {
        match self {
            PayloadType::Status => Some("statuses"),
            PayloadType::Repost => Some("reposts"),
            PayloadType::User => Some("users"),
            PayloadType::Comment => Some("comments"),
            PayloadType::DirectMessage => Some("direct_messages"),
            PayloadType::Ids => Some("ids"),
            PayloadType::Json | PayloadType::Tag => None,
        }
    }
}

/// How a list endpoint advances between pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationMode {
    Cursor,
    Page,
}

/// Declarative description of one REST operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDescriptor {
    /// Operation name, used in logs
    pub name: &'static str,
    /// Path template relative to the API root, with `{name}` placeholders
    pub path: &'static str,
    pub method: HttpMethod,
    /// Parameter names positional arguments are mapped onto, in order
    pub allowed_param: &'static [&'static str],
    pub payload_type: PayloadType,
    pub payload_list: bool,
    /// Overrides of the client's retry policy
    pub retry_count: Option<u32>,
    pub retry_delay: Option<Duration>,
    pub retry_errors: Option<&'static [u16]>,
}

impl EndpointDescriptor {
    /// A GET endpoint with no allowed positional parameters.
    pub const fn new(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            path,
            method: HttpMethod::Get,
            allowed_param: &[],
            payload_type: PayloadType::Json,
            payload_list: false,
            retry_count: None,
            retry_delay: None,
            retry_errors: None,
        }
    }

    pub const fn post(mut self) -> Self {
        self.method = HttpMethod::Post;
        self
    }

    pub const fn allowed(mut self, params: &'static [&'static str]) -> Self {
        self.allowed_param = params;
        self
    }

    pub const fn payload(mut self, payload_type: PayloadType, list: bool) -> Self {
        self.payload_type = payload_type;
        self.payload_list = list;
        self
    }

    pub const fn retry(mut self, count: u32, delay: Duration) -> Self {
        self.retry_count = Some(count);
        self.retry_delay = Some(delay);
        self
    }

    pub const fn retry_on(mut self, statuses: &'static [u16]) -> Self {
        self.retry_errors = Some(statuses);
        self
    }

    /// Pagination style implied by the allowed parameters.
    pub fn pagination_mode(&self) -> Option<PaginationMode> {
        if self.allowed_param.contains(&"cursor") {
            Some(PaginationMode::Cursor)
        } else if self.allowed_param.contains(&"page") {
            Some(PaginationMode::Page)
        } else {
            None
        }
    }

    /// Items of a response from this endpoint.
    pub fn items(&self, result: &JsonObject) -> Vec<JsonObject> {
        result.items(self.payload_type.list_key())
    }
}

/// Raw request body supplied by the caller instead of the encoded
/// parameters.
#[derive(Clone, PartialEq, Eq)]
pub enum PostData {
    /// Sent verbatim; remaining parameters move to the query string
    Raw { content_type: String, body: Vec<u8> },
    /// A multipart form; remaining parameters become text fields
    Multipart {
        field: String,
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

impl PostData {
    fn preview(&self) -> String {
        match self {
            PostData::Raw { body, .. } => String::from_utf8_lossy(body).into_owned(),
            PostData::Multipart {
                field, file_name, ..
            } => format!("multipart {field}={file_name}"),
        }
    }
}

impl fmt::Debug for PostData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostData::Raw { content_type, body } => f
                .debug_struct("Raw")
                .field("content_type", content_type)
                .field("len", &body.len())
                .finish(),
            PostData::Multipart {
                field,
                file_name,
                content_type,
                bytes,
            } => f
                .debug_struct("Multipart")
                .field("field", field)
                .field("file_name", file_name)
                .field("content_type", content_type)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

/// Arguments of one bound call.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    positional: Vec<String>,
    named: Vec<(String, Option<String>)>,
    post_data: Option<PostData>,
    headers: Vec<(String, String)>,
    retry_count: Option<u32>,
    retry_delay: Option<Duration>,
    retry_errors: Option<Vec<u16>>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next positional argument.
    pub fn arg(mut self, value: impl ToString) -> Self {
        self.positional.push(value.to_string());
        self
    }

    /// Named argument. A repeated name replaces the earlier value.
    pub fn param(self, name: impl Into<String>, value: impl ToString) -> Self {
        self.named_value(name.into(), Some(value.to_string()))
    }

    /// Named argument that is dropped when `None`.
    pub fn opt_param<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        self.named_value(name.into(), value.map(|v| v.to_string()))
    }

    /// Named argument given as raw bytes, normalized to UTF-8 text.
    pub fn param_bytes(self, name: impl Into<String>, value: &[u8]) -> Self {
        self.named_value(name.into(), Some(crate::utils::normalize_text(value)))
    }

    pub fn post_data(mut self, data: PostData) -> Self {
        self.post_data = Some(data);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = Some(count);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn retry_errors(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retry_errors = Some(statuses.into_iter().collect());
        self
    }

    fn named_value(mut self, name: String, value: Option<String>) -> Self {
        match self.named.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.named.push((name, value)),
        }
        self
    }
}

/// A request resolved from a descriptor and call arguments.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    descriptor: EndpointDescriptor,
    /// Path with every placeholder substituted
    pub path: String,
    /// Parameters left after path resolution, names unique
    pub parameters: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub post_data: Option<PostData>,
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub retry_errors: Vec<u16>,
}

impl ApiRequest {
    /// Resolve parameters and path. Fails before any network traffic on
    /// argument mismatches.
    pub fn build(
        client: &WeiboClient,
        descriptor: &EndpointDescriptor,
        args: CallArgs,
    ) -> Result<Self, WeiboError> {
        let CallArgs {
            positional,
            named,
            post_data,
            headers,
            retry_count,
            retry_delay,
            retry_errors,
        } = args;

        let parameters = Self::build_parameters(descriptor, positional, named)?;

        let retry_errors = retry_errors
            .or_else(|| descriptor.retry_errors.map(<[u16]>::to_vec))
            .unwrap_or_else(|| client.retry_errors().to_vec());

        let mut request = Self {
            descriptor: *descriptor,
            path: descriptor.path.to_string(),
            parameters,
            headers,
            post_data,
            retry_count: retry_count
                .or(descriptor.retry_count)
                .unwrap_or_else(|| client.retry_count()),
            retry_delay: retry_delay
                .or(descriptor.retry_delay)
                .unwrap_or_else(|| client.retry_delay()),
            retry_errors,
        };
        request.build_path(client.session_user())?;
        Ok(request)
    }

    fn build_parameters(
        descriptor: &EndpointDescriptor,
        positional: Vec<String>,
        named: Vec<(String, Option<String>)>,
    ) -> Result<Vec<(String, String)>, WeiboError> {
        if positional.len() > descriptor.allowed_param.len() {
            return Err(WeiboError::Parameter(
                "Too many parameters supplied!".to_string(),
            ));
        }

        let mut parameters: Vec<(String, String)> = descriptor
            .allowed_param
            .iter()
            .zip(positional)
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        let positional_count = parameters.len();

        for (name, value) in named {
            let Some(value) = value else {
                continue;
            };
            if parameters[..positional_count].iter().any(|(k, _)| *k == name) {
                return Err(WeiboError::Parameter(format!(
                    "Multiple values for parameter {name} supplied!"
                )));
            }
            parameters.push((name, value));
        }

        Ok(parameters)
    }

    fn build_path(&mut self, session_user: Option<&str>) -> Result<(), WeiboError> {
        let template = std::mem::take(&mut self.path);
        let mut path = String::with_capacity(template.len());
        let mut rest = template.as_str();

        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}').map(|i| open + i) else {
                break;
            };
            let name = &rest[open + 1..close];
            if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                path.push_str(&rest[..=close]);
                rest = &rest[close + 1..];
                continue;
            }

            path.push_str(&rest[..open]);
            match session_user.filter(|_| name == SESSION_USER_VARIABLE) {
                Some(user) => path.push_str(user),
                None => {
                    let idx = self
                        .parameters
                        .iter()
                        .position(|(k, _)| k == name)
                        .ok_or_else(|| {
                            WeiboError::Parameter(format!(
                                "No parameter value found for path variable: {name}"
                            ))
                        })?;
                    let (_, value) = self.parameters.remove(idx);
                    path.push_str(&encode_path_value(&value));
                }
            }
            rest = &rest[close + 1..];
        }
        path.push_str(rest);

        self.path = path;
        Ok(())
    }

    pub fn descriptor(&self) -> &EndpointDescriptor {
        &self.descriptor
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Inject the client-wide defaults: the `source` parameter and the
    /// authorization header.
    fn apply_client_defaults(&mut self, client: &WeiboClient) {
        if let Some(source) = client.source() {
            if !self.parameters.iter().any(|(k, _)| k == "source") {
                self.parameters
                    .push(("source".to_string(), source.to_string()));
            }
        }

        if !self.parameters.is_empty() && !self.has_header(AUTHORIZATION.as_str()) {
            if let Some(token) = client.access_token() {
                self.headers.push((
                    AUTHORIZATION.as_str().to_string(),
                    format!("OAuth2 {}", token.as_str()),
                ));
            }
        }
    }

    /// Full request URL, including the query string where the parameters
    /// travel in the URL.
    fn request_url(&self, api_root: &str) -> Result<String, WeiboError> {
        let url = format!("{}{}", api_root, self.path);
        let query_params = match (self.descriptor.method, &self.post_data) {
            (HttpMethod::Get, _) | (_, Some(PostData::Raw { .. })) => true,
            _ => false,
        };
        if query_params && !self.parameters.is_empty() {
            let separator = if url.contains('?') { '&' } else { '?' };
            Ok(format!(
                "{url}{separator}{}",
                encode_params(&self.parameters)?
            ))
        } else {
            Ok(url)
        }
    }

    fn form_body(&self) -> Result<Option<String>, WeiboError> {
        match (self.descriptor.method, &self.post_data) {
            (HttpMethod::Post, None) if !self.parameters.is_empty() => {
                encode_params(&self.parameters).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn http_request(
        &self,
        client: &WeiboClient,
        url: &str,
        form_body: Option<&String>,
    ) -> Result<reqwest::Request, WeiboError> {
        let mut builder = client
            .http()
            .request(self.descriptor.method.to_reqwest(), url);

        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = form_body {
            if !self.has_header(CONTENT_TYPE.as_str()) {
                builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
            }
            builder = builder.body(body.clone());
        }

        match &self.post_data {
            Some(PostData::Raw { content_type, body }) => {
                builder = builder
                    .header(CONTENT_TYPE, content_type.as_str())
                    .body(body.clone());
            }
            Some(PostData::Multipart {
                field,
                file_name,
                content_type,
                bytes,
            }) => {
                let part = Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(content_type)
                    .map_err(|e| {
                        WeiboError::Parameter(format!("Invalid content type {content_type}: {e}"))
                    })?;
                let form = self
                    .parameters
                    .iter()
                    .fold(Form::new(), |form, (k, v)| form.text(k.clone(), v.clone()))
                    .part(field.clone(), part);
                builder = builder.multipart(form);
            }
            None => {}
        }

        builder.build().map_err(|e| self.transport_error(&e, url))
    }

    fn transport_error(&self, error: &dyn fmt::Display, url: &str) -> WeiboError {
        let headers: Vec<String> = self
            .headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
                    format!("{k}: [REDACTED]")
                } else {
                    format!("{k}: {v}")
                }
            })
            .collect();
        WeiboError::Transport {
            message: error.to_string(),
            url: url.to_string(),
            headers: format!("{{{}}}", headers.join(", ")),
        }
    }

    fn should_retry(&self, status: u16) -> bool {
        if self.retry_errors.is_empty() {
            status != 200
        } else {
            self.retry_errors.contains(&status)
        }
    }

    /// Send the request with the bounded retry policy and parse the result.
    pub async fn execute(mut self, client: &WeiboClient) -> Result<JsonObject, WeiboError> {
        self.apply_client_defaults(client);

        let url = self.request_url(client.api_root())?;
        let form_body = self.form_body()?;

        let started = Instant::now();
        let mut retries_performed = 0;
        let response = loop {
            let request = self.http_request(client, &url, form_body.as_ref())?;
            let response = client
                .send_request(request)
                .await
                .map_err(|e| self.transport_error(&e, &url))?;

            let status = response.status().as_u16();
            if !self.should_retry(status) || retries_performed >= self.retry_count {
                break response;
            }

            debug!(
                target: LOG_TARGET,
                "{} returned {}, retry {}/{}",
                self.descriptor.name,
                status,
                retries_performed + 1,
                self.retry_count
            );
            tokio::time::sleep(self.retry_delay).await;
            retries_performed += 1;
        };

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e, &url))?;

        if log_enabled!(target: LOG_TARGET, Level::Debug) {
            let post = form_body
                .clone()
                .or_else(|| self.post_data.as_ref().map(PostData::preview))
                .map(|data| format!(",post:{}", truncate_chars(&data, LOGGED_POST_CHARS)))
                .unwrap_or_default();
            debug!(
                target: LOG_TARGET,
                "URL:{},time:{}{},result:{}",
                url,
                started.elapsed().as_millis(),
                post,
                body
            );
        }

        if status != 200 {
            return Err(parse_error(status, &body));
        }

        JsonObject::parse(&body)
    }
}

/// Error for a non-200 response: the `error_code`/`error` envelope when
/// the body carries one, the bare status otherwise.
fn parse_error(status: u16, body: &str) -> WeiboError {
    let envelope = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        let code = match json.get("error_code")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let message = json.get("error")?.as_str()?.to_string();
        Some((code, message))
    });

    match envelope {
        Some((code, message)) => WeiboError::Api { code, message },
        None => WeiboError::Status(status),
    }
}

/// Resolve `descriptor` with `args` and execute it against `client`.
pub async fn bind(
    client: &WeiboClient,
    descriptor: &EndpointDescriptor,
    args: CallArgs,
) -> Result<JsonObject, WeiboError> {
    ApiRequest::build(client, descriptor, args)?
        .execute(client)
        .await
}
