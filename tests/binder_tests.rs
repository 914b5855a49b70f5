//! HTTP contract tests for the endpoint binder: request encoding, headers,
//! the retry loop and error mapping.

use std::time::Duration;

use weibo_sdk::api::binder::{CallArgs, EndpointDescriptor, PayloadType, PostData};
use weibo_sdk::api::endpoints;
use weibo_sdk::client::WeiboClient;
use weibo_sdk::types::{AccessToken, AppKey, AppSecret};
use weibo_sdk::WeiboError;
use wiremock::matchers::{
    body_string, body_string_contains, header, header_exists, header_regex, method, path,
    query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn create_test_client(api_root: &str) -> WeiboClient {
    let mut client = WeiboClient::builder()
        .app_key(AppKey::new("1234567789").unwrap())
        .app_secret(AppSecret::new("asdfjkalsdfjl").unwrap())
        .api_root(api_root)
        .build()
        .unwrap();
    client.set_access_token(AccessToken::new("2.00tok").unwrap(), 0);
    client
}

fn retrying_client(api_root: &str, retry_count: u32, retry_errors: &[u16]) -> WeiboClient {
    WeiboClient::builder()
        .app_key(AppKey::new("1234567789").unwrap())
        .app_secret(AppSecret::new("asdfjkalsdfjl").unwrap())
        .api_root(api_root)
        .retry_count(retry_count)
        .retry_delay(Duration::ZERO)
        .retry_errors(retry_errors.iter().copied())
        .build()
        .unwrap()
}

fn error_envelope(code: i64, error: &str) -> serde_json::Value {
    serde_json::json!({
        "request": "/2/statuses/show.json",
        "error_code": code,
        "error": error
    })
}

// ============================================================
// 1. Request encoding
// ============================================================

#[tokio::test]
async fn test_get_parameters_in_query_with_oauth2_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/show.json"))
        .and(query_param("uid", "1750070171"))
        .and(header("authorization", "OAuth2 2.00tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 1750070171u64,
            "screen_name": "tester"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let user = client
        .call_api(&endpoints::GET_USER, CallArgs::new().param("uid", 1750070171))
        .await
        .unwrap();

    assert_eq!(user.str("screen_name"), Some("tester"));
    assert_eq!(user.u64("id"), Some(1750070171));
}

#[tokio::test]
async fn test_post_parameters_form_encoded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/statuses/update.json"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("status=hello+weibo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 11488058246u64,
            "text": "hello weibo"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let status = client
        .call_api(&endpoints::UPDATE_STATUS, CallArgs::new().arg("hello weibo"))
        .await
        .unwrap();

    assert_eq!(status.str("text"), Some("hello weibo"));
}

#[tokio::test]
async fn test_path_variable_substituted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/statuses/destroy/3344.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 3344})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let result = client
        .call_api(&endpoints::DESTROY_STATUS, CallArgs::new().arg(3344))
        .await
        .unwrap();

    assert_eq!(result.i64("id"), Some(3344));
}

#[tokio::test]
async fn test_no_parameters_no_authorization_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/remind/unread_count.json"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/remind/unread_count.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": 0})))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let result = client.call_api(&endpoints::UNREAD, CallArgs::new()).await;

    assert_eq!(result.unwrap().i64("status"), Some(0));
}

#[tokio::test]
async fn test_raw_post_data_moves_parameters_to_query() {
    const RAW: EndpointDescriptor = EndpointDescriptor::new("raw", "raw/upload.json")
        .post()
        .allowed(&["status"]);

    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/raw/upload.json"))
        .and(query_param("status", "caption"))
        .and(header("content-type", "application/octet-stream"))
        .and(body_string("rawbytes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let args = CallArgs::new()
        .arg("caption")
        .post_data(PostData::Raw {
            content_type: "application/octet-stream".to_string(),
            body: b"rawbytes".to_vec(),
        });
    let result = client.call_api(&RAW, args).await.unwrap();

    assert_eq!(result.bool("ok"), Some(true));
}

#[tokio::test]
async fn test_multipart_upload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/statuses/upload.json"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .and(body_string_contains("name=\"status\""))
        .and(body_string_contains("with picture"))
        .and(body_string_contains("PNGDATA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 77})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let args = CallArgs::new()
        .param("status", "with picture")
        .post_data(PostData::Multipart {
            field: "pic".to_string(),
            file_name: "pic".to_string(),
            content_type: "image/png".to_string(),
            bytes: b"PNGDATA".to_vec(),
        });
    let result = client.call_api(&endpoints::UPLOAD, args).await.unwrap();

    assert_eq!(result.i64("id"), Some(77));
}

// ============================================================
// 2. Retry loop
// ============================================================

/// retry_count = 2 against a server that always fails: exactly three
/// attempts, then the final status is reported.
#[tokio::test]
async fn test_retry_budget_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account/rate_limit_status.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = retrying_client(&mock_server.uri(), 2, &[]);
    let err = client
        .call_api(&endpoints::RATE_LIMIT_STATUS, CallArgs::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WeiboError::Status(500)));
    assert_eq!(err.reason(), "Weibo error response: status code = 500");
}

#[tokio::test]
async fn test_retry_stops_on_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/emotions.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/emotions.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"phrase": "[smile]"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = retrying_client(&mock_server.uri(), 3, &[]);
    let result = client
        .call_api(&endpoints::EMOTIONS, CallArgs::new())
        .await
        .unwrap();

    assert_eq!(endpoints::EMOTIONS.items(&result).len(), 1);
}

/// A status outside `retry_errors` ends the loop after the first attempt.
#[tokio::test]
async fn test_retry_only_on_listed_statuses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account/rate_limit_status.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = retrying_client(&mock_server.uri(), 4, &[500]);
    let err = client
        .call_api(&endpoints::RATE_LIMIT_STATUS, CallArgs::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WeiboError::Status(503)));
}

#[tokio::test]
async fn test_per_call_retry_override() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account/rate_limit_status.json"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = retrying_client(&mock_server.uri(), 0, &[]);
    let args = CallArgs::new()
        .retry_count(1)
        .retry_delay(Duration::from_millis(5));
    let result = client.call_api(&endpoints::RATE_LIMIT_STATUS, args).await;

    assert!(matches!(result, Err(WeiboError::Status(502))));
}

/// Transport failures abort immediately instead of consuming retries.
#[tokio::test]
async fn test_transport_error_not_retried() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let api_root = format!("http://127.0.0.1:{}/", port);

    let mut client = retrying_client(&api_root, 5, &[]);
    client.set_access_token(AccessToken::new("2.00secret").unwrap(), 0);

    let started = std::time::Instant::now();
    let err = client
        .call_api(&endpoints::GET_USER, CallArgs::new().param("uid", 1))
        .await
        .unwrap_err();

    assert!(matches!(err, WeiboError::Transport { .. }));
    let reason = err.reason();
    assert!(reason.starts_with("Failed to send request: "));
    assert!(reason.contains(&format!("url=http://127.0.0.1:{}/users/show.json?uid=1", port)));
    assert!(!reason.contains("2.00secret"));
    assert!(started.elapsed() < Duration::from_secs(5));
}

// ============================================================
// 3. Error mapping
// ============================================================

#[tokio::test]
async fn test_error_envelope_on_non_200() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/statuses/show.json"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(error_envelope(20101, "target weibo does not exist")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let err = client
        .call_api(&endpoints::STATUSES_SHOW, CallArgs::new().arg(1))
        .await
        .unwrap_err();

    assert_eq!(err.api_code(), Some("20101"));
    assert_eq!(err.reason(), "error_code:20101,target weibo does not exist");
}

#[tokio::test]
async fn test_string_error_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/statuses/show.json"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error_code": "21327",
            "error": "expired_token"
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let err = client
        .call_api(&endpoints::STATUSES_SHOW, CallArgs::new().arg(1))
        .await
        .unwrap_err();

    assert_eq!(err.reason(), "error_code:21327,expired_token");
}

#[tokio::test]
async fn test_non_json_error_body_falls_back_to_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/statuses/show.json"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let err = client
        .call_api(&endpoints::STATUSES_SHOW, CallArgs::new().arg(1))
        .await
        .unwrap_err();

    assert!(matches!(err, WeiboError::Status(502)));
}

#[tokio::test]
async fn test_invalid_json_on_200_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/statuses/show.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let err = client
        .call_api(&endpoints::STATUSES_SHOW, CallArgs::new().arg(1))
        .await
        .unwrap_err();

    assert!(matches!(err, WeiboError::Decode(_)));
}

#[tokio::test]
async fn test_parameter_error_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let err = client
        .call_api(
            &endpoints::STATUSES_SHOW,
            CallArgs::new().arg(1).param("id", 2),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, WeiboError::Parameter(_)));
}

#[tokio::test]
async fn test_list_payload_items() {
    const TIMELINE: EndpointDescriptor =
        EndpointDescriptor::new("timeline", "statuses/home_timeline.json")
            .allowed(&["count"])
            .payload(PayloadType::Status, true);

    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/statuses/home_timeline.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "statuses": [{"id": 1}, {"id": 2}],
            "total_number": 2
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let result = client
        .call_api(&TIMELINE, CallArgs::new().arg(2))
        .await
        .unwrap();
    let ids: Vec<_> = TIMELINE
        .items(&result)
        .iter()
        .filter_map(|s| s.i64("id"))
        .collect();

    assert_eq!(ids, vec![1, 2]);
    assert_eq!(result.keys(), vec!["statuses", "total_number"]);
}
