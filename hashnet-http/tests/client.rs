use hashnet_http::{HttpClient, HttpError, RequestOpts};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn sends_bearer_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/items"))
        .and(header("authorization", "Bearer abc"))
        .and(query_param("q", "#rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let got: Value = client
        .get_json(
            "2/items",
            RequestOpts {
                bearer: Some(" abc "),
                query: Some(vec![("q", "#rust".into())]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(got["ok"], true);
}

#[tokio::test]
async fn retries_after_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "n": 1 })))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let got: Value = client
        .get_json("limited", RequestOpts::default())
        .await
        .unwrap();
    assert_eq!(got["n"], 1);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bad"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{ "message": "Invalid 'query'" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<Value>("bad", RequestOpts::default())
        .await
        .unwrap_err();
    match err {
        HttpError::Api {
            status, message, ..
        } => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(message, "Invalid 'query'");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn exhausted_retries_surface_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/always"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .expect(2)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap().with_retries(1);
    let err = client
        .get_json::<Value>("always", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<Value>("html", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Decode(_, snippet) if snippet == "<html>"));
}

#[tokio::test]
async fn per_request_retries_override_client_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<Value>(
            "busy",
            RequestOpts {
                retries: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Api { status, .. } if status.as_u16() == 503));
}

#[tokio::test]
async fn blank_bearer_is_rejected_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<Value>(
            "2/items",
            RequestOpts {
                bearer: Some("  "),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Build(_)));
}
