use hashnet_social::PostSource;
use hashnet_social::twitter::TwitterApi;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tweet(id: &str, text: &str) -> serde_json::Value {
    json!({
        "id": id,
        "text": text,
        "author_id": "42",
        "created_at": "2025-09-01T12:00:00.000Z",
        "public_metrics": { "retweet_count": 1, "like_count": 2, "reply_count": 0, "quote_count": 0 }
    })
}

#[tokio::test]
async fn follows_next_token_until_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .and(query_param("next_token", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [tweet("3", "third #c")],
            "meta": { "result_count": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .and(header("authorization", "Bearer token"))
        .and(query_param("query", "#rust lang:en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [tweet("1", "first #A #b @Zed"), tweet("2", "second")],
            "meta": { "result_count": 2, "next_token": "page2" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = TwitterApi::with_base_url(&server.uri(), "token".into()).unwrap();
    let tweets = api.search_recent("#rust lang:en", 1000).await.unwrap();
    let ids: Vec<_> = tweets.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn limit_caps_results_and_stops_paging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [tweet("1", "a"), tweet("2", "b"), tweet("3", "c")],
            "meta": { "result_count": 3, "next_token": "more" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = TwitterApi::with_base_url(&server.uri(), "token".into()).unwrap();
    let tweets = api.search_recent("#x", 2).await.unwrap();
    assert_eq!(tweets.len(), 2);
}

#[tokio::test]
async fn search_normalizes_into_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                tweet("1", "Hello #Rust #rust @Ferris"),
                { "id": "2", "text": "no author" }
            ],
            "meta": { "result_count": 2 }
        })))
        .mount(&server)
        .await;

    let api = TwitterApi::with_base_url(&server.uri(), "token".into()).unwrap();
    let posts = api.search("#rust", 100).await.unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].hashtags, vec!["#rust"]);
    assert_eq!(posts[0].mentions, vec!["ferris"]);
    assert_eq!(posts[0].engagement.reposts, 1);
    assert_eq!(posts[0].source_query.as_deref(), Some("#rust"));
}

#[tokio::test]
async fn unauthorized_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "title": "Unauthorized", "status": 401
        })))
        .mount(&server)
        .await;

    let api = TwitterApi::with_base_url(&server.uri(), "bad".into()).unwrap();
    let err = api.search_recent("#x", 10).await.unwrap_err();
    assert!(format!("{err:#}").contains("Unauthorized"));
}
