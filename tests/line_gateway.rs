// tests/line_gateway.rs
//
// LINE Messaging API calls against a local double.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tech_news_bot::config::LineConfig;
use tech_news_bot::gateway::{sign, LineGateway, MessagingGateway};

fn gateway(server: &MockServer) -> LineGateway {
    LineGateway::new(&LineConfig {
        api_base: server.uri(),
        channel_secret: "secret".into(),
        access_token: "token-abc".into(),
        timeout_secs: 2,
        max_retries: 3,
    })
}

#[tokio::test]
async fn reply_posts_text_message_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/reply"))
        .and(header("authorization", "Bearer token-abc"))
        .and(body_json(json!({
            "replyToken": "r-1",
            "messages": [{"type": "text", "text": "hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    gateway(&server).reply("r-1", "hello").await.expect("reply ok");
}

#[tokio::test]
async fn push_retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/push"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/push"))
        .and(body_json(json!({
            "to": "U1",
            "messages": [{"type": "text", "text": "item"}]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    gateway(&server).push("U1", "item").await.expect("push ok after retry");
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/push"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad to"))
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway(&server).push("U1", "item").await.unwrap_err();
    assert!(err.to_string().contains("400"));
}

#[tokio::test]
async fn verify_uses_channel_secret() {
    let server = MockServer::start().await;
    let gw = gateway(&server);
    let body = br#"{"events":[]}"#;
    assert!(gw.verify(&sign("secret", body), body));
    assert!(!gw.verify(&sign("wrong", body), body));
}
