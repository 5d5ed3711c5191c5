mod common;

use axum::http::{Method, StatusCode};
use common::{get, json_body, json_request, TestApp};
use ielts_practice::config::EvaluatorConfig;
use serde_json::json;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const ENDPOINT_PATH: &str = "/api/v1/chat/completions";

fn app_for(server: &MockServer, api_key: Option<&str>) -> TestApp {
    TestApp::with_evaluator(EvaluatorConfig {
        api_key: api_key.map(str::to_string),
        endpoint: format!("{}{ENDPOINT_PATH}", server.uri()),
        model: "test-model".into(),
        timeout_secs: 5,
    })
}

async fn evaluate(app: &TestApp, body: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .send(json_request(Method::POST, "/api/evaluate/", body, None))
        .await;
    let status = resp.status();
    (status, json_body(resp).await)
}

#[tokio::test]
async fn non_post_methods_get_405() {
    let app = TestApp::new();

    let resp = app.send(get("/api/evaluate/", None)).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(resp).await["error"], "POST only");

    for m in [Method::PUT, Method::DELETE, Method::PATCH] {
        let resp = app
            .send(json_request(m, "/api/evaluate/", r#"{"essay": "text"}"#, None))
            .await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

#[tokio::test]
async fn unparseable_body_is_400() {
    let app = TestApp::new();
    for body in ["", "not json", r#"{"essay": 12}"#, "{\"essay\": \"unterminated"] {
        let (status, json) = evaluate(&app, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(json["error"], "Invalid JSON");
    }
}

#[tokio::test]
async fn blank_essay_is_400_without_upstream_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let app = app_for(&server, Some("test-key"));

    for body in [r#"{"essay": "   \n\t "}"#, r#"{"task_type": "task1"}"#] {
        let (status, json) = evaluate(&app, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Empty essay");
    }
}

#[tokio::test]
async fn missing_key_is_a_server_error() {
    let app = TestApp::new();
    let (status, json) = evaluate(&app, r#"{"essay": "A real essay."}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Missing SCORING_API_KEY env var");
}

#[tokio::test]
async fn successful_completion_is_relayed_as_feedback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "- TA: 7\n- Overall: 7" } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server, Some("test-key"));

    let (status, json) = evaluate(
        &app,
        r#"{"essay": "Cities offer more jobs.", "task_type": "task2", "topic": "Urban life"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "feedback": "- TA: 7\n- Overall: 7" }));
}

#[tokio::test]
async fn upstream_failure_is_502_with_its_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model overloaded"))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server, Some("test-key"));

    let (status, json) = evaluate(&app, r#"{"essay": "Some essay."}"#).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "Upstream error: model overloaded");
}

#[tokio::test]
async fn unexpected_shape_is_500() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "?" })))
        .mount(&server)
        .await;
    let app = app_for(&server, Some("test-key"));

    let (status, json) = evaluate(&app, r#"{"essay": "Some essay."}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("unexpected upstream response"));
}
