use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use super::{corpus, sample_corpus, service, BrokenQueryEmbedder};
use crate::semantic::{SearchSettings, SimilarityService};
use crate::web::{router, StatusResponse};

const BOUNDARY: &str = "crimematch-test-boundary";
const MAX_UPLOAD: usize = 1024 * 1024;

fn app(service: SimilarityService) -> Router {
    router(Arc::new(service), MAX_UPLOAD)
}

fn multipart_body(field: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"report.txt\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/plain\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(field: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, content)))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_returns_similar_cases() {
    let app = app(service(corpus(&[("Theft", "Delhi", "2020", "2")])));

    let (status, body) = send(app, upload_request("file", b"Theft delhi 2020")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_found"], 1);
    let case = &body["similar_cases"][0];
    assert_eq!(case["Crime"], "Theft");
    assert_eq!(case["Year"], "2020");
    assert_eq!(case["Place"], "Delhi");
    assert_eq!(case["Accused Count"], "2");
    assert_eq!(case["Similarity Score"], 0.82);
    assert_eq!(
        case["Similarities Found"],
        "Crime type matches (Theft), Location pattern matches (Delhi), Same year of occurrence (2020)"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_without_matches() {
    let app = app(service(sample_corpus()));

    let (status, body) = send(app, upload_request("file", b"sunny weather all week")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_found"], 0);
    assert_eq!(body["similar_cases"], Value::Array(vec![]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_file_is_bad_request() {
    let app = app(service(sample_corpus()));

    let (status, body) = send(app, upload_request("file", b"  \n ")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Uploaded file is empty");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_file_field_is_bad_request() {
    let app = app(service(sample_corpus()));

    let (status, body) = send(app, upload_request("document", b"theft delhi")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_non_multipart_is_bad_request() {
    let app = app(service(sample_corpus()));

    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"text": "theft delhi"}"#))
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_embedding_failure_is_server_error() {
    let service = SimilarityService::build(
        sample_corpus(),
        Box::new(BrokenQueryEmbedder),
        SearchSettings::default(),
    )
    .unwrap();
    let app = app(service);

    let (status, body) = send(app.clone(), upload_request("file", b"theft delhi")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Embedding generation failed: numeric failure");

    // later requests are still served
    let (status, _) = send(app, upload_request("file", b"")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversized_upload_rejected() {
    let app = router(Arc::new(service(sample_corpus())), 64);

    let content = "theft delhi ".repeat(100);
    let (status, body) = send(app, upload_request("file", content.as_bytes())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("File processing error"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status() {
    let app = app(service(sample_corpus()));

    let request = Request::builder()
        .uri("/api/status")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let status: StatusResponse = serde_json::from_value(body).unwrap();
    assert_eq!(
        status,
        StatusResponse {
            records: 5,
            dimensions: 12,
            model: "vocab-stub".to_string(),
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cors_allows_browser_frontend() {
    let app = app(service(sample_corpus()));

    let request = Request::builder()
        .uri("/api/status")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
