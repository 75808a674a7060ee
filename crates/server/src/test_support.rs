use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use deployment::Deployment;
use services::services::config::Config;
use test_support::{MultipartBody, TempRoot};
use tower::ServiceExt;

use crate::DeploymentImpl;

/// A deployment backed by a fresh sqlite file and upload directory. The
/// returned `TempRoot` must outlive the deployment.
pub async fn setup_deployment(configure: impl FnOnce(&mut Config)) -> (TempRoot, DeploymentImpl) {
    let temp = TempRoot::new();
    let mut config = Config::new(&temp.sqlite_url(), temp.path().join("uploads"));
    configure(&mut config);
    let deployment = DeploymentImpl::new(config).await.unwrap();
    (temp, deployment)
}

pub async fn setup_app(configure: impl FnOnce(&mut Config)) -> (TempRoot, DeploymentImpl, Router) {
    let (temp, deployment) = setup_deployment(configure).await;
    let app = crate::http::router(deployment.clone());
    (temp, deployment, app)
}

pub fn multipart_request(method: &str, uri: &str, body: MultipartBody) -> Request<Body> {
    let (content_type, body) = body.finish();
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn send_raw(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, body) = send_raw(app, request).await;
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}
