use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::get,
};
use deployment::Deployment;
use services::services::upload::MAX_GALLERY_FILES;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{DeploymentImpl, routes};

pub(crate) mod auth;

/// Room for multipart boundaries, part headers and text fields on top of the
/// file bytes themselves.
const FORM_OVERHEAD_BYTES: u64 = 64 * 1024;

pub fn router(deployment: DeploymentImpl) -> Router {
    let config = deployment.config().clone();

    let admin_routes = Router::new()
        .merge(routes::gallery::admin_router())
        .merge(routes::team::admin_router())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(upload_body_limit(
            config.max_upload_bytes,
        )))
        .layer(from_fn_with_state(
            deployment.clone(),
            auth::require_admin_token,
        ));

    let api_routes = Router::new()
        .merge(routes::gallery::public_router())
        .merge(routes::team::public_router())
        .merge(routes::admin::router())
        .merge(admin_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(deployment.blobs().root()))
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(deployment)
}

fn upload_body_limit(max_upload_bytes: u64) -> usize {
    let limit = max_upload_bytes
        .saturating_mul(MAX_GALLERY_FILES as u64)
        .saturating_add(FORM_OVERHEAD_BYTES);
    usize::try_from(limit).unwrap_or(usize::MAX)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(origin = %origin, error = %err, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-token"),
        ])
        .max_age(Duration::from_secs(60 * 60))
}
