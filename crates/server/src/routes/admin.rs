use axum::{Json, Router, extract::State, response::Json as ResponseJson, routing::post};
use deployment::Deployment;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{DeploymentImpl, error::ApiError, http::auth::constant_time_eq};

#[derive(Debug, Deserialize, TS)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, TS)]
pub struct LoginResponse {
    pub token: String,
}

/// Exchanges the configured admin credentials for the API token that guards
/// the upload and delete routes.
pub async fn login(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<LoginResponse>, ApiError> {
    let access = &deployment.config().access_control;
    let (Some(token), Some(username), Some(password)) = (
        access.token.as_ref(),
        access.admin_username.as_deref(),
        access.admin_password.as_ref(),
    ) else {
        return Err(ApiError::NotFound("Admin login is not configured".to_string()));
    };

    let username_ok = constant_time_eq(payload.username.as_bytes(), username.as_bytes());
    let password_ok =
        constant_time_eq(payload.password.as_bytes(), password.expose_secret().as_bytes());
    if !(username_ok && password_ok) {
        tracing::warn!("Rejected admin login attempt");
        return Err(ApiError::InvalidCredentials);
    }

    tracing::info!("Admin logged in");
    Ok(ResponseJson(LoginResponse {
        token: token.expose_secret().to_string(),
    }))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/admin/login", post(login))
}
