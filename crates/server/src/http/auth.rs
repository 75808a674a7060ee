use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use deployment::Deployment;
use secrecy::ExposeSecret;

use crate::{DeploymentImpl, error::ApiError};

/// Byte comparison whose running time depends only on the lengths.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn extract_request_token(req: &Request) -> Option<&str> {
    // 1) Authorization: Bearer <token>
    if let Some(value) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
    {
        return Some(value);
    }

    // 2) X-API-Token: <token>
    req.headers()
        .get("x-api-token")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Guards the routes that change site content. Passes everything through when
/// no admin token is configured.
pub async fn require_admin_token(
    State(deployment): State<DeploymentImpl>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected_token) = deployment
        .config()
        .access_control
        .token
        .as_ref()
        .map(|token| token.expose_secret())
    else {
        return next.run(req).await;
    };

    let presented = extract_request_token(&req);
    let accepted = presented
        .is_some_and(|token| constant_time_eq(token.as_bytes(), expected_token.as_bytes()));
    if !accepted {
        let reason = if presented.is_none() {
            "missing_token"
        } else {
            "token_mismatch"
        };

        tracing::warn!(
            path = %req.uri().path(),
            method = %req.method(),
            reason,
            "Unauthorized API request"
        );

        return ApiError::Unauthorized.into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::{constant_time_eq, parse_authorization_bearer};

    #[test]
    fn bearer_scheme_is_case_insensitive_and_requires_a_token() {
        assert_eq!(parse_authorization_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_authorization_bearer("  bearer   abc "), Some("abc"));
        assert_eq!(parse_authorization_bearer("Basic abc"), None);
        assert_eq!(parse_authorization_bearer("Bearer "), None);
        assert_eq!(parse_authorization_bearer("abc"), None);
    }

    #[test]
    fn compares_whole_values() {
        assert!(constant_time_eq(b"admin", b"admin"));
        assert!(!constant_time_eq(b"admin", b"admin1"));
        assert!(!constant_time_eq(b"admin", b"Admin"));
        assert!(constant_time_eq(b"", b""));
    }
}
