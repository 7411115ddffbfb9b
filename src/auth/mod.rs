//! Optional pre-shared key guarding the local `/api` routes.
//!
//! The key is accepted from `x-api-key` or as a bearer token and compared in
//! constant time.

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Header carrying the local key.
pub const LOCAL_KEY_HEADER: &str = "x-api-key";

/// Where a presented key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Credential<'a> {
    Header(&'a str),
    Bearer(&'a str),
}

impl<'a> Credential<'a> {
    fn from_headers(headers: &'a HeaderMap) -> Option<Self> {
        if let Some(key) = headers.get(LOCAL_KEY_HEADER).and_then(|v| v.to_str().ok()) {
            return Some(Credential::Header(key));
        }
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(Credential::Bearer)
    }

    fn key(&self) -> &'a str {
        match self {
            Credential::Header(key) | Credential::Bearer(key) => key,
        }
    }
}

/// Check request headers against the configured key.
pub fn authorize(headers: &HeaderMap, expected: &str) -> Result<(), AppError> {
    match Credential::from_headers(headers) {
        Some(credential) if keys_match(credential.key(), expected) => Ok(()),
        Some(Credential::Header(_)) => Err(AppError::Unauthorized("Invalid API key".to_string())),
        _ => Err(AppError::Unauthorized(
            "Missing or invalid API key".to_string(),
        )),
    }
}

/// Middleware for the `/api` router. Without a configured key every request passes.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    match authorize(request.headers(), &expected) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::debug!(path = %request.uri().path(), "Rejected local API request");
            err.into_response()
        }
    }
}

fn keys_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}
