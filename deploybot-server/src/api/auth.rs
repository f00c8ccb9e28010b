//! Bearer token authentication
//!
//! Every route except `/health` requires `Authorization: Bearer <token>`
//! carrying an HS256 JWT signed with the configured secret. The decoded
//! claims are stored in the request extensions.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the calling user
    pub sub: String,
    /// Expiration (unix timestamp)
    pub exp: i64,
}

/// Shared verification settings
#[derive(Clone)]
pub struct JwtState {
    pub decoding_key: DecodingKey,
    pub validation: Validation,
}

impl JwtState {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let msg = match self {
            AuthError::MissingToken => "missing authorization token".to_string(),
            AuthError::InvalidToken(e) => format!("invalid token: {}", e),
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": msg })),
        )
            .into_response()
    }
}

pub async fn auth_middleware(
    State(jwt): State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if is_public_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    let token_data = jsonwebtoken::decode::<Claims>(token, &jwt.decoding_key, &jwt.validation)
        .map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            AuthError::InvalidToken(e.to_string())
        })?;

    request.extensions_mut().insert(token_data.claims);

    Ok(next.run(request).await)
}

fn is_public_path(path: &str) -> bool {
    path == "/health"
}

#[cfg(test)]
pub(crate) fn issue_token(secret: &str, sub: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
