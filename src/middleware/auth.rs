use std::sync::Arc;

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};
use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::error::AppError;
use crate::models::auth::{AuthContext, Claims};
use crate::AppState;

/// Verifies an HS256 session token against `secret`.
pub fn verify_jwt_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves the caller if a valid token is present; used by endpoints that also serve
/// anonymous requests.
pub fn optional_auth(headers: &HeaderMap, secret: &str) -> Option<AuthContext> {
    let token = bearer_token(headers)?;
    match verify_jwt_token(token, secret) {
        Ok(claims) => Some(AuthContext {
            claims,
            token: token.to_string(),
        }),
        Err(e) => {
            tracing::debug!("Ignoring invalid token on optional-auth route: {}", e);
            None
        }
    }
}

pub async fn auth_middleware(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(&headers) else {
        tracing::debug!("Missing or malformed Authorization header");
        return Err(AppError::AuthRequired);
    };

    let claims = verify_jwt_token(token, &state.config.jwt_secret).map_err(|e| {
        tracing::warn!("JWT verification failed: {}", e);
        AppError::AuthRequired
    })?;

    // Handlers read the caller (and the token to forward) from extensions
    request.extensions_mut().insert(AuthContext {
        claims,
        token: token.to_string(),
    });

    Ok(next.run(request).await)
}
