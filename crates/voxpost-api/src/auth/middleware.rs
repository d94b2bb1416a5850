use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use voxpost_core::AppError;
use voxpost_db::UserRepository;

use super::models::{AuthContext, JwtClaims};
use crate::error::HttpAppError;

#[derive(Clone)]
pub struct AuthState {
    pub jwt_secret: String,
    pub users: UserRepository,
}

fn decode_token(jwt_secret: &str, token: &str) -> Result<JwtClaims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {e}")))
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Malformed Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Expected Bearer token".to_string()))
}

/// Validate the bearer token, upsert the local user row, and attach an
/// [`AuthContext`] to the request.
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, HttpAppError> {
    let token = bearer_token(&request)?;
    let claims = decode_token(&auth_state.jwt_secret, token)?;

    let user = auth_state.users.upsert(&claims.sub, &claims.email).await?;

    request.extensions_mut().insert(AuthContext { user });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequestParts;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn request_with_auth(value: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/api/recordings");
        if let Some(v) = value {
            builder = builder.header(axum::http::header::AUTHORIZATION, v);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn signed_token(secret: &str, exp_offset_secs: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = JwtClaims {
            sub: "user_1".to_string(),
            email: "user@example.com".to_string(),
            exp: now + exp_offset_secs,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_bearer_token_missing_header() {
        let request = request_with_auth(None);
        assert!(matches!(
            bearer_token(&request),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let request = request_with_auth(Some("Basic abc123"));
        assert!(matches!(
            bearer_token(&request),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_bearer_token_extracts_value() {
        let request = request_with_auth(Some("Bearer tok123"));
        assert_eq!(bearer_token(&request).unwrap(), "tok123");
    }

    #[test]
    fn test_decode_token_roundtrip() {
        let token = signed_token("secret", 3600);
        let claims = decode_token("secret", &token).unwrap();
        assert_eq!(claims.sub, "user_1");
        assert_eq!(claims.email, "user@example.com");
    }

    #[test]
    fn test_decode_token_rejects_wrong_secret() {
        let token = signed_token("secret", 3600);
        assert!(matches!(
            decode_token("other", &token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_decode_token_rejects_expired() {
        let token = signed_token("secret", -3600);
        assert!(matches!(
            decode_token("secret", &token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_auth_context_rejects_missing_extension() {
        let (mut parts, _) = axum::http::Request::builder()
            .uri("/api/recordings")
            .body(Body::empty())
            .unwrap()
            .into_parts();

        let result = AuthContext::from_request_parts(&mut parts, &()).await;
        let (status, _) = result.err().expect("extraction should fail");
        assert_eq!(status, axum::http::StatusCode::UNAUTHORIZED);
    }
}
