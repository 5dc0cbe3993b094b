//! Admin bearer tokens: signing, verification, and the route middleware.
//!
//! Tokens are HS256 JWTs carrying the admin role and login id with a fixed
//! 12-hour expiry.  Every mutating route is wrapped in [`require_admin`],
//! which rejects missing, malformed, expired, or non-admin tokens with 401.

use axum::{
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::ApiError;

/// Token lifetime in hours.
const TOKEN_TTL_HOURS: i64 = 12;

/// Claims carried by an admin token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Always `"admin"` for tokens issued by this server.
    pub role: String,
    /// Login id of the authenticated admin.
    #[serde(rename = "adminId")]
    pub admin_id: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// Sign a fresh admin token.
pub fn sign_admin_token(secret: &str, admin_id: &str) -> Result<String, ApiError> {
    let now = chrono::Utc::now();
    let claims = AdminClaims {
        role: "admin".to_string(),
        admin_id: admin_id.to_string(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to sign token: {e}")))
}

/// Verify a token and return its claims.
///
/// Signature and expiry are checked by `jsonwebtoken`; the role claim is
/// checked here so a token signed for another role can never mutate state.
pub fn verify_admin_token(secret: &str, token: &str) -> Result<AdminClaims, ApiError> {
    let data = decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("Invalid token"))?;

    if data.claims.role != "admin" {
        return Err(ApiError::Unauthorized("Admin role required"));
    }

    Ok(data.claims)
}

/// Extract the bearer token from an `Authorization` header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Middleware guarding the admin-only routes.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or(ApiError::Unauthorized("No token"))?;
    let claims = verify_admin_token(&state.config.jwt_secret, token)?;

    // Handlers can read the authenticated identity from extensions.
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip() {
        let token = sign_admin_token("secret", "admin").unwrap();
        let claims = verify_admin_token("secret", &token).unwrap();

        assert_eq!(claims.role, "admin");
        assert_eq!(claims.admin_id, "admin");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = sign_admin_token("secret", "admin").unwrap();
        assert!(verify_admin_token("other-secret", &token).is_err());
    }

    #[test]
    fn garbage_token_rejected() {
        assert!(verify_admin_token("secret", "not.a.jwt").is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let now = chrono::Utc::now().timestamp();
        let claims = AdminClaims {
            role: "admin".to_string(),
            admin_id: "admin".to_string(),
            iat: now - 7200,
            // well past the default validation leeway
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(verify_admin_token("secret", &token).is_err());
    }

    #[test]
    fn non_admin_role_rejected() {
        let now = chrono::Utc::now().timestamp();
        let claims = AdminClaims {
            role: "visitor".to_string(),
            admin_id: "someone".to_string(),
            iat: now,
            exp: now + 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(verify_admin_token("secret", &token).is_err());
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(bearer_token(&headers).is_none());
    }
}
