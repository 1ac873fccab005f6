use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

pub use flickhub_types::api::Claims;

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// Name of the session cookie holding the JWT.
pub const SESSION_COOKIE: &str = "uJwt";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub jwt_secret: String,
    pub ttl: chrono::Duration,
    /// Mark the cookie `Secure` (HTTPS only).
    pub secure_cookie: bool,
}

impl SessionConfig {
    pub fn create_token(&self, user_id: i64, uname: &str) -> ApiResult<String> {
        let exp = chrono::Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ApiError::Internal("session lifetime out of range".into()))?;
        let claims = Claims {
            sub: user_id,
            uname: uname.to_string(),
            exp: exp.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("failed to sign session token: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| debug!("Rejected session token: {}", e))
        .ok()
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .build()
    }
}

/// Cookie that makes the browser drop the session.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Validate the `uJwt` cookie and expose its claims to handlers as an
/// `Extension<Claims>`. Anything else is answered with 403.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(ApiError::Unauthorized)?;

    let claims = state
        .session
        .verify_token(&token)
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
