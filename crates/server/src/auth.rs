use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use uuid::Uuid;

use service::notify::Notifier;

use crate::errors::ApiError;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: ServerAuthConfig,
    pub notifier: Notifier,
}

/// The authenticated principal, resolved once per request from the session
/// cookie and passed explicitly into every workflow call. Nothing below
/// the boundary reads ambient auth state.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Deserialize)]
struct Claims {
    sub: String,
    uid: String,
    #[allow(dead_code)]
    exp: usize,
}

#[async_trait]
impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(AUTH_COOKIE).ok_or_else(ApiError::unauthenticated)?;
        let data = decode::<Claims>(
            token.value(),
            &DecodingKey::from_secret(state.auth.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| ApiError::unauthenticated())?;
        let id = Uuid::parse_str(&data.claims.uid).map_err(|_| ApiError::unauthenticated())?;
        Ok(CurrentUser { id, email: data.claims.sub })
    }
}
