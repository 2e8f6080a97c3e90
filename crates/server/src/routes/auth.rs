use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Form, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use service::auth::domain::{LoginInput, RegisterInput};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::notify::Notification;

use crate::auth::{ServerState, AUTH_COOKIE};
use crate::errors::ApiError;

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct MeOutput {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

fn auth_service(state: &ServerState) -> AuthService<SeaOrmAuthRepository> {
    let repo = Arc::new(SeaOrmAuthRepository { db: state.db.clone() });
    AuthService::new(
        repo,
        AuthConfig {
            jwt_secret: Some(state.auth.jwt_secret.clone()),
            token_ttl_hours: state.auth.token_ttl_hours,
        },
    )
}

#[utoipa::path(post, path = "/register", tag = "auth",
    responses(
        (status = 201, description = "User registered"),
        (status = 400, description = "Invalid email, name or password"),
        (status = 409, description = "Email already registered")))]
pub async fn register(
    State(state): State<ServerState>,
    Form(input): Form<RegisterForm>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let svc = auth_service(&state);
    let user = svc
        .register(RegisterInput {
            email: input.email,
            name: input.name,
            password: input.password,
        })
        .await?;
    // user row is committed; the welcome mail goes post-commit
    state
        .notifier
        .notify(Notification::Registration { to: user.email, name: user.name });
    Ok((StatusCode::CREATED, "User registered successfully! You can sign in."))
}

#[utoipa::path(post, path = "/login", tag = "auth",
    responses(
        (status = 200, description = "Session cookie issued"),
        (status = 401, description = "Invalid credentials")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Form(input): Form<LoginForm>,
) -> Result<(CookieJar, Json<MeOutput>), ApiError> {
    let svc = auth_service(&state);
    let session = svc
        .login(LoginInput { email: input.email, password: input.password })
        .await?;
    let token = session
        .token
        .ok_or_else(|| ApiError::Internal("token generation failed".into()))?;

    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);

    let user = session.user;
    Ok((jar, Json(MeOutput { user_id: user.id, email: user.email, name: user.name })))
}

#[utoipa::path(post, path = "/logout", tag = "auth",
    responses((status = 204, description = "Session cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::from(AUTH_COOKIE));
    (jar, StatusCode::NO_CONTENT)
}
