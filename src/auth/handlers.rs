use axum::{
    extract::{FromRef, State},
    http::{header, StatusCode},
    routing::post,
    Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MessageResponse, PublicUser, RegisterRequest},
        jwt::{JwtKeys, AUTH_COOKIE},
        password::{hash_password, verify_password},
    },
    error::ApiError,
    extract::Json,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn session_cookie(token: &str, max_age_secs: u64) -> String {
    format!("{AUTH_COOKIE}={token}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={max_age_secs}")
}

fn cleared_session_cookie() -> String {
    format!("{AUTH_COOKIE}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0")
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    if payload.username.is_empty() {
        return Err(ApiError::Validation("Username is required".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::Validation("Password too short".into()));
    }

    let taken_email = state
        .users
        .find_by_email(&payload.email)
        .await
        .map_err(|e| ApiError::internal("Failed to register", e))?;
    let taken_username = state
        .users
        .find_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal("Failed to register", e))?;
    if taken_email.is_some() || taken_username.is_some() {
        warn!(email = %payload.email, "registration for existing user");
        return Err(ApiError::Validation("User already exists".into()));
    }

    let hash = hash_password(&payload.password)
        .map_err(|e| ApiError::internal("Failed to register", e))?;
    let user = state
        .users
        .create(&payload.username, &payload.email, &hash)
        .await
        .map_err(|e| ApiError::internal("Failed to register", e))?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys
        .sign(user.id, &user.email)
        .map_err(|e| ApiError::internal("Failed to register", e))?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, session_cookie(&token, keys.ttl.as_secs()))],
        Json(AuthResponse {
            message: "User registered successfully".into(),
            user: PublicUser::from(user),
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<([(header::HeaderName, String); 1], Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("Email and password are required".into()));
    }

    let user = state
        .users
        .find_by_email(&payload.email)
        .await
        .map_err(|e| ApiError::internal("Failed to login", e))?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::InvalidCredentials
        })?;

    let ok = verify_password(&payload.password, &user.password_hash)
        .map_err(|e| ApiError::internal("Failed to login", e))?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys
        .sign(user.id, &user.email)
        .map_err(|e| ApiError::internal("Failed to login", e))?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        [(header::SET_COOKIE, session_cookie(&token, keys.ttl.as_secs()))],
        Json(AuthResponse {
            message: "Login successful".into(),
            user: PublicUser::from(user),
            token,
        }),
    ))
}

/// Tokens are stateless, so logout only clears the cookie. No valid token is
/// required; the client calls this best-effort.
#[instrument]
pub async fn logout() -> ([(header::HeaderName, String); 1], Json<MessageResponse>) {
    (
        [(header::SET_COOKIE, cleared_session_cookie())],
        Json(MessageResponse {
            message: "Logged out successfully".into(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_app;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(
        app: axum::Router,
        path: &str,
        body: Value,
    ) -> (StatusCode, Option<String>, Value) {
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(path)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, cookie, serde_json::from_slice(&bytes).unwrap())
    }

    fn register_body() -> Value {
        json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "hunter2hunter2"
        })
    }

    #[tokio::test]
    async fn register_sets_cookie_and_returns_token() {
        let state = AppState::fake();
        let (status, cookie, body) =
            send(build_app(state), "/api/auth/register", register_body()).await;
        assert_eq!(status, StatusCode::CREATED);
        let cookie = cookie.expect("set-cookie header");
        assert!(cookie.starts_with("auth-token="));
        assert!(cookie.contains("HttpOnly"));
        assert_eq!(body["user"]["username"], "ada");
        assert!(body["token"].as_str().unwrap().contains('.'));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_user() {
        let state = AppState::fake();
        let app = build_app(state);
        let (status, _, _) = send(app.clone(), "/api/auth/register", register_body()).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _, body) = send(app, "/api/auth/register", register_body()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "User already exists");
    }

    #[tokio::test]
    async fn register_rejects_invalid_email() {
        let state = AppState::fake();
        let (status, _, body) = send(
            build_app(state),
            "/api/auth/register",
            json!({"username": "ada", "email": "nope", "password": "hunter2hunter2"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid email");
    }

    #[tokio::test]
    async fn register_rejects_missing_fields() {
        let state = AppState::fake();
        let app = build_app(state);
        for (body, error) in [
            (
                json!({"email": "ada@example.com", "password": "hunter2hunter2"}),
                "Username is required",
            ),
            (
                json!({"username": "ada", "password": "hunter2hunter2"}),
                "Invalid email",
            ),
            (
                json!({"username": "ada", "email": "ada@example.com"}),
                "Password too short",
            ),
        ] {
            let (status, _, res) = send(app.clone(), "/api/auth/register", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(res["error"], error);
        }
    }

    #[tokio::test]
    async fn login_rejects_missing_fields() {
        let state = AppState::fake();
        let app = build_app(state);
        for body in [
            json!({"password": "hunter2hunter2"}),
            json!({"email": "ada@example.com"}),
            json!({}),
        ] {
            let (status, _, res) = send(app.clone(), "/api/auth/login", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(res["error"], "Email and password are required");
        }
    }

    #[tokio::test]
    async fn login_roundtrip_and_wrong_password() {
        let state = AppState::fake();
        let app = build_app(state);
        send(app.clone(), "/api/auth/register", register_body()).await;

        let (status, cookie, body) = send(
            app.clone(),
            "/api/auth/login",
            json!({"email": "ada@example.com", "password": "hunter2hunter2"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(cookie.expect("set-cookie").starts_with("auth-token="));
        assert_eq!(body["message"], "Login successful");

        let (status, _, body) = send(
            app,
            "/api/auth/login",
            json!({"email": "ada@example.com", "password": "wrong-password"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let state = AppState::fake();
        let (status, cookie, body) =
            send(build_app(state), "/api/auth/logout", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        let cookie = cookie.expect("set-cookie");
        assert!(cookie.starts_with("auth-token=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert_eq!(body["message"], "Logged out successfully");
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.io"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("not an email"));
    }
}
