/// User endpoints
///
/// Registration and login. Both issue the same kind of bearer token: subject
/// is the user id, expiry is the configured fixed TTL. Authentication is
/// stateless — holding a valid token is the entire session.
///
/// # Endpoints
///
/// - `POST /api/users/register` - Register a new account
/// - `POST /api/users/login` - Exchange credentials for a token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use bookery_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User},
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name, shown as the author of uploaded books
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password; no strength policy is applied
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Token response, shared by register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed bearer token; subject is the user id
    pub token: String,
}

fn issue_token(state: &AppState, user: &User) -> Result<String, ApiError> {
    let claims = jwt::Claims::new(user.id, Duration::hours(state.config.jwt.ttl_hours));
    Ok(jwt::create_token(&claims, state.jwt_secret())?)
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/users/register
/// Content-Type: application/json
///
/// { "name": "John Doe", "email": "user@example.com", "password": "..." }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    // The unique constraint on email surfaces as 409 Conflict
    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            name: req.name,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    let token = issue_token(&state, &user)?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// Login with email and password
///
/// Unknown email and wrong password return an identical 401 so the response
/// doesn't reveal which check failed.
///
/// # Endpoint
///
/// ```text
/// POST /api/users/login
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "..." }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
/// - `422 Unprocessable Entity`: Validation failed
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    tracing::info!(user_id = %user.id, "User logged in");

    let token = issue_token(&state, &user)?;

    Ok(Json(TokenResponse { token }))
}
