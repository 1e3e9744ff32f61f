use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use tracing::{error, info};

use crate::errors::AppError;
use crate::extractors::AuthUser;
use crate::models::{ApiResponse, AuthResponse, LoginRequest, RegisterRequest, User};
use crate::routes::blocking;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), AppError> {
    info!("POST /api/auth/register - Registering user");
    let Json(request) = payload?;

    let auth = state.auth.clone();
    let response = blocking(move || auth.register(request))
        .await
        .map_err(|e| {
            error!("Failed to register user: {}", e);
            e
        })?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(response, "User created successfully"))))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    info!("POST /api/auth/login - Logging in");
    let Json(request) = payload?;

    let auth = state.auth.clone();
    let response = blocking(move || auth.login(request)).await?;

    Ok(Json(ApiResponse::ok(response, "Login successful")))
}

pub async fn me(AuthUser(user): AuthUser) -> Json<ApiResponse<User>> {
    info!("GET /api/auth/me - Current user {}", user.id);
    Json(ApiResponse::ok(user, "User retrieved successfully"))
}
