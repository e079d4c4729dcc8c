//! Authentication handlers.

use actix_web::{HttpResponse, web};

use insights_core::domain::SignupInput;
use insights_core::error::{DomainError, ValidationErrors};
use insights_shared::dto::{AuthResponse, LoginRequest, SignupRequest, SignupResponse, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult, NOT_AUTHENTICATED};
use crate::state::AppState;

const REQUIRED: &str = "This field is required.";

/// POST /api/auth/signup
pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<SignupRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    // Absent fields reach the account rules as empty values.
    let created = state
        .accounts
        .signup(SignupInput {
            username: req.username.unwrap_or_default(),
            email: req.email,
            password: req.password,
        })
        .await?;

    tracing::info!(user_id = %created.id, "User signed up");

    Ok(HttpResponse::Created().json(SignupResponse {
        id: created.id,
        username: created.username,
        email: created.email,
    }))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    required_credentials(&req.username, &req.password)?;

    let username = req.username.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    let user = state.accounts.authenticate(&username, &password).await?;

    let token = state
        .tokens
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::debug!(user_id = %user.id, "Login succeeded");

    Ok(HttpResponse::Ok().json(AuthResponse::bearer(
        token,
        state.tokens.expiration_seconds().max(0) as u64,
    )))
}

/// GET /api/auth/me - Protected route
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    // The account may have been removed after the token was issued.
    let user = match state.accounts.get_user(identity.user_id).await {
        Ok(user) => user,
        Err(DomainError::NotFound { .. }) => {
            return Err(AppError::Unauthorized(NOT_AUTHENTICATED.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id,
        username: user.username,
        email: user.email.unwrap_or_default(),
        created_at: user.created_at,
    }))
}

fn required_credentials(
    username: &Option<String>,
    password: &Option<String>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if username.is_none() {
        errors.add("username", REQUIRED);
    }
    if password.is_none() {
        errors.add("password", REQUIRED);
    }
    errors.into_result()
}
