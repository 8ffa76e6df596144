use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{User, UserProfile};
use crate::routes::extract::JsonBody;
use crate::routes::middleware_auth::CurrentOwner;
use crate::state::AppState;
use crate::store::{StoreError, UserStore};

const MIN_PASSWORD_LEN: usize = 8;

pub const DEMO_EMAIL: &str = "demo@quicktask.com";
const DEMO_PASSWORD: &str = "demo123456";
const DEMO_NAME: &str = "Demo User";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserProfile,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: UserProfile,
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is unreadable");
            false
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates a user, mapping a taken email to 409.
async fn create_user(
    users: &dyn UserStore,
    full_name: &str,
    email: &str,
    password: &str,
) -> AppResult<User> {
    let user = User {
        id: Uuid::new_v4(),
        full_name: full_name.trim().to_string(),
        email: normalize_email(email),
        password_hash: hash_password(password)?,
        created_at: Utc::now(),
    };

    match users.insert_user(&user).await {
        Ok(()) => Ok(user),
        Err(StoreError::Duplicate(_)) => Err(AppError::Conflict("User already exists".to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Makes sure the demo account exists. Returns whether it was created.
pub async fn ensure_demo_user(users: &dyn UserStore) -> AppResult<bool> {
    if users.find_user_by_email(DEMO_EMAIL).await?.is_some() {
        return Ok(false);
    }

    match create_user(users, DEMO_NAME, DEMO_EMAIL, DEMO_PASSWORD).await {
        Ok(_) => Ok(true),
        // another instance seeded it first
        Err(AppError::Conflict(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegistrationRequest>,
) -> AppResult<impl IntoResponse> {
    if payload.full_name.trim().is_empty() {
        return Err(AppError::Validation("Please provide your full name".to_string()));
    }
    if !payload.email.contains('@') {
        return Err(AppError::Validation("Please provide a valid email".to_string()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }

    let user = create_user(
        state.users.as_ref(),
        &payload.full_name,
        &payload.email,
        &payload.password,
    )
    .await?;
    let token = state.tokens.issue(user.id)?;
    tracing::info!(user_id = %user.id, "registered user");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            token,
            user: UserProfile::from(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::Unauthenticated("Invalid credentials".to_string());

    let user = state
        .users
        .find_user_by_email(&normalize_email(&payload.email))
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password_hash) {
        return Err(invalid());
    }

    let token = state.tokens.issue(user.id)?;
    Ok(Json(AuthResponse {
        success: true,
        token,
        user: UserProfile::from(&user),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentOwner(user_id): CurrentOwner,
) -> AppResult<Json<MeResponse>> {
    let user = state
        .users
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse {
        success: true,
        user: UserProfile::from(&user),
    }))
}
