use axum::{extract::State, http::StatusCode, Json};
use kanban_shared::api::{
    AuthResponse, EmailCheckQuery, FromJson, LoginRequest, RegistrationRequest, UserSummary,
};
use kanban_shared::validation::{
    self, ValidationErrors, EMAIL_TAKEN, INVALID_CREDENTIALS, NON_FIELD_ERRORS,
};
use serde_json::Value;

use crate::auth::{generate_token, hash_password, verify_password};
use crate::error::AppError;
use crate::extract::{Payload, QueryParams};
use crate::routes::AppState;
use crate::store::{NewUser, StoreError};

/// POST /api/registration/
pub async fn register(
    State(state): State<AppState>,
    Payload(body): Payload<Value>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let account = validation::registration(RegistrationRequest::from_json(body)?)?;

    if state.store.find_user_by_email(&account.email).await?.is_some() {
        return Err(ValidationErrors::single("email", EMAIL_TAKEN).into());
    }

    let password_hash = hash_password(&account.password)?;

    // A concurrent registration can still win between the check and the insert.
    let user = state
        .store
        .create_user(NewUser {
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => {
                AppError::from(ValidationErrors::single("email", EMAIL_TAKEN))
            }
            other => AppError::from(other),
        })?;

    let token = state.store.issue_token(user.id, generate_token()).await?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(AuthResponse::new(token, &user))))
}

/// POST /api/login/
pub async fn login(
    State(state): State<AppState>,
    Payload(body): Payload<Value>,
) -> Result<Json<AuthResponse>, AppError> {
    let credentials = validation::login(LoginRequest::from_json(body)?)?;
    let invalid =
        || AppError::from(ValidationErrors::single(NON_FIELD_ERRORS, INVALID_CREDENTIALS));

    let (user, password_hash) = state
        .store
        .find_credentials(&credentials.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&credentials.password, &password_hash) {
        return Err(invalid());
    }

    let token = state.store.issue_token(user.id, generate_token()).await?;
    tracing::debug!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse::new(token, &user)))
}

/// GET /api/email-check/?email=
pub async fn email_check(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<EmailCheckQuery>,
) -> Result<Json<UserSummary>, AppError> {
    let email = validation::email_check(query)?;

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(UserSummary {
        fullname: user.display_name(),
        ..UserSummary::from(&user)
    }))
}
