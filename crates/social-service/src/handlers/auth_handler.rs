use crate::errors::SocialError;
use crate::models::User;
use crate::routes::AppState;
use crate::services::registration_service::{self, RegisterUserRequest, RegistrationSettings};
use crate::services::token_service::{self, CreateTokenRequest, TokenResponse};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

/// Register a user and send the activation email.
///
/// POST /v1/authentication/user
///
/// Responds 201 with the created user and its plaintext activation token.
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<User>), SocialError> {
    let settings = RegistrationSettings::from_config(&state.config);
    let user = registration_service::register_user(
        Arc::clone(&state.store),
        state.mailer.as_ref(),
        &settings,
        payload,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange email and password for a bearer token.
///
/// POST /v1/authentication/token
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTokenRequest>,
) -> Result<Json<TokenResponse>, SocialError> {
    let token =
        token_service::create_token(state.store.as_ref(), &state.authenticator, &payload).await?;

    Ok(Json(token))
}
