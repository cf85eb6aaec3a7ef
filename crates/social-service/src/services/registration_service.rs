//! User self-registration.
//!
//! # Steps
//!
//! 1. Validate username, email and password
//! 2. Hash the password (bcrypt)
//! 3. Resolve the default `user` role
//! 4. Generate an activation token; only its SHA-256 digest is stored
//! 5. Insert the user and its invitation in one transaction
//! 6. Send the confirmation mail
//! 7. If the mail fails, undo step 5 and fail the request
//!
//! The mail cannot join the database transaction, so a user row exists for
//! a short time without a delivered invitation. Step 7 removes it again.

use crate::config::Config;
use crate::crypto;
use crate::errors::SocialError;
use crate::mailer::{EmailSender, OutgoingMail};
use crate::models::{NewUser, User, DEFAULT_ROLE};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{record_compensation, record_registration};
use crate::services::validation::{check_email, check_length};
use crate::store::{Store, StoreError};
use chrono::Utc;
use common::secret::ExposeSecret;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterUserRequest {
    pub fn validate(&self) -> Result<(), SocialError> {
        check_length("username", &self.username, 2, 100)?;
        check_email(&self.email)?;
        check_length("password", &self.password, 8, 100)?;
        Ok(())
    }
}

/// Settings the saga reads from [`Config`].
#[derive(Debug, Clone)]
pub struct RegistrationSettings {
    pub frontend_url: String,
    pub bcrypt_cost: u32,
    pub invitation_ttl: chrono::Duration,
}

impl RegistrationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            frontend_url: config.frontend_url.clone(),
            bcrypt_cost: config.bcrypt_cost,
            invitation_ttl: chrono::Duration::seconds(config.mail.invitation_expiry_seconds),
        }
    }

    fn activation_url(&self, token: &str) -> String {
        format!("{}/confirm/{token}", self.frontend_url)
    }
}

/// Undo step for a registration whose confirmation mail was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compensation {
    DeleteUser(i64),
    CleanInvitations(i64),
}

impl Compensation {
    fn step(self) -> &'static str {
        match self {
            Compensation::DeleteUser(_) => "delete_user",
            Compensation::CleanInvitations(_) => "clean_invitations",
        }
    }

    async fn apply(self, store: &dyn Store) -> Result<(), StoreError> {
        match self {
            Compensation::DeleteUser(user_id) => store.delete_user_by_id(user_id).await,
            Compensation::CleanInvitations(user_id) => {
                store.clean_invitation_by_user_id(user_id).await
            }
        }
    }
}

/// Run every compensation in order. Failures are logged and do not stop
/// the remaining steps.
pub async fn compensate(store: &dyn Store, steps: &[Compensation]) {
    for &step in steps {
        match step.apply(store).await {
            Ok(()) => record_compensation(step.step(), true),
            Err(e) => {
                record_compensation(step.step(), false);
                tracing::error!(
                    target: "social.registration",
                    step = step.step(),
                    error = %e,
                    "Registration compensation failed"
                );
            }
        }
    }
}

/// Register a user and send the confirmation mail.
///
/// On success the returned user carries the plaintext activation token.
#[instrument(skip_all, fields(email_hash = %hash_for_correlation(&request.email)))]
pub async fn register_user(
    store: Arc<dyn Store>,
    mailer: &dyn EmailSender,
    settings: &RegistrationSettings,
    request: RegisterUserRequest,
) -> Result<User, SocialError> {
    if let Err(e) = request.validate() {
        record_registration("invalid");
        return Err(e);
    }

    let password_hash = crypto::hash_password(&request.password, settings.bcrypt_cost)
        .inspect_err(|_| record_registration("invalid"))?;

    let role = store.get_role_by_name(DEFAULT_ROLE).await.map_err(|e| {
        record_registration("error");
        SocialError::Internal(format!("Default role lookup failed: {e}"))
    })?;

    let token = crypto::generate_activation_token()?;
    let token_hash = crypto::hash_token(token.expose_secret());
    let expiry = Utc::now() + settings.invitation_ttl;

    let new_user = NewUser {
        username: request.username,
        email: request.email,
        password_hash,
        role_id: role.id,
    };

    let mut user = store
        .create_and_invite(&new_user, &token_hash, expiry)
        .await
        .map_err(|e| {
            let outcome = match e {
                StoreError::Conflict(_) => "conflict",
                _ => "error",
            };
            record_registration(outcome);
            SocialError::from(e)
        })?;

    let mail = OutgoingMail::confirmation(
        &user.email,
        &user.username,
        settings.activation_url(token.expose_secret()),
    );

    if let Err(mail_err) = mailer.send(&mail).await {
        tracing::warn!(
            target: "social.registration",
            user_id = user.id,
            error = %mail_err,
            "Confirmation mail failed, rolling back registration"
        );
        record_registration("mail_failed");

        // Detached from the request future so a client disconnect cannot
        // skip the cleanup.
        let cleanup_store = Arc::clone(&store);
        let steps = [
            Compensation::DeleteUser(user.id),
            Compensation::CleanInvitations(user.id),
        ];
        let cleanup = tokio::spawn(async move { compensate(cleanup_store.as_ref(), &steps).await });
        if let Err(e) = cleanup.await {
            tracing::error!(target: "social.registration", error = %e, "Compensation task panicked");
        }

        return Err(mail_err.into());
    }

    record_registration("success");
    tracing::info!(target: "social.registration", user_id = user.id, "User registered");

    user.activation_token = Some(token.expose_secret().to_string());
    Ok(user)
}
