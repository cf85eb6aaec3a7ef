//! Login: exchange email and password for a bearer token.

use crate::auth::JwtAuthenticator;
use crate::crypto;
use crate::errors::SocialError;
use crate::observability::hash_for_correlation;
use crate::services::validation::{check_email, check_length};
use crate::store::{Store, StoreError};
use serde::{Deserialize, Serialize};
use tracing::instrument;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTokenRequest {
    pub email: String,
    pub password: String,
}

impl CreateTokenRequest {
    pub fn validate(&self) -> Result<(), SocialError> {
        check_email(&self.email)?;
        check_length("password", &self.password, 8, 100)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Issue a token for valid credentials.
///
/// Unknown email and wrong password produce the same `Unauthorized` error so
/// the response does not reveal which accounts exist.
#[instrument(skip_all, fields(email_hash = %hash_for_correlation(&request.email)))]
pub async fn create_token(
    store: &dyn Store,
    authenticator: &JwtAuthenticator,
    request: &CreateTokenRequest,
) -> Result<TokenResponse, SocialError> {
    request.validate()?;

    let user = match store.get_user_by_email(&request.email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            tracing::debug!(target: "social.auth", "Login for unknown email");
            return Err(SocialError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    if !crypto::verify_password(&request.password, &user.password_hash) {
        tracing::debug!(target: "social.auth", user_id = user.id, "Login with wrong password");
        return Err(SocialError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = authenticator.issue_for_user(user.id)?;
    tracing::info!(target: "social.auth", user_id = user.id, "Token issued");

    Ok(TokenResponse { token })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{NewUser, DEFAULT_ROLE};
    use crate::store::memory::InMemoryStore;

    fn authenticator() -> JwtAuthenticator {
        JwtAuthenticator::new(b"token-service-test-secret", "social", "social", 3600)
    }

    async fn store_with_bob() -> (InMemoryStore, i64) {
        let store = InMemoryStore::new();
        let role = store.get_role_by_name(DEFAULT_ROLE).await.unwrap();
        let user = store
            .create_user(&NewUser {
                username: "bob".to_string(),
                email: "bob@x.com".to_string(),
                password_hash: crypto::hash_password("longenough1", 4).unwrap(),
                role_id: role.id,
            })
            .await
            .unwrap();
        (store, user.id)
    }

    fn login(email: &str, password: &str) -> CreateTokenRequest {
        CreateTokenRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_token_valid_credentials() {
        let (store, user_id) = store_with_bob().await;
        let auth = authenticator();

        let response = create_token(&store, &auth, &login("bob@x.com", "longenough1"))
            .await
            .unwrap();

        let claims = auth.validate_token(&response.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_create_token_email_is_case_insensitive() {
        let (store, _) = store_with_bob().await;

        let result = create_token(&store, &authenticator(), &login("BOB@x.com", "longenough1")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_token_wrong_password_and_unknown_email_look_the_same() {
        let (store, _) = store_with_bob().await;
        let auth = authenticator();

        let wrong_password = create_token(&store, &auth, &login("bob@x.com", "wrongpassword"))
            .await
            .unwrap_err();
        let unknown_email = create_token(&store, &auth, &login("eve@x.com", "longenough1"))
            .await
            .unwrap_err();

        assert!(matches!(&wrong_password, SocialError::Unauthorized(m) if m == INVALID_CREDENTIALS));
        assert!(matches!(&unknown_email, SocialError::Unauthorized(m) if m == INVALID_CREDENTIALS));
    }

    #[tokio::test]
    async fn test_create_token_invalid_input_is_bad_request() {
        let (store, _) = store_with_bob().await;

        let result = create_token(&store, &authenticator(), &login("bob", "longenough1")).await;
        assert!(matches!(result, Err(SocialError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_token_store_failure_is_database_error() {
        let (store, _) = store_with_bob().await;
        store.fail_operation("get_user_by_email").await;

        let result = create_token(&store, &authenticator(), &login("bob@x.com", "longenough1")).await;
        assert!(matches!(result, Err(SocialError::Database(_))));
    }
}
