use std::sync::Arc;

use tracing::{debug, info};

use crate::auth::{hash_password, issue_token, verify_password};
use crate::database::models::user::{Credentials, LOGIN_FIELDS, REGISTER_FIELDS, UPDATE_FIELDS};
use crate::database::models::{NewUser, User, UserChanges, UserResource};
use crate::database::Store;
use crate::error::{ApiError, USERNAME_TAKEN};
use crate::validation::{Mode, Payload};

/// Registration, login and token lifecycle for accounts.
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn register(&self, payload: &Payload) -> Result<UserResource, ApiError> {
        payload.validate(REGISTER_FIELDS, Mode::Create)?;
        let credentials = Credentials::from_payload(payload);

        if self.store.find_user_by_username(&credentials.username).await?.is_some() {
            debug!("Registration rejected, username '{}' is taken", credentials.username);
            return Err(ApiError::conflict(USERNAME_TAKEN));
        }

        let user = self
            .store
            .insert_user(NewUser {
                username: credentials.username,
                password_hash: hash_password(&credentials.password)?,
                name: payload.field("name").into_option().unwrap_or_default(),
            })
            .await?;

        info!("Registered user {} ({})", user.id, user.username);
        Ok(UserResource::from(&user))
    }

    /// Unknown usernames and wrong passwords fail identically.
    pub async fn login(&self, payload: &Payload) -> Result<UserResource, ApiError> {
        payload.validate(LOGIN_FIELDS, Mode::Create)?;
        let credentials = Credentials::from_payload(payload);

        let Some(mut user) = self.store.find_user_by_username(&credentials.username).await? else {
            debug!("Login failed, no user '{}'", credentials.username);
            return Err(ApiError::wrong_credentials());
        };
        if !verify_password(&credentials.password, &user.password_hash) {
            debug!("Login failed, wrong password for '{}'", credentials.username);
            return Err(ApiError::wrong_credentials());
        }

        let token = issue_token();
        if !self.store.set_user_token(user.id, Some(&token)).await? {
            return Err(ApiError::wrong_credentials());
        }
        user.token = Some(token);

        info!("User {} logged in", user.id);
        Ok(UserResource::from(&user))
    }

    /// Resolve the raw `Authorization` value to its account.
    pub async fn authenticate(&self, token: &str) -> Result<User, ApiError> {
        if token.is_empty() {
            return Err(ApiError::unauthorized());
        }
        self.store
            .find_user_by_token(token)
            .await?
            .ok_or_else(ApiError::unauthorized)
    }

    /// `name` and `password` are both optional; absent, null and blank values
    /// keep what is stored.
    pub async fn update(&self, user: &User, payload: &Payload) -> Result<UserResource, ApiError> {
        payload.validate(UPDATE_FIELDS, Mode::Update)?;

        let password_hash = match payload.field("password").into_option() {
            Some(password) => Some(hash_password(&password)?),
            None => None,
        };
        let changes = UserChanges {
            name: payload.field("name").into_option(),
            password_hash,
        };
        if changes.is_empty() {
            return Ok(UserResource::from(user));
        }

        let updated = self
            .store
            .update_user(user.id, changes)
            .await?
            .ok_or_else(ApiError::unauthorized)?;
        debug!("Updated user {}", updated.id);
        Ok(UserResource::from(&updated))
    }

    pub async fn logout(&self, user: &User) -> Result<bool, ApiError> {
        self.store.set_user_token(user.id, None).await?;
        info!("User {} logged out", user.id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        Payload::from_value(value).unwrap()
    }

    async fn registered() -> (UserService, User) {
        let service = UserService::new(Arc::new(MemoryStore::new()));
        service
            .register(&payload(json!({"username": "test", "password": "rahasia", "name": "Test"})))
            .await
            .unwrap();
        let resource = service
            .login(&payload(json!({"username": "test", "password": "rahasia"})))
            .await
            .unwrap();
        let user = service.authenticate(resource.token.as_deref().unwrap()).await.unwrap();
        (service, user)
    }

    #[tokio::test]
    async fn register_hides_token_and_rejects_duplicates() {
        let service = UserService::new(Arc::new(MemoryStore::new()));
        let body = payload(json!({"username": "test", "password": "rahasia", "name": "Test"}));

        let created = service.register(&body).await.unwrap();
        assert_eq!(created.username, "test");
        assert_eq!(created.token, None);

        let err = service.register(&body).await.unwrap_err();
        assert_eq!(err, ApiError::conflict(USERNAME_TAKEN));
    }

    #[tokio::test]
    async fn register_reports_first_missing_field() {
        let service = UserService::new(Arc::new(MemoryStore::new()));
        let err = service.register(&payload(json!({"name": "x"}))).await.unwrap_err();
        assert_eq!(err.message(), "The username field is required.");
    }

    #[tokio::test]
    async fn login_failures_share_one_message() {
        let (service, _) = registered().await;
        let wrong_user = service
            .login(&payload(json!({"username": "nobody", "password": "rahasia"})))
            .await
            .unwrap_err();
        let wrong_password = service
            .login(&payload(json!({"username": "test", "password": "salah"})))
            .await
            .unwrap_err();
        assert_eq!(wrong_user, ApiError::wrong_credentials());
        assert_eq!(wrong_user, wrong_password);
    }

    #[tokio::test]
    async fn update_changes_only_supplied_fields() {
        let (service, user) = registered().await;
        let updated = service
            .update(&user, &payload(json!({"password": "baru"})))
            .await
            .unwrap();
        assert_eq!(updated.name, "Test");

        let login = service
            .login(&payload(json!({"username": "test", "password": "baru"})))
            .await;
        assert!(login.is_ok());
    }

    #[tokio::test]
    async fn update_keeps_name_and_password_when_blank() {
        let (service, user) = registered().await;
        let updated = service
            .update(&user, &payload(json!({"name": "", "password": null})))
            .await
            .unwrap();
        assert_eq!(updated.name, "Test");

        let login = service
            .login(&payload(json!({"username": "test", "password": "rahasia"})))
            .await;
        assert!(login.is_ok());
    }

    #[tokio::test]
    async fn update_still_checks_length() {
        let (service, user) = registered().await;
        let err = service
            .update(&user, &payload(json!({"name": "x".repeat(101)})))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "The name field must not be greater than 100 characters.");
    }

    #[tokio::test]
    async fn logout_revokes_token() {
        let (service, user) = registered().await;
        let token = user.token.clone().unwrap();
        assert!(service.logout(&user).await.unwrap());
        assert_eq!(service.authenticate(&token).await.unwrap_err(), ApiError::unauthorized());
        assert_eq!(service.authenticate("").await.unwrap_err(), ApiError::unauthorized());
    }
}
