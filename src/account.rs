//! Account flows that tie the user API to the session store
//!
//! Login and registration store the issued token and user; profile calls
//! merge what the server returns into the stored user.

use serde_json::Value;
use thiserror::Error;

use crate::api::models::{
    LoginRequest, LoginResponse, PublicProfile, RefreshRequest, RegisterRequest, UpdateProfileRequest,
    UserInfo,
};
use crate::api::UserApi;
use crate::http::ApiError;
use crate::storage::StorageError;
use crate::store::SharedSession;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Backend answered with `success: false`
    #[error("{0}")]
    Rejected(String),

    #[error("failed to persist session: {0}")]
    Storage(#[from] StorageError),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("nothing to update")]
    EmptyUpdate,
}

impl AccountError {
    pub fn user_message(&self) -> String {
        match self {
            AccountError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Account {
    api: UserApi,
    session: SharedSession,
}

impl Account {
    pub fn new(api: UserApi, session: SharedSession) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    fn store_login(&self, login: &LoginResponse) -> Result<(), AccountError> {
        let user = serde_json::to_value(&login.user).unwrap_or(Value::Null);
        self.session.set_auth(login.token.clone(), user)?;
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AccountError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let login = self
            .api
            .login(&request)
            .await?
            .into_result("login failed")
            .map_err(AccountError::Rejected)?;

        self.store_login(&login)?;
        tracing::info!("Logged in as {}", login.user.username);
        Ok(login)
    }

    /// Register and log in with the issued token
    pub async fn register(&self, request: &RegisterRequest) -> Result<LoginResponse, AccountError> {
        let login = self
            .api
            .register(request)
            .await?
            .into_result("registration failed")
            .map_err(AccountError::Rejected)?;

        self.store_login(&login)?;
        tracing::info!("Registered {}", login.user.username);
        Ok(login)
    }

    /// Exchange the current token for a fresh one, keeping the stored user
    pub async fn refresh(&self) -> Result<String, AccountError> {
        let token = self.session.bearer_token().ok_or(AccountError::NotLoggedIn)?;
        let refreshed = self
            .api
            .refresh_token(&RefreshRequest { token })
            .await?
            .into_result("token refresh failed")
            .map_err(AccountError::Rejected)?;

        let user = self.session.current_user().unwrap_or(Value::Null);
        self.session.set_auth(refreshed.token.clone(), user)?;
        Ok(refreshed.token)
    }

    /// Fetch the profile and merge it into the stored user
    pub async fn sync_profile(&self) -> Result<UserInfo, AccountError> {
        if !self.session.is_authenticated() {
            return Err(AccountError::NotLoggedIn);
        }
        let profile = self
            .api
            .profile()
            .await?
            .into_result("failed to load profile")
            .map_err(AccountError::Rejected)?;

        if let Ok(patch) = serde_json::to_value(&profile) {
            self.session.update_user(patch)?;
        }
        Ok(profile)
    }

    /// Send the changed fields and merge them into the stored user
    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<Value, AccountError> {
        if request.is_empty() {
            return Err(AccountError::EmptyUpdate);
        }
        if !self.session.is_authenticated() {
            return Err(AccountError::NotLoggedIn);
        }

        let updated = self
            .api
            .update_profile(request)
            .await?
            .into_result("failed to update profile")
            .map_err(AccountError::Rejected)?;

        // Prefer the server's view of the user; fall back to what was sent
        let patch = match &updated {
            Value::Object(_) => updated.clone(),
            _ => serde_json::to_value(request).unwrap_or(Value::Null),
        };
        if patch.is_object() {
            self.session.update_user(patch)?;
        }
        Ok(updated)
    }

    /// Public profile of any user
    pub async fn public_profile(&self, id: u64) -> Result<PublicProfile, AccountError> {
        self.api
            .user_profile(id)
            .await?
            .into_result("failed to load user")
            .map_err(AccountError::Rejected)
    }

    pub fn logout(&self) -> Result<(), AccountError> {
        self.api.logout()?;
        tracing::info!("Logged out");
        Ok(())
    }
}
