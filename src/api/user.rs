//! Account API (v2): registration, login, token refresh and profiles

use serde_json::Value;

use crate::http::{ApiClient, ApiError, ApiVersion};
use crate::storage::StorageError;

use super::envelope::Envelope;
use super::models::{
    LoginRequest, LoginResponse, PublicProfile, RefreshRequest, RefreshResponse, RegisterRequest,
    UpdateProfileRequest, UserInfo,
};

#[derive(Clone)]
pub struct UserApi {
    client: ApiClient,
}

impl UserApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `POST /auth/register`
    pub async fn register(&self, request: &RegisterRequest) -> Result<Envelope<LoginResponse>, ApiError> {
        self.client
            .post(ApiVersion::V2, &["auth", "register"], request)
            .await
    }

    /// `POST /auth/login`
    pub async fn login(&self, request: &LoginRequest) -> Result<Envelope<LoginResponse>, ApiError> {
        self.client
            .post(ApiVersion::V2, &["auth", "login"], request)
            .await
    }

    /// `POST /auth/refresh`
    pub async fn refresh_token(&self, request: &RefreshRequest) -> Result<Envelope<RefreshResponse>, ApiError> {
        self.client
            .post(ApiVersion::V2, &["auth", "refresh"], request)
            .await
    }

    /// `GET /users/profile` (requires a token)
    pub async fn profile(&self) -> Result<Envelope<UserInfo>, ApiError> {
        self.client
            .get(ApiVersion::V2, &["users", "profile"], &())
            .await
    }

    /// `PUT /users/profile` (requires a token)
    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<Envelope<Value>, ApiError> {
        self.client
            .put(ApiVersion::V2, &["users", "profile"], request)
            .await
    }

    /// `GET /users/:id` - public profile of any user
    pub async fn user_profile(&self, id: u64) -> Result<Envelope<PublicProfile>, ApiError> {
        let id = id.to_string();
        self.client.get(ApiVersion::V2, &["users", &id], &()).await
    }

    /// Forget the local session; the backend keeps no logout state
    pub fn logout(&self) -> Result<(), StorageError> {
        self.client.session().clear_auth()
    }
}
