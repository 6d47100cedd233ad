//! GreenLoop users client
//!
//! Profile, avatar, password, settings and sustainability metrics of the
//! logged-in user, plus public profile lookups.

use greenloop_auth::{UserId, UserResponse};
use greenloop_fetch::{ApiClient, CancellationToken, Result, UploadFile};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Multipart field the backend reads the avatar from
pub const AVATAR_FIELD: &str = "avatar";

/// Partial profile update; only the fields that are set are sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Account settings; unset fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub two_factor_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_alerts_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_profile: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarUpload {
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SustainabilityMetrics {
    pub total_items_shared: u64,
    /// Kilograms of CO2 equivalent
    pub carbon_footprint_saved: f64,
    pub sustainability_score: f64,
    #[serde(default)]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UsersApi {
    client: ApiClient,
}

impl UsersApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `GET /api/user/profile`
    pub async fn get_current_user(&self, cancel: &CancellationToken) -> Result<UserResponse> {
        self.client.get("/api/user/profile").cancel_on(cancel).execute().await
    }

    /// `PUT /api/user/profile`
    pub async fn update_profile(&self, update: &ProfileUpdate, cancel: &CancellationToken) -> Result<UserResponse> {
        self.client
            .put("/api/user/profile")
            .json(update)?
            .cancel_on(cancel)
            .execute()
            .await
    }

    pub async fn upload_avatar(&self, file: UploadFile, cancel: &CancellationToken) -> Result<AvatarUpload> {
        debug!("uploading avatar {}", file.file_name);
        self.client
            .post("/api/user/avatar")
            .multipart(AVATAR_FIELD, vec![file])
            .cancel_on(cancel)
            .execute()
            .await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.client
            .post("/api/user/change-password")
            .json(&json!({
                "currentPassword": current_password,
                "newPassword": new_password,
            }))?
            .cancel_on(cancel)
            .execute_empty()
            .await
    }

    /// Delete the logged-in account. The caller should log out afterwards.
    pub async fn delete_account(&self, cancel: &CancellationToken) -> Result<()> {
        self.client
            .delete("/api/user/account")
            .cancel_on(cancel)
            .execute_empty()
            .await
    }

    /// Public profile of any user
    pub async fn get_user_by_id(&self, id: &UserId, cancel: &CancellationToken) -> Result<UserResponse> {
        self.client
            .get(&format!("/api/users/{}", id))
            .cancel_on(cancel)
            .execute()
            .await
    }

    pub async fn update_settings(&self, settings: &UserSettings, cancel: &CancellationToken) -> Result<()> {
        self.client
            .put("/api/user/settings")
            .json(settings)?
            .cancel_on(cancel)
            .execute_empty()
            .await
    }

    pub async fn get_sustainability_metrics(&self, cancel: &CancellationToken) -> Result<SustainabilityMetrics> {
        self.client
            .get("/api/user/sustainability-metrics")
            .cancel_on(cancel)
            .execute()
            .await
    }
}
