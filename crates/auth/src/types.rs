//! User and authentication payloads

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trust score given to a freshly logged-in user the backend did not rate
pub const DEFAULT_TRUST_SCORE: f64 = 5.0;

/// User identifier.
///
/// The backend has shipped both integer and UUID ids; either form is
/// accepted and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Numeric(i64),
    Uuid(Uuid),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Numeric(id) => write!(f, "{}", id),
            UserId::Uuid(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId::Numeric(id)
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        UserId::Uuid(id)
    }
}

/// Account kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserType {
    Consumer,
    Brand,
    Recycler,
    Designer,
    Collector,
    Admin,
    /// A kind this client does not know yet
    Other(String),
}

impl UserType {
    pub fn as_str(&self) -> &str {
        match self {
            UserType::Consumer => "CONSUMER",
            UserType::Brand => "BRAND",
            UserType::Recycler => "RECYCLER",
            UserType::Designer => "DESIGNER",
            UserType::Collector => "COLLECTOR",
            UserType::Admin => "ADMIN",
            UserType::Other(other) => other,
        }
    }
}

impl From<String> for UserType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CONSUMER" => UserType::Consumer,
            "BRAND" => UserType::Brand,
            "RECYCLER" => UserType::Recycler,
            "DESIGNER" => UserType::Designer,
            "COLLECTOR" => UserType::Collector,
            "ADMIN" => UserType::Admin,
            _ => UserType::Other(value),
        }
    }
}

impl From<UserType> for String {
    fn from(value: UserType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_trust_score() -> f64 {
    DEFAULT_TRUST_SCORE
}

fn default_true() -> bool {
    true
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// The user snapshot held by a session and embedded in items and listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub user_type: UserType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub sustainability_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sustainability_points: Option<i64>,
    #[serde(default = "default_trust_score")]
    pub trust_score: f64,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub phone_verified: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub two_factor_enabled: bool,
    #[serde(default)]
    pub login_alerts_enabled: bool,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Merge a partial update into this user
    pub fn apply(&mut self, patch: UserPatch) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = patch.$field { self.$field = value; })*
            };
        }
        merge!(
            email,
            first_name,
            last_name,
            user_type,
            sustainability_score,
            trust_score,
            email_verified,
            phone_verified,
            is_verified,
            is_active,
            is_banned,
            updated_at,
            bio,
            two_factor_enabled,
            login_alerts_enabled,
        );

        macro_rules! merge_optional {
            ($($field:ident),* $(,)?) => {
                $(if patch.$field.is_some() { self.$field = patch.$field; })*
            };
        }
        merge_optional!(
            username,
            role,
            sustainability_points,
            phone,
            date_of_birth,
            gender,
            avatar_url,
        );
    }
}

/// A partial [`User`]; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sustainability_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sustainability_points: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_banned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub two_factor_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_alerts_enabled: Option<bool>,
}

impl From<&UserResponse> for UserPatch {
    fn from(profile: &UserResponse) -> Self {
        UserPatch {
            email: Some(profile.email.clone()),
            first_name: Some(profile.first_name.clone()),
            last_name: Some(profile.last_name.clone()),
            username: profile.username.clone(),
            user_type: Some(profile.user_type.clone()),
            sustainability_score: Some(profile.sustainability_score),
            email_verified: Some(profile.email_verified),
            avatar_url: profile.avatar_url.clone(),
            ..Default::default()
        }
    }
}

/// Wire name of the login identifier field.
///
/// Backend revisions disagree on it, so it is configured rather than guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    UsernameOrEmail,
    EmailOrUsername,
}

impl LoginField {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginField::UsernameOrEmail => "usernameOrEmail",
            LoginField::EmailOrUsername => "emailOrUsername",
        }
    }
}

impl FromStr for LoginField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "usernameOrEmail" => Ok(LoginField::UsernameOrEmail),
            "emailOrUsername" => Ok(LoginField::EmailOrUsername),
            other => Err(format!("unknown login field `{}`", other)),
        }
    }
}

/// Login credentials
#[derive(Clone)]
pub struct LoginRequest {
    /// Username or email address
    pub identifier: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(identifier: &str, password: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration form
#[derive(Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Successful login or token refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(alias = "accessToken")]
    pub token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub user_type: UserType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub sustainability_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sustainability_points: Option<i64>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub phone_verified: bool,
}

impl LoginResponse {
    /// Build the session user, defaulting what the login payload omits
    pub fn to_user(&self, now: DateTime<Utc>) -> User {
        let now = now.to_rfc3339();
        User {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
            user_type: self.user_type.clone(),
            role: self.role.clone(),
            sustainability_score: self.sustainability_score,
            sustainability_points: self.sustainability_points,
            trust_score: DEFAULT_TRUST_SCORE,
            email_verified: self.email_verified,
            phone_verified: self.phone_verified,
            is_verified: self.email_verified,
            is_active: true,
            is_banned: false,
            created_at: now.clone(),
            updated_at: now,
            bio: String::new(),
            phone: None,
            date_of_birth: None,
            gender: None,
            avatar_url: None,
            two_factor_enabled: false,
            login_alerts_enabled: false,
        }
    }
}

/// Public profile as returned by registration and the profile endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub user_type: UserType,
    #[serde(default)]
    pub sustainability_score: f64,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: String,
}
