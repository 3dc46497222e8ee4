use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_password, validate_url};

// --- Profile defaults applied at signup when the client omits them ---

pub const DEFAULT_NAME: &str = "Jacques-Yves Cousteau";
pub const DEFAULT_ABOUT: &str = "Explorer";
pub const DEFAULT_AVATAR: &str =
    "https://pictures.s3.yandex.net/resources/jacques-cousteau_1604399756.png";

/// ObjectId
///
/// A 24-character lowercase hex identifier: a 4-byte big-endian creation timestamp
/// followed by 8 random bytes. Serialized as a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("identifier must be 24 hexadecimal characters")]
pub struct InvalidObjectId;

impl ObjectId {
    pub fn new() -> Self {
        let seconds = Utc::now().timestamp() as u32;
        let random = Uuid::new_v4();
        let tail: String = random
            .as_bytes()
            .iter()
            .take(8)
            .map(|byte| format!("{byte:02x}"))
            .collect();
        ObjectId(format!("{seconds:08x}{tail}"))
    }

    /// Accepts exactly 24 ASCII hex digits, normalizing to lowercase.
    pub fn parse(raw: &str) -> Result<Self, InvalidObjectId> {
        if raw.len() == 24 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(ObjectId(raw.to_ascii_lowercase()))
        } else {
            Err(InvalidObjectId)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = InvalidObjectId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ObjectId::parse(&value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

// --- Users ---

/// User
///
/// The public projection of a user record. There is deliberately no password field:
/// a `User` can be serialized anywhere without leaking the hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub about: String,
    pub avatar: String,
    pub email: String,
}

/// A user together with the stored bcrypt hash. Only produced for the signin check.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Everything needed to insert a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub about: String,
    pub avatar: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial update of profile fields; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub about: Option<String>,
    pub avatar: Option<String>,
}

// --- Cards ---

/// Card
///
/// An image post. `likes` holds each liking user once, in the order the likes arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Card {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub link: String,
    pub owner: ObjectId,
    pub likes: Vec<ObjectId>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCard {
    pub name: String,
    pub link: String,
    pub owner: ObjectId,
}

// --- Request bodies ---

/// SignupRequest
///
/// Body of `POST /signup`. Profile fields are optional and fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[validate(length(min = 2, max = 30, message = "must be between 2 and 30 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 30, message = "must be between 2 and 30 characters"))]
    pub about: Option<String>,
    #[validate(custom(function = "validate_url"))]
    pub avatar: Option<String>,
}

/// Body of `POST /signin`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SigninRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 30, message = "must be between 2 and 30 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 30, message = "must be between 2 and 30 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateAvatarRequest {
    #[validate(custom(function = "validate_url"))]
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateCardRequest {
    #[validate(length(min = 2, max = 30, message = "must be between 2 and 30 characters"))]
    pub name: String,
    #[validate(custom(function = "validate_url"))]
    pub link: String,
}

// --- Response bodies ---

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SigninResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
