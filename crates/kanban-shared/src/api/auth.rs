use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{FieldReader, FromJson};
use crate::models::User;
use crate::validation::{ValidationErrors, MISSING_CREDENTIALS, NON_FIELD_ERRORS};

/// Every field is optional on the wire so that a missing one is reported as
/// a field error instead of a malformed body.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeated_password: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl FromJson for RegistrationRequest {
    fn from_json(body: Value) -> Result<Self, ValidationErrors> {
        let mut fields = FieldReader::new(body)?;
        let req = Self {
            fullname: fields.optional("fullname"),
            email: fields.optional("email"),
            password: fields.optional("password"),
            repeated_password: fields.optional("repeated_password"),
        };
        fields.finish(req)
    }
}

impl FromJson for LoginRequest {
    /// A credential of the wrong type is reported like a missing one.
    fn from_json(body: Value) -> Result<Self, ValidationErrors> {
        let mut fields = FieldReader::new(body)?;
        let req = Self {
            email: fields.optional("email"),
            password: fields.optional("password"),
        };
        fields
            .finish(req)
            .map_err(|_| ValidationErrors::single(NON_FIELD_ERRORS, MISSING_CREDENTIALS))
    }
}

/// Returned by both registration and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub fullname: String,
    pub email: String,
    pub user_id: Uuid,
}

impl AuthResponse {
    pub fn new(token: String, user: &User) -> Self {
        Self {
            token,
            fullname: user.display_name(),
            email: user.email.clone(),
            user_id: user.id,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EmailCheckQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Public identity of a user, as embedded in boards and tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub fullname: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            fullname: user.full_name(),
        }
    }
}
