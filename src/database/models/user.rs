use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::validation::{FieldRules, Payload, Rule};

pub const REGISTER_FIELDS: &[FieldRules] = &[
    FieldRules::new("username", &[Rule::Required, Rule::String, Rule::Max(100)]),
    FieldRules::new("password", &[Rule::Required, Rule::String, Rule::Max(100)]),
    FieldRules::new("name", &[Rule::Required, Rule::String, Rule::Max(100)]),
];

pub const LOGIN_FIELDS: &[FieldRules] = &[
    FieldRules::new("username", &[Rule::Required, Rule::String, Rule::Max(100)]),
    FieldRules::new("password", &[Rule::Required, Rule::String, Rule::Max(100)]),
];

/// Blank or null values leave the stored field unchanged.
pub const UPDATE_FIELDS: &[FieldRules] = &[
    FieldRules::new("name", &[Rule::String, Rule::Max(100)]),
    FieldRules::new("password", &[Rule::String, Rule::Max(100)]),
];

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration data with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub name: String,
}

/// Profile update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.password_hash.is_none()
    }

    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(hash) = self.password_hash {
            user.password_hash = hash;
        }
    }
}

/// Credentials pulled from a validated login or registration payload.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn from_payload(payload: &Payload) -> Self {
        Self {
            username: payload.field("username").into_option().unwrap_or_default(),
            password: payload.field("password").into_option().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserResource {
    pub id: i64,
    pub username: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl From<&User> for UserResource {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            token: user.token.clone(),
        }
    }
}
