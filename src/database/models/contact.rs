use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::validation::{FieldRules, Payload, Rule};

pub const CONTACT_FIELDS: &[FieldRules] = &[
    FieldRules::new("first_name", &[Rule::Required, Rule::String, Rule::Max(100)]),
    FieldRules::new("last_name", &[Rule::String, Rule::Max(100)]),
    FieldRules::new("email", &[Rule::String, Rule::Max(200), Rule::Email]),
    FieldRules::new("phone", &[Rule::String, Rule::Max(20)]),
];

#[derive(Debug, Clone, FromRow)]
pub struct Contact {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ContactDraft {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ContactDraft {
    /// Expects a payload already validated against [`CONTACT_FIELDS`].
    pub fn from_payload(payload: &Payload) -> Self {
        Self {
            first_name: payload.field("first_name").into_option().unwrap_or_default(),
            last_name: payload.field("last_name").into_option(),
            email: payload.field("email").into_option(),
            phone: payload.field("phone").into_option(),
        }
    }
}

/// Partial update. Outer `None` keeps the stored value, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ContactChanges {
    pub first_name: Option<String>,
    pub last_name: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
}

impl ContactChanges {
    pub fn from_payload(payload: &Payload) -> Self {
        Self {
            first_name: payload.field("first_name").into_option(),
            last_name: payload.field("last_name").into_patch(),
            email: payload.field("email").into_patch(),
            phone: payload.field("phone").into_patch(),
        }
    }

    pub fn apply(self, contact: &mut Contact) {
        if let Some(v) = self.first_name {
            contact.first_name = v;
        }
        if let Some(v) = self.last_name {
            contact.last_name = v;
        }
        if let Some(v) = self.email {
            contact.email = v;
        }
        if let Some(v) = self.phone {
            contact.phone = v;
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContactResource {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<&Contact> for ContactResource {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id,
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
        }
    }
}
