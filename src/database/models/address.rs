use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::validation::{FieldRules, Payload, Rule};

pub const ADDRESS_FIELDS: &[FieldRules] = &[
    FieldRules::new("street", &[Rule::String, Rule::Max(200)]),
    FieldRules::new("city", &[Rule::String, Rule::Max(100)]),
    FieldRules::new("province", &[Rule::String, Rule::Max(100)]),
    FieldRules::new("country", &[Rule::Required, Rule::String, Rule::Max(100)]),
    FieldRules::new("postal_code", &[Rule::String, Rule::Max(10)]),
];

#[derive(Debug, Clone, FromRow)]
pub struct Address {
    pub id: i64,
    pub contact_id: i64,
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: String,
    pub postal_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct AddressDraft {
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: String,
    pub postal_code: Option<String>,
}

impl AddressDraft {
    /// Expects a payload already validated against [`ADDRESS_FIELDS`].
    pub fn from_payload(payload: &Payload) -> Self {
        Self {
            street: payload.field("street").into_option(),
            city: payload.field("city").into_option(),
            province: payload.field("province").into_option(),
            country: payload.field("country").into_option().unwrap_or_default(),
            postal_code: payload.field("postal_code").into_option(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AddressChanges {
    pub street: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub province: Option<Option<String>>,
    pub country: Option<String>,
    pub postal_code: Option<Option<String>>,
}

impl AddressChanges {
    pub fn from_payload(payload: &Payload) -> Self {
        Self {
            street: payload.field("street").into_patch(),
            city: payload.field("city").into_patch(),
            province: payload.field("province").into_patch(),
            country: payload.field("country").into_option(),
            postal_code: payload.field("postal_code").into_patch(),
        }
    }

    pub fn apply(self, address: &mut Address) {
        if let Some(v) = self.street {
            address.street = v;
        }
        if let Some(v) = self.city {
            address.city = v;
        }
        if let Some(v) = self.province {
            address.province = v;
        }
        if let Some(v) = self.country {
            address.country = v;
        }
        if let Some(v) = self.postal_code {
            address.postal_code = v;
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AddressResource {
    pub id: i64,
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: String,
    pub postal_code: Option<String>,
}

impl From<&Address> for AddressResource {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id,
            street: address.street.clone(),
            city: address.city.clone(),
            province: address.province.clone(),
            country: address.country.clone(),
            postal_code: address.postal_code.clone(),
        }
    }
}
