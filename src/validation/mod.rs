//! Declarative payload validation.
//!
//! Each resource declares an ordered list of [`FieldRules`]. Validation walks
//! the fields in that order and stops at the first violated rule, reporting a
//! single human-readable message such as `The first name field is required.`

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde_json::{Map, Value};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Present, non-null and not blank.
    Required,
    /// A JSON string when a value is supplied.
    String,
    /// At most this many characters.
    Max(usize),
    /// Loose email shape: `local@domain`.
    Email,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub name: &'static str,
    pub rules: &'static [Rule],
}

impl FieldRules {
    pub const fn new(name: &'static str, rules: &'static [Rule]) -> Self {
        Self { name, rules }
    }
}

/// Create checks every declared field; update skips `Required` for keys the
/// client left out so that absent fields keep their stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// A single field as supplied by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Absent,
    /// `null`, `""` or whitespace only.
    Null,
    /// Strings are stored trimmed.
    Text(String),
}

impl Field {
    fn of(value: Option<&Value>) -> Self {
        match value {
            None => Field::Absent,
            Some(Value::Null) => Field::Null,
            Some(Value::String(s)) if s.trim().is_empty() => Field::Null,
            Some(Value::String(s)) => Field::Text(s.trim().to_string()),
            Some(other) => Field::Text(other.to_string()),
        }
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            Field::Text(s) => Some(s),
            Field::Absent | Field::Null => None,
        }
    }

    /// `None` keeps the stored value, `Some(None)` clears it.
    pub fn into_patch(self) -> Option<Option<String>> {
        match self {
            Field::Absent => None,
            Field::Null => Some(None),
            Field::Text(s) => Some(Some(s)),
        }
    }
}

/// JSON object body of a write request.
#[derive(Debug, Clone, Default)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ApiError::bad_request("The request body must be a JSON object.")),
        }
    }

    pub fn validate(&self, fields: &[FieldRules], mode: Mode) -> Result<(), ApiError> {
        for field in fields {
            let value = self.0.get(field.name);
            if let Some(message) = check_field(field, value, mode) {
                tracing::debug!("Validation failed on '{}': {}", field.name, message);
                return Err(ApiError::validation_error(message));
            }
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Field {
        Field::of(self.0.get(name))
    }
}

#[async_trait]
impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Payload::from_value(value)
    }
}

/// `first_name` -> `first name`
pub fn label(name: &str) -> String {
    name.replace('_', " ").to_lowercase()
}

fn check_field(field: &FieldRules, value: Option<&Value>, mode: Mode) -> Option<String> {
    let label = label(field.name);
    let present = Field::of(value);

    for rule in field.rules {
        match rule {
            Rule::Required => {
                let skip = mode == Mode::Update && present == Field::Absent;
                if !skip && !matches!(present, Field::Text(_)) {
                    return Some(format!("The {} field is required.", label));
                }
            }
            Rule::String => {
                if let Some(v) = value {
                    if !v.is_null() && !v.is_string() {
                        return Some(format!("The {} field must be a string.", label));
                    }
                }
            }
            Rule::Max(max) => {
                if let Some(Value::String(s)) = value {
                    if s.chars().count() > *max {
                        return Some(format!(
                            "The {} field must not be greater than {} characters.",
                            label, max
                        ));
                    }
                }
            }
            Rule::Email => {
                if let Field::Text(ref s) = present {
                    if !is_email(s) {
                        return Some(format!("The {} field must be a valid email address.", label));
                    }
                }
            }
        }
    }
    None
}

/// Accepts `user@gmail` as well as `user@gmail.com`; rejects whitespace,
/// missing parts and more than one `@`.
pub fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !domain.starts_with('.') && !domain.ends_with('.')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELDS: &[FieldRules] = &[
        FieldRules::new("first_name", &[Rule::Required, Rule::String, Rule::Max(5)]),
        FieldRules::new("email", &[Rule::String, Rule::Max(200), Rule::Email]),
        FieldRules::new("country", &[Rule::Required, Rule::String]),
    ];

    fn payload(value: Value) -> Payload {
        Payload::from_value(value).unwrap()
    }

    fn first_error(value: Value, mode: Mode) -> Option<String> {
        payload(value)
            .validate(FIELDS, mode)
            .err()
            .map(|e| e.message().to_string())
    }

    #[test]
    fn reports_only_first_failure_in_declared_order() {
        let msg = first_error(json!({ "email": "nope" }), Mode::Create);
        assert_eq!(msg.as_deref(), Some("The first name field is required."));
    }

    #[test]
    fn empty_and_blank_strings_count_as_missing() {
        assert_eq!(
            first_error(json!({ "first_name": "" }), Mode::Create).as_deref(),
            Some("The first name field is required.")
        );
        assert_eq!(
            first_error(json!({ "first_name": "   " }), Mode::Create).as_deref(),
            Some("The first name field is required.")
        );
        assert_eq!(
            first_error(json!({ "first_name": null }), Mode::Create).as_deref(),
            Some("The first name field is required.")
        );
    }

    #[test]
    fn later_fields_checked_after_earlier_pass() {
        assert_eq!(
            first_error(json!({ "first_name": "ok", "email": "a b@c" }), Mode::Create).as_deref(),
            Some("The email field must be a valid email address.")
        );
        assert_eq!(
            first_error(json!({ "first_name": "ok", "email": "a@c" }), Mode::Create).as_deref(),
            Some("The country field is required.")
        );
    }

    #[test]
    fn max_and_type_messages() {
        assert_eq!(
            first_error(json!({ "first_name": "toolong" }), Mode::Create).as_deref(),
            Some("The first name field must not be greater than 5 characters.")
        );
        assert_eq!(
            first_error(json!({ "first_name": 12 }), Mode::Create).as_deref(),
            Some("The first name field must be a string.")
        );
    }

    #[test]
    fn update_mode_only_requires_present_keys() {
        assert_eq!(first_error(json!({}), Mode::Update), None);
        assert_eq!(
            first_error(json!({ "country": "" }), Mode::Update).as_deref(),
            Some("The country field is required.")
        );
    }

    #[test]
    fn optional_fields_may_be_null() {
        assert_eq!(
            first_error(json!({ "first_name": "ok", "email": null, "country": "id" }), Mode::Create),
            None
        );
    }

    #[test]
    fn field_patch_semantics() {
        let p = payload(json!({ "a": "x", "b": "", "c": null }));
        assert_eq!(p.field("a").into_patch(), Some(Some("x".to_string())));
        assert_eq!(p.field("b").into_patch(), Some(None));
        assert_eq!(p.field("c").into_patch(), Some(None));
        assert_eq!(p.field("d").into_patch(), None);
    }

    #[test]
    fn text_is_trimmed() {
        let p = payload(json!({ "first_name": "  Eko  " }));
        assert_eq!(p.field("first_name"), Field::Text("Eko".to_string()));
    }

    #[test]
    fn email_shape() {
        assert!(is_email("muhammadisa226@gmail"));
        assert!(is_email("test@gmail.com"));
        assert!(!is_email("test"));
        assert!(!is_email("@gmail.com"));
        assert!(!is_email("a@b@c"));
        assert!(!is_email("a@.com"));
    }

    #[test]
    fn non_object_body_rejected() {
        let err = Payload::from_value(json!([1, 2])).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn labels_use_spaces() {
        assert_eq!(label("postal_code"), "postal code");
        assert_eq!(label("username"), "username");
    }
}
