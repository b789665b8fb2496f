//! Contact search and pagination.
//!
//! A [`ContactSearch`] carries the optional filters and the requested window.
//! The Postgres store renders it to SQL through [`ContactSearch::to_filter`];
//! the memory store evaluates [`ContactSearch::matches`] directly. Both order
//! by id ascending and count matches before windowing.

use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::database::models::Contact;
use crate::database::OwnerRef;
use crate::filter::{contains_pattern, Condition, Filter, FilterError};

pub const CONTACT_COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "first_name",
    "last_name",
    "email",
    "phone",
    "created_at",
    "updated_at",
];

/// Raw query string of `GET /api/contacts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// Unparseable or non-positive values fall back to the defaults; `size`
    /// is capped at the configured maximum.
    pub fn from_params(page: Option<&str>, size: Option<&str>, config: &PaginationConfig) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let size = size
            .and_then(|s| s.trim().parse::<u32>().ok())
            .filter(|s| *s >= 1)
            .unwrap_or(config.default_size)
            .min(config.max_size);
        Self { page, size }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSearch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub page: PageRequest,
}

impl ContactSearch {
    pub fn from_query(query: &SearchQuery, config: &PaginationConfig) -> Self {
        Self {
            name: non_blank(query.name.as_deref()),
            email: non_blank(query.email.as_deref()),
            phone: non_blank(query.phone.as_deref()),
            page: PageRequest::from_params(query.page.as_deref(), query.size.as_deref(), config),
        }
    }

    /// In-process evaluation of the same predicate `to_filter` renders.
    pub fn matches(&self, owner: OwnerRef, contact: &Contact) -> bool {
        if contact.user_id != owner.user_id() {
            return false;
        }
        if let Some(name) = &self.name {
            let first = contains_ci(Some(&contact.first_name), name);
            let last = contains_ci(contact.last_name.as_deref(), name);
            if !first && !last {
                return false;
            }
        }
        if let Some(email) = &self.email {
            if !contains_ci(contact.email.as_deref(), email) {
                return false;
            }
        }
        if let Some(phone) = &self.phone {
            if !contact.phone.as_deref().is_some_and(|p| p.contains(phone.as_str())) {
                return false;
            }
        }
        true
    }

    pub fn to_filter(&self, owner: OwnerRef) -> Result<Filter, FilterError> {
        let mut filter = Filter::new("contacts")?;
        filter.select(CONTACT_COLUMNS)?;
        filter.where_condition(Condition::eq("user_id", owner.user_id()));
        if let Some(name) = &self.name {
            let pattern = contains_pattern(name);
            filter.where_condition(Condition::Or(vec![
                Condition::ilike("first_name", pattern.clone()),
                Condition::ilike("last_name", pattern),
            ]));
        }
        if let Some(email) = &self.email {
            filter.where_condition(Condition::ilike("email", contains_pattern(email)));
        }
        if let Some(phone) = &self.phone {
            filter.where_condition(Condition::like("phone", contains_pattern(phone)));
        }
        filter.order("id asc")?;
        filter.limit(i64::from(self.page.size), Some(self.page.offset() as i64))?;
        Ok(filter)
    }

    /// Query string for another page of the same search, used for links.
    pub fn query_string(&self, page: u32) -> String {
        let mut parts = Vec::new();
        if let Some(name) = &self.name {
            parts.push(format!("name={}", urlencoding::encode(name)));
        }
        if let Some(email) = &self.email {
            parts.push(format!("email={}", urlencoding::encode(email)));
        }
        if let Some(phone) = &self.phone {
            parts.push(format!("phone={}", urlencoding::encode(phone)));
        }
        parts.push(format!("size={}", self.page.size));
        parts.push(format!("page={}", page));
        parts.join("&")
    }
}

/// One window of a search result plus the pre-window match count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }

    pub fn last_page(&self) -> u32 {
        let size = u64::from(self.request.size.max(1));
        let pages = self.total.div_ceil(size).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn meta(&self) -> PageMeta {
        let offset = self.request.offset();
        let count = self.items.len() as u64;
        PageMeta {
            current_page: self.request.page,
            from: (count > 0).then_some(offset + 1),
            last_page: self.last_page(),
            per_page: self.request.size,
            to: (count > 0).then_some(offset + count),
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageMeta {
    pub current_page: u32,
    pub from: Option<u64>,
    pub last_page: u32,
    pub per_page: u32,
    pub to: Option<u64>,
    pub total: u64,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}
