use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::models::{
    Address, AddressChanges, AddressDraft, Contact, ContactChanges, ContactDraft, NewUser, User, UserChanges,
};
use super::store::{OwnerRef, Store};
use crate::search::{ContactSearch, Page};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    contacts: BTreeMap<i64, Contact>,
    addresses: BTreeMap<i64, Address>,
    last_user_id: i64,
    last_contact_id: i64,
    last_address_id: i64,
}

impl Tables {
    fn owned_contact(&self, owner: OwnerRef, id: i64) -> Option<&Contact> {
        self.contacts.get(&id).filter(|c| c.user_id == owner.user_id())
    }

    fn owned_address_id(&self, owner: OwnerRef, contact_id: i64, id: i64) -> Option<i64> {
        self.owned_contact(owner, contact_id)?;
        self.addresses
            .get(&id)
            .filter(|a| a.contact_id == contact_id)
            .map(|a| a.id)
    }
}

/// Process-local store used for development and the test suite.
///
/// Ids are assigned from per-table sequences and never reused, matching
/// BIGSERIAL columns in Postgres.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(DatabaseError::UniqueViolation("username".to_string()));
        }
        tables.last_user_id += 1;
        let now = Utc::now();
        let row = User {
            id: tables.last_user_id,
            username: user.username,
            password_hash: user.password_hash,
            name: user.name,
            token: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.token.as_deref() == Some(token))
            .cloned())
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(user);
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_user_token(&self, id: i64, token: Option<&str>) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(token) = token {
            if tables.users.values().any(|u| u.id != id && u.token.as_deref() == Some(token)) {
                return Err(DatabaseError::UniqueViolation("token".to_string()));
            }
        }
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(false);
        };
        user.token = token.map(str::to_string);
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn insert_contact(&self, owner: OwnerRef, draft: ContactDraft) -> Result<Contact, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.last_contact_id += 1;
        let now = Utc::now();
        let row = Contact {
            id: tables.last_contact_id,
            user_id: owner.user_id(),
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            phone: draft.phone,
            created_at: now,
            updated_at: now,
        };
        tables.contacts.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_contact(&self, owner: OwnerRef, id: i64) -> Result<Option<Contact>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.owned_contact(owner, id).cloned())
    }

    async fn update_contact(
        &self,
        owner: OwnerRef,
        id: i64,
        changes: ContactChanges,
    ) -> Result<Option<Contact>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(contact) = tables.contacts.get_mut(&id).filter(|c| c.user_id == owner.user_id()) else {
            return Ok(None);
        };
        changes.apply(contact);
        contact.updated_at = Utc::now();
        Ok(Some(contact.clone()))
    }

    async fn delete_contact(&self, owner: OwnerRef, id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.owned_contact(owner, id).is_none() {
            return Ok(false);
        }
        tables.contacts.remove(&id);
        tables.addresses.retain(|_, a| a.contact_id != id);
        Ok(true)
    }

    async fn search_contacts(&self, owner: OwnerRef, search: &ContactSearch) -> Result<Page<Contact>, DatabaseError> {
        let tables = self.tables.read().await;
        let matched: Vec<&Contact> = tables.contacts.values().filter(|c| search.matches(owner, c)).collect();
        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(search.page.offset() as usize)
            .take(search.page.size as usize)
            .cloned()
            .collect();
        Ok(Page {
            items,
            total,
            request: search.page,
        })
    }

    async fn insert_address(
        &self,
        owner: OwnerRef,
        contact_id: i64,
        draft: AddressDraft,
    ) -> Result<Option<Address>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.owned_contact(owner, contact_id).is_none() {
            return Ok(None);
        }
        tables.last_address_id += 1;
        let now = Utc::now();
        let row = Address {
            id: tables.last_address_id,
            contact_id,
            street: draft.street,
            city: draft.city,
            province: draft.province,
            country: draft.country,
            postal_code: draft.postal_code,
            created_at: now,
            updated_at: now,
        };
        tables.addresses.insert(row.id, row.clone());
        Ok(Some(row))
    }

    async fn find_address(&self, owner: OwnerRef, contact_id: i64, id: i64) -> Result<Option<Address>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .owned_address_id(owner, contact_id, id)
            .and_then(|id| tables.addresses.get(&id))
            .cloned())
    }

    async fn update_address(
        &self,
        owner: OwnerRef,
        contact_id: i64,
        id: i64,
        changes: AddressChanges,
    ) -> Result<Option<Address>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(id) = tables.owned_address_id(owner, contact_id, id) else {
            return Ok(None);
        };
        let Some(address) = tables.addresses.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(address);
        address.updated_at = Utc::now();
        Ok(Some(address.clone()))
    }

    async fn delete_address(&self, owner: OwnerRef, contact_id: i64, id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        match tables.owned_address_id(owner, contact_id, id) {
            Some(id) => Ok(tables.addresses.remove(&id).is_some()),
            None => Ok(false),
        }
    }

    async fn list_addresses(&self, owner: OwnerRef, contact_id: i64) -> Result<Option<Vec<Address>>, DatabaseError> {
        let tables = self.tables.read().await;
        if tables.owned_contact(owner, contact_id).is_none() {
            return Ok(None);
        }
        Ok(Some(
            tables
                .addresses
                .values()
                .filter(|a| a.contact_id == contact_id)
                .cloned()
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::search::SearchQuery;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            password_hash: "hash".to_string(),
            name: name.to_string(),
        }
    }

    fn draft(first: &str) -> ContactDraft {
        ContactDraft {
            first_name: first.to_string(),
            ..Default::default()
        }
    }

    fn address_draft(country: &str) -> AddressDraft {
        AddressDraft {
            country: country.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = MemoryStore::new();
        store.insert_user(new_user("alice")).await.unwrap();
        let err = store.insert_user(new_user("alice")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::UniqueViolation(field) if field == "username"));
    }

    #[tokio::test]
    async fn token_lookup_follows_set_and_clear() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("alice")).await.unwrap();
        assert!(store.set_user_token(user.id, Some("t1")).await.unwrap());
        assert_eq!(store.find_user_by_token("t1").await.unwrap().unwrap().id, user.id);

        assert!(store.set_user_token(user.id, None).await.unwrap());
        assert!(store.find_user_by_token("t1").await.unwrap().is_none());
        assert!(!store.set_user_token(999, None).await.unwrap());
    }

    #[tokio::test]
    async fn contacts_are_invisible_to_other_owners() {
        let store = MemoryStore::new();
        let alice = OwnerRef::new(1);
        let bob = OwnerRef::new(2);
        let contact = store.insert_contact(alice, draft("Eve")).await.unwrap();

        assert!(store.find_contact(bob, contact.id).await.unwrap().is_none());
        assert!(store
            .update_contact(bob, contact.id, ContactChanges::default())
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete_contact(bob, contact.id).await.unwrap());
        assert!(store.list_addresses(bob, contact.id).await.unwrap().is_none());
        assert!(store
            .insert_address(bob, contact.id, address_draft("ID"))
            .await
            .unwrap()
            .is_none());
        assert!(store.find_contact(alice, contact.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_keeps_absent_and_clears_null() {
        let store = MemoryStore::new();
        let owner = OwnerRef::new(1);
        let contact = store
            .insert_contact(
                owner,
                ContactDraft {
                    first_name: "Eve".into(),
                    last_name: Some("Doe".into()),
                    email: Some("eve@example.com".into()),
                    phone: None,
                },
            )
            .await
            .unwrap();

        let changes = ContactChanges {
            last_name: Some(None),
            phone: Some(Some("123".into())),
            ..Default::default()
        };
        let updated = store.update_contact(owner, contact.id, changes).await.unwrap().unwrap();
        assert_eq!(updated.first_name, "Eve");
        assert_eq!(updated.last_name, None);
        assert_eq!(updated.email.as_deref(), Some("eve@example.com"));
        assert_eq!(updated.phone.as_deref(), Some("123"));
    }

    #[tokio::test]
    async fn deleting_contact_removes_its_addresses() {
        let store = MemoryStore::new();
        let owner = OwnerRef::new(1);
        let contact = store.insert_contact(owner, draft("Eve")).await.unwrap();
        let address = store
            .insert_address(owner, contact.id, address_draft("ID"))
            .await
            .unwrap()
            .unwrap();

        assert!(store.delete_contact(owner, contact.id).await.unwrap());
        assert!(store.tables.read().await.addresses.get(&address.id).is_none());
        assert!(!store.delete_contact(owner, contact.id).await.unwrap());
    }

    #[tokio::test]
    async fn address_must_belong_to_named_contact() {
        let store = MemoryStore::new();
        let owner = OwnerRef::new(1);
        let first = store.insert_contact(owner, draft("A")).await.unwrap();
        let second = store.insert_contact(owner, draft("B")).await.unwrap();
        let address = store
            .insert_address(owner, first.id, address_draft("ID"))
            .await
            .unwrap()
            .unwrap();

        assert!(store.find_address(owner, second.id, address.id).await.unwrap().is_none());
        assert!(!store.delete_address(owner, second.id, address.id).await.unwrap());
        assert!(store.find_address(owner, first.id, address.id).await.unwrap().is_some());
        assert_eq!(store.list_addresses(owner, second.id).await.unwrap().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn search_windows_after_counting() {
        let store = MemoryStore::new();
        let owner = OwnerRef::new(1);
        for i in 0..12 {
            store.insert_contact(owner, draft(&format!("first {}", i))).await.unwrap();
        }
        store.insert_contact(OwnerRef::new(2), draft("first other")).await.unwrap();

        let query = SearchQuery {
            name: Some("first".into()),
            page: Some("2".into()),
            size: Some("5".into()),
            ..Default::default()
        };
        let search = ContactSearch::from_query(&query, &AppConfig::development().pagination);
        let page = store.search_contacts(owner, &search).await.unwrap();
        assert_eq!(page.total, 12);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items[0].first_name, "first 5");
    }
}
