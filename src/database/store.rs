use async_trait::async_trait;

use super::manager::DatabaseError;
use super::models::{
    Address, AddressChanges, AddressDraft, Contact, ContactChanges, ContactDraft, NewUser, User, UserChanges,
};
use crate::search::{ContactSearch, Page};

/// The account on whose behalf a contact or address operation runs.
///
/// Every contact and address method takes one explicitly; rows owned by
/// anyone else are invisible and behave exactly like missing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerRef(i64);

impl OwnerRef {
    pub fn new(user_id: i64) -> Self {
        Self(user_id)
    }

    pub fn user_id(&self) -> i64 {
        self.0
    }
}

impl From<&User> for OwnerRef {
    fn from(user: &User) -> Self {
        Self(user.id)
    }
}

/// Persistence seam for accounts, contacts and addresses.
///
/// `Option`/`bool` results distinguish "no row in scope" from store failures;
/// the services turn the former into the entity's `NotFound` error.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    // Credential store

    /// Fails with `UniqueViolation("username")` when the name is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;
    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, DatabaseError>;
    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, DatabaseError>;
    async fn set_user_token(&self, id: i64, token: Option<&str>) -> Result<bool, DatabaseError>;

    // Contacts

    async fn insert_contact(&self, owner: OwnerRef, draft: ContactDraft) -> Result<Contact, DatabaseError>;
    async fn find_contact(&self, owner: OwnerRef, id: i64) -> Result<Option<Contact>, DatabaseError>;
    async fn update_contact(
        &self,
        owner: OwnerRef,
        id: i64,
        changes: ContactChanges,
    ) -> Result<Option<Contact>, DatabaseError>;
    /// Removes the contact together with its addresses.
    async fn delete_contact(&self, owner: OwnerRef, id: i64) -> Result<bool, DatabaseError>;
    async fn search_contacts(&self, owner: OwnerRef, search: &ContactSearch) -> Result<Page<Contact>, DatabaseError>;

    // Addresses

    /// `None` when the parent contact is not in scope.
    async fn insert_address(
        &self,
        owner: OwnerRef,
        contact_id: i64,
        draft: AddressDraft,
    ) -> Result<Option<Address>, DatabaseError>;
    async fn find_address(&self, owner: OwnerRef, contact_id: i64, id: i64) -> Result<Option<Address>, DatabaseError>;
    async fn update_address(
        &self,
        owner: OwnerRef,
        contact_id: i64,
        id: i64,
        changes: AddressChanges,
    ) -> Result<Option<Address>, DatabaseError>;
    async fn delete_address(&self, owner: OwnerRef, contact_id: i64, id: i64) -> Result<bool, DatabaseError>;
    /// `None` when the parent contact is not in scope.
    async fn list_addresses(&self, owner: OwnerRef, contact_id: i64) -> Result<Option<Vec<Address>>, DatabaseError>;
}
