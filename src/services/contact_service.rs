use std::sync::Arc;

use tracing::debug;

use crate::database::models::contact::CONTACT_FIELDS;
use crate::database::models::{ContactChanges, ContactDraft, ContactResource};
use crate::database::{OwnerRef, Store};
use crate::error::ApiError;
use crate::search::{ContactSearch, Page};
use crate::validation::{Mode, Payload};

pub struct ContactService {
    store: Arc<dyn Store>,
}

impl ContactService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, owner: OwnerRef, payload: &Payload) -> Result<ContactResource, ApiError> {
        payload.validate(CONTACT_FIELDS, Mode::Create)?;
        let contact = self
            .store
            .insert_contact(owner, ContactDraft::from_payload(payload))
            .await?;
        debug!("User {} created contact {}", owner.user_id(), contact.id);
        Ok(ContactResource::from(&contact))
    }

    pub async fn get(&self, owner: OwnerRef, id: i64) -> Result<ContactResource, ApiError> {
        let contact = self
            .store
            .find_contact(owner, id)
            .await?
            .ok_or_else(ApiError::contact_not_found)?;
        Ok(ContactResource::from(&contact))
    }

    /// The contact is resolved before the payload is validated.
    pub async fn update(&self, owner: OwnerRef, id: i64, payload: &Payload) -> Result<ContactResource, ApiError> {
        if self.store.find_contact(owner, id).await?.is_none() {
            return Err(ApiError::contact_not_found());
        }
        payload.validate(CONTACT_FIELDS, Mode::Update)?;

        let contact = self
            .store
            .update_contact(owner, id, ContactChanges::from_payload(payload))
            .await?
            .ok_or_else(ApiError::contact_not_found)?;
        debug!("User {} updated contact {}", owner.user_id(), contact.id);
        Ok(ContactResource::from(&contact))
    }

    pub async fn delete(&self, owner: OwnerRef, id: i64) -> Result<bool, ApiError> {
        if !self.store.delete_contact(owner, id).await? {
            return Err(ApiError::contact_not_found());
        }
        debug!("User {} deleted contact {}", owner.user_id(), id);
        Ok(true)
    }

    pub async fn search(&self, owner: OwnerRef, search: &ContactSearch) -> Result<Page<ContactResource>, ApiError> {
        let page = self.store.search_contacts(owner, search).await?;
        Ok(page.map(|contact| ContactResource::from(&contact)))
    }
}
