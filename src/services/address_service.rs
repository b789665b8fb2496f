use std::sync::Arc;

use tracing::debug;

use crate::database::models::address::ADDRESS_FIELDS;
use crate::database::models::{AddressChanges, AddressDraft, AddressResource};
use crate::database::{OwnerRef, Store};
use crate::error::ApiError;
use crate::validation::{Mode, Payload};

/// Address operations nested under a contact.
///
/// The parent contact is resolved in the caller's scope first, so a missing
/// or foreign contact reports "Contact Not Found" before the address is looked
/// up or the payload is validated.
pub struct AddressService {
    store: Arc<dyn Store>,
}

impl AddressService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn require_contact(&self, owner: OwnerRef, contact_id: i64) -> Result<(), ApiError> {
        match self.store.find_contact(owner, contact_id).await? {
            Some(_) => Ok(()),
            None => Err(ApiError::contact_not_found()),
        }
    }

    pub async fn create(&self, owner: OwnerRef, contact_id: i64, payload: &Payload) -> Result<AddressResource, ApiError> {
        self.require_contact(owner, contact_id).await?;
        payload.validate(ADDRESS_FIELDS, Mode::Create)?;

        let address = self
            .store
            .insert_address(owner, contact_id, AddressDraft::from_payload(payload))
            .await?
            .ok_or_else(ApiError::contact_not_found)?;
        debug!("User {} added address {} to contact {}", owner.user_id(), address.id, contact_id);
        Ok(AddressResource::from(&address))
    }

    pub async fn get(&self, owner: OwnerRef, contact_id: i64, id: i64) -> Result<AddressResource, ApiError> {
        self.require_contact(owner, contact_id).await?;
        let address = self
            .store
            .find_address(owner, contact_id, id)
            .await?
            .ok_or_else(ApiError::address_not_found)?;
        Ok(AddressResource::from(&address))
    }

    pub async fn update(
        &self,
        owner: OwnerRef,
        contact_id: i64,
        id: i64,
        payload: &Payload,
    ) -> Result<AddressResource, ApiError> {
        self.require_contact(owner, contact_id).await?;
        if self.store.find_address(owner, contact_id, id).await?.is_none() {
            return Err(ApiError::address_not_found());
        }
        payload.validate(ADDRESS_FIELDS, Mode::Update)?;

        let address = self
            .store
            .update_address(owner, contact_id, id, AddressChanges::from_payload(payload))
            .await?
            .ok_or_else(ApiError::address_not_found)?;
        Ok(AddressResource::from(&address))
    }

    pub async fn delete(&self, owner: OwnerRef, contact_id: i64, id: i64) -> Result<bool, ApiError> {
        self.require_contact(owner, contact_id).await?;
        if !self.store.delete_address(owner, contact_id, id).await? {
            return Err(ApiError::address_not_found());
        }
        debug!("User {} deleted address {}", owner.user_id(), id);
        Ok(true)
    }

    pub async fn list(&self, owner: OwnerRef, contact_id: i64) -> Result<Vec<AddressResource>, ApiError> {
        let addresses = self
            .store
            .list_addresses(owner, contact_id)
            .await?
            .ok_or_else(ApiError::contact_not_found)?;
        Ok(addresses.iter().map(AddressResource::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::ContactDraft;
    use crate::database::MemoryStore;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        Payload::from_value(value).unwrap()
    }

    async fn with_contact() -> (AddressService, i64) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let contact = store
            .insert_contact(
                OwnerRef::new(1),
                ContactDraft {
                    first_name: "Eko".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        (AddressService::new(store), contact.id)
    }

    #[tokio::test]
    async fn missing_parent_is_reported_before_validation() {
        let (service, contact_id) = with_contact().await;
        let err = service
            .create(OwnerRef::new(1), contact_id + 1, &payload(json!({})))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::contact_not_found());

        let err = service
            .create(OwnerRef::new(1), contact_id, &payload(json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "The country field is required.");
    }

    #[tokio::test]
    async fn update_resolves_address_before_validation() {
        let (service, contact_id) = with_contact().await;
        let err = service
            .update(OwnerRef::new(1), contact_id, 99, &payload(json!({"country": ""})))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::address_not_found());
    }

    #[tokio::test]
    async fn crud_round() {
        let (service, contact_id) = with_contact().await;
        let owner = OwnerRef::new(1);
        let created = service
            .create(owner, contact_id, &payload(json!({"street": "Jalan", "country": "Indonesia", "postal_code": "11111"})))
            .await
            .unwrap();
        assert_eq!(created.country, "Indonesia");

        let updated = service
            .update(owner, contact_id, created.id, &payload(json!({"street": null, "city": "Jakarta"})))
            .await
            .unwrap();
        assert_eq!(updated.street, None);
        assert_eq!(updated.city.as_deref(), Some("Jakarta"));
        assert_eq!(updated.country, "Indonesia");

        assert_eq!(service.list(owner, contact_id).await.unwrap().len(), 1);
        assert!(service.delete(owner, contact_id, created.id).await.unwrap());
        assert_eq!(
            service.get(owner, contact_id, created.id).await.unwrap_err(),
            ApiError::address_not_found()
        );
    }

    #[tokio::test]
    async fn foreign_owner_sees_contact_not_found() {
        let (service, contact_id) = with_contact().await;
        let err = service.list(OwnerRef::new(2), contact_id).await.unwrap_err();
        assert_eq!(err, ApiError::contact_not_found());
    }
}
