//! Store statements against a live Postgres.
//!
//! Ignored by default. Run with `DATABASE_URL` pointing at a scratch
//! database and `cargo test --test 50_postgres -- --ignored`.

use anyhow::{Context, Result};

use contact_api::config::AppConfig;
use contact_api::database::models::{AddressChanges, AddressDraft, ContactDraft, NewUser, User};
use contact_api::database::{DatabaseManager, OwnerRef, PgStore, Store};

async fn pg_store() -> Result<Option<PgStore>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return Ok(None);
    };
    let mut config = AppConfig::development().database;
    config.url = Some(url);
    let pool = DatabaseManager::connect(&config).await?;
    DatabaseManager::migrate(&pool).await?;
    Ok(Some(PgStore::new(pool)))
}

async fn user(store: &PgStore) -> Result<User> {
    let username = format!("pg-{}", uuid::Uuid::new_v4());
    Ok(store
        .insert_user(NewUser { username: username.clone(), password_hash: "x".into(), name: username })
        .await?)
}

fn contact_draft() -> ContactDraft {
    ContactDraft { first_name: "test".into(), last_name: None, email: None, phone: None }
}

fn address_draft() -> AddressDraft {
    AddressDraft {
        street: Some("test".into()),
        city: Some("test".into()),
        province: None,
        country: "test".into(),
        postal_code: Some("111111".into()),
    }
}

#[tokio::test]
#[ignore]
async fn address_statements_follow_the_owner() -> Result<()> {
    let Some(store) = pg_store().await? else { return Ok(()) };
    let owner = OwnerRef::from(&user(&store).await?);
    let stranger = OwnerRef::from(&user(&store).await?);
    let contact = store.insert_contact(owner, contact_draft()).await?;

    assert!(store.insert_address(stranger, contact.id, address_draft()).await?.is_none());
    let address = store
        .insert_address(owner, contact.id, address_draft())
        .await?
        .context("owner insert returned no row")?;
    assert_eq!(address.contact_id, contact.id);

    assert!(store.find_address(stranger, contact.id, address.id).await?.is_none());
    assert!(store.find_address(owner, contact.id, address.id).await?.is_some());

    let changes = AddressChanges { city: Some(None), country: Some("id".into()), ..Default::default() };
    assert!(store.update_address(stranger, contact.id, address.id, changes.clone()).await?.is_none());
    let updated = store
        .update_address(owner, contact.id, address.id, changes)
        .await?
        .context("owner update returned no row")?;
    assert_eq!(updated.city, None);
    assert_eq!(updated.country, "id");
    assert_eq!(updated.street.as_deref(), Some("test"));

    assert!(!store.delete_address(stranger, contact.id, address.id).await?);
    assert!(store.delete_address(owner, contact.id, address.id).await?);
    assert!(!store.delete_address(owner, contact.id, address.id).await?);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn deleting_contact_cascades_to_addresses() -> Result<()> {
    let Some(store) = pg_store().await? else { return Ok(()) };
    let owner = OwnerRef::from(&user(&store).await?);
    let contact = store.insert_contact(owner, contact_draft()).await?;
    store.insert_address(owner, contact.id, address_draft()).await?;
    store.insert_address(owner, contact.id, address_draft()).await?;

    let listed = store.list_addresses(owner, contact.id).await?.context("contact missing")?;
    assert_eq!(listed.len(), 2);

    assert!(store.delete_contact(owner, contact.id).await?);
    assert!(store.list_addresses(owner, contact.id).await?.is_none());
    assert!(store.insert_address(owner, contact.id, address_draft()).await?.is_none());
    Ok(())
}
