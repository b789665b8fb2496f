use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{
    Address, AddressChanges, AddressDraft, Contact, ContactChanges, ContactDraft, NewUser, User, UserChanges,
};
use super::query_builder::QueryBuilder;
use super::store::{OwnerRef, Store};
use crate::search::{ContactSearch, Page};

const USER_COLUMNS: &str = "id, username, password_hash, name, token, created_at, updated_at";
const CONTACT_COLUMNS: &str = "id, user_id, first_name, last_name, email, phone, created_at, updated_at";
const ADDRESS_COLUMNS: &str =
    "id, contact_id, street, city, province, country, postal_code, created_at, updated_at";

/// Store backed by the tables in `migrations/`.
///
/// Ownership is enforced in SQL: every contact statement carries
/// `user_id = $owner`, and address statements join through `contacts`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let sql = format!(
            "INSERT INTO users (username, password_hash, name) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE token = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let select = format!("SELECT {} FROM users WHERE id = $1 FOR UPDATE", USER_COLUMNS);
        let Some(mut user) = sqlx::query_as::<_, User>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        changes.apply(&mut user);
        let update = format!(
            "UPDATE users SET name = $2, password_hash = $3, updated_at = $4 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, User>(&update)
            .bind(id)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(row))
    }

    async fn set_user_token(&self, id: i64, token: Option<&str>) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE users SET token = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(token)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_contact(&self, owner: OwnerRef, draft: ContactDraft) -> Result<Contact, DatabaseError> {
        let sql = format!(
            "INSERT INTO contacts (user_id, first_name, last_name, email, phone) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            CONTACT_COLUMNS
        );
        let row = sqlx::query_as::<_, Contact>(&sql)
            .bind(owner.user_id())
            .bind(&draft.first_name)
            .bind(&draft.last_name)
            .bind(&draft.email)
            .bind(&draft.phone)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_contact(&self, owner: OwnerRef, id: i64) -> Result<Option<Contact>, DatabaseError> {
        let sql = format!("SELECT {} FROM contacts WHERE id = $1 AND user_id = $2", CONTACT_COLUMNS);
        let row = sqlx::query_as::<_, Contact>(&sql)
            .bind(id)
            .bind(owner.user_id())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_contact(
        &self,
        owner: OwnerRef,
        id: i64,
        changes: ContactChanges,
    ) -> Result<Option<Contact>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let select = format!(
            "SELECT {} FROM contacts WHERE id = $1 AND user_id = $2 FOR UPDATE",
            CONTACT_COLUMNS
        );
        let Some(mut contact) = sqlx::query_as::<_, Contact>(&select)
            .bind(id)
            .bind(owner.user_id())
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        changes.apply(&mut contact);
        let update = format!(
            "UPDATE contacts SET first_name = $3, last_name = $4, email = $5, phone = $6, updated_at = $7 \
             WHERE id = $1 AND user_id = $2 RETURNING {}",
            CONTACT_COLUMNS
        );
        let row = sqlx::query_as::<_, Contact>(&update)
            .bind(id)
            .bind(owner.user_id())
            .bind(&contact.first_name)
            .bind(&contact.last_name)
            .bind(&contact.email)
            .bind(&contact.phone)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(row))
    }

    async fn delete_contact(&self, owner: OwnerRef, id: i64) -> Result<bool, DatabaseError> {
        // addresses go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner.user_id())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn search_contacts(&self, owner: OwnerRef, search: &ContactSearch) -> Result<Page<Contact>, DatabaseError> {
        let filter = search.to_filter(owner)?;
        let builder = QueryBuilder::<Contact>::new(filter);
        let total = builder.count(&self.pool).await?;
        let items = builder.select_all(&self.pool).await?;
        debug!("Contact search for user {} matched {} rows", owner.user_id(), total);
        Ok(Page {
            items,
            total: u64::try_from(total).unwrap_or_default(),
            request: search.page,
        })
    }

    async fn insert_address(
        &self,
        owner: OwnerRef,
        contact_id: i64,
        draft: AddressDraft,
    ) -> Result<Option<Address>, DatabaseError> {
        let sql = format!(
            "INSERT INTO addresses (contact_id, street, city, province, country, postal_code) \
             SELECT c.id, $3, $4, $5, $6, $7 FROM contacts c WHERE c.id = $1 AND c.user_id = $2 \
             RETURNING {}",
            ADDRESS_COLUMNS
        );
        let row = sqlx::query_as::<_, Address>(&sql)
            .bind(contact_id)
            .bind(owner.user_id())
            .bind(&draft.street)
            .bind(&draft.city)
            .bind(&draft.province)
            .bind(&draft.country)
            .bind(&draft.postal_code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_address(&self, owner: OwnerRef, contact_id: i64, id: i64) -> Result<Option<Address>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM addresses a WHERE a.id = $1 AND a.contact_id = $2 \
             AND EXISTS (SELECT 1 FROM contacts c WHERE c.id = a.contact_id AND c.user_id = $3)",
            prefixed(ADDRESS_COLUMNS, "a")
        );
        let row = sqlx::query_as::<_, Address>(&sql)
            .bind(id)
            .bind(contact_id)
            .bind(owner.user_id())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_address(
        &self,
        owner: OwnerRef,
        contact_id: i64,
        id: i64,
        changes: AddressChanges,
    ) -> Result<Option<Address>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let select = format!(
            "SELECT {} FROM addresses a JOIN contacts c ON c.id = a.contact_id \
             WHERE a.id = $1 AND a.contact_id = $2 AND c.user_id = $3 FOR UPDATE OF a",
            prefixed(ADDRESS_COLUMNS, "a")
        );
        let Some(mut address) = sqlx::query_as::<_, Address>(&select)
            .bind(id)
            .bind(contact_id)
            .bind(owner.user_id())
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        changes.apply(&mut address);
        let update = format!(
            "UPDATE addresses SET street = $2, city = $3, province = $4, country = $5, postal_code = $6, \
             updated_at = $7 WHERE id = $1 RETURNING {}",
            ADDRESS_COLUMNS
        );
        let row = sqlx::query_as::<_, Address>(&update)
            .bind(id)
            .bind(&address.street)
            .bind(&address.city)
            .bind(&address.province)
            .bind(&address.country)
            .bind(&address.postal_code)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(row))
    }

    async fn delete_address(&self, owner: OwnerRef, contact_id: i64, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "DELETE FROM addresses a USING contacts c \
             WHERE a.id = $1 AND a.contact_id = $2 AND c.id = a.contact_id AND c.user_id = $3",
        )
        .bind(id)
        .bind(contact_id)
        .bind(owner.user_id())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_addresses(&self, owner: OwnerRef, contact_id: i64) -> Result<Option<Vec<Address>>, DatabaseError> {
        if self.find_contact(owner, contact_id).await?.is_none() {
            return Ok(None);
        }
        let sql = format!("SELECT {} FROM addresses WHERE contact_id = $1 ORDER BY id", ADDRESS_COLUMNS);
        let rows = sqlx::query_as::<_, Address>(&sql)
            .bind(contact_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(Some(rows))
    }
}

/// `"id, name"` with alias `a` -> `"a.id, a.name"`
fn prefixed(columns: &str, alias: &str) -> String {
    columns
        .split(", ")
        .map(|c| format!("{}.{}", alias, c))
        .collect::<Vec<_>>()
        .join(", ")
}
