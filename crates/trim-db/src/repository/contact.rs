//! # Contact Repository
//!
//! Customers of a business. A phone number identifies at most one contact
//! per business, enforced by `UNIQUE (business_id, phone)`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::{new_id, parse_timestamp, timestamp};
use crate::error::{DbError, DbResult};
use trim_core::Contact;

#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: String,
    business_id: String,
    name: String,
    phone: String,
    email: Option<String>,
    created_at: String,
}

impl TryFrom<ContactRow> for Contact {
    type Error = DbError;

    fn try_from(row: ContactRow) -> DbResult<Self> {
        Ok(Contact {
            created_at: parse_timestamp("contacts.created_at", &row.created_at)?,
            id: row.id,
            business_id: row.business_id,
            name: row.name,
            phone: row.phone,
            email: row.email,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ContactRepository {
    pool: SqlitePool,
}

impl ContactRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ContactRepository { pool }
    }

    /// ## Errors
    /// * `UniqueViolation` - phone already used in this business
    pub async fn insert(
        &self,
        business_id: &str,
        name: &str,
        phone: &str,
        email: Option<&str>,
    ) -> DbResult<Contact> {
        let contact = Contact {
            id: new_id(),
            business_id: business_id.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            email: email.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO contacts (id, business_id, name, phone, email, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&contact.id)
        .bind(&contact.business_id)
        .bind(&contact.name)
        .bind(&contact.phone)
        .bind(&contact.email)
        .bind(timestamp(contact.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: phone.to_string(),
            },
            other => other,
        })?;

        info!(contact_id = %contact.id, business_id = %business_id, "Contact created");
        Ok(contact)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Contact>> {
        let row: Option<ContactRow> = sqlx::query_as(
            "SELECT id, business_id, name, phone, email, created_at FROM contacts WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Contact::try_from).transpose()
    }

    pub async fn find_by_phone(&self, business_id: &str, phone: &str) -> DbResult<Option<Contact>> {
        let row: Option<ContactRow> = sqlx::query_as(
            r#"
            SELECT id, business_id, name, phone, email, created_at
            FROM contacts
            WHERE business_id = ?1 AND phone = ?2
            "#,
        )
        .bind(business_id)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Contact::try_from).transpose()
    }

    /// Returns the contact with this phone in the business, creating it when
    /// absent. An existing contact keeps its stored name and email.
    ///
    /// Two concurrent bookings from the same new phone number both end up
    /// with the one row that won the insert.
    pub async fn find_or_create(
        &self,
        business_id: &str,
        name: &str,
        phone: &str,
        email: Option<&str>,
    ) -> DbResult<Contact> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO contacts (id, business_id, name, phone, email, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (business_id, phone) DO NOTHING
            "#,
        )
        .bind(new_id())
        .bind(business_id)
        .bind(name)
        .bind(phone)
        .bind(email)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await?
        .rows_affected();

        let contact = self
            .find_by_phone(business_id, phone)
            .await?
            .ok_or_else(|| DbError::not_found("Contact", phone))?;

        debug!(
            contact_id = %contact.id,
            created = inserted > 0,
            "Resolved contact by phone"
        );
        Ok(contact)
    }

    /// Newest first.
    pub async fn list_by_business(&self, business_id: &str) -> DbResult<Vec<Contact>> {
        let rows: Vec<ContactRow> = sqlx::query_as(
            r#"
            SELECT id, business_id, name, phone, email, created_at
            FROM contacts
            WHERE business_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Contact::try_from).collect()
    }

    pub async fn update(
        &self,
        id: &str,
        name: &str,
        phone: &str,
        email: Option<&str>,
    ) -> DbResult<Contact> {
        let result = sqlx::query("UPDATE contacts SET name = ?1, phone = ?2, email = ?3 WHERE id = ?4")
            .bind(name)
            .bind(phone)
            .bind(email)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Contact", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Contact", id))
    }

    /// ## Errors
    /// * `ForeignKeyViolation` - bookings or invoices still reference the contact
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Contact", id));
        }

        info!(contact_id = %id, "Contact deleted");
        Ok(())
    }
}
