//! # Service Repository
//!
//! The service menu of each business.

use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::{new_id, parse_timestamp, timestamp};
use crate::error::{DbError, DbResult};
use trim_core::Service;

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: String,
    business_id: String,
    name: String,
    price_cents: i64,
    duration_minutes: i64,
    created_at: String,
}

impl TryFrom<ServiceRow> for Service {
    type Error = DbError;

    fn try_from(row: ServiceRow) -> DbResult<Self> {
        Ok(Service {
            created_at: parse_timestamp("services.created_at", &row.created_at)?,
            id: row.id,
            business_id: row.business_id,
            name: row.name,
            price_cents: row.price_cents,
            duration_minutes: row.duration_minutes,
        })
    }
}

/// Repository for service menu operations.
#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
}

impl ServiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRepository { pool }
    }

    pub async fn insert(
        &self,
        business_id: &str,
        name: &str,
        price_cents: i64,
        duration_minutes: i64,
    ) -> DbResult<Service> {
        let service = Service {
            id: new_id(),
            business_id: business_id.to_string(),
            name: name.to_string(),
            price_cents,
            duration_minutes,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO services (id, business_id, name, price_cents, duration_minutes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&service.id)
        .bind(&service.business_id)
        .bind(&service.name)
        .bind(service.price_cents)
        .bind(service.duration_minutes)
        .bind(timestamp(service.created_at))
        .execute(&self.pool)
        .await?;

        info!(service_id = %service.id, business_id = %business_id, "Service created");
        Ok(service)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Service>> {
        let row: Option<ServiceRow> = sqlx::query_as(
            r#"
            SELECT id, business_id, name, price_cents, duration_minutes, created_at
            FROM services
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Service::try_from).transpose()
    }

    pub async fn list_by_business(&self, business_id: &str) -> DbResult<Vec<Service>> {
        let rows: Vec<ServiceRow> = sqlx::query_as(
            r#"
            SELECT id, business_id, name, price_cents, duration_minutes, created_at
            FROM services
            WHERE business_id = ?1
            ORDER BY name
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(business_id = %business_id, count = rows.len(), "Listed services");
        rows.into_iter().map(Service::try_from).collect()
    }

    /// Finds a service with the same name and price, used to reject
    /// duplicates on create.
    pub async fn find_by_name_and_price(
        &self,
        business_id: &str,
        name: &str,
        price_cents: i64,
    ) -> DbResult<Option<Service>> {
        let row: Option<ServiceRow> = sqlx::query_as(
            r#"
            SELECT id, business_id, name, price_cents, duration_minutes, created_at
            FROM services
            WHERE business_id = ?1 AND name = ?2 COLLATE NOCASE AND price_cents = ?3
            LIMIT 1
            "#,
        )
        .bind(business_id)
        .bind(name)
        .bind(price_cents)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Service::try_from).transpose()
    }

    pub async fn update(
        &self,
        id: &str,
        name: &str,
        price_cents: i64,
        duration_minutes: i64,
    ) -> DbResult<Service> {
        let result = sqlx::query(
            "UPDATE services SET name = ?1, price_cents = ?2, duration_minutes = ?3 WHERE id = ?4",
        )
        .bind(name)
        .bind(price_cents)
        .bind(duration_minutes)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Service", id))
    }

    /// ## Errors
    /// * `ForeignKeyViolation` - bookings still reference the service
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM services WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", id));
        }

        info!(service_id = %id, "Service deleted");
        Ok(())
    }

    /// Deletes every listed service of a business, or none of them.
    /// Repeated ids count once.
    ///
    /// ## Errors
    /// * `NotFound` - an id is unknown or belongs to another business;
    ///   nothing is deleted
    pub async fn delete_many(&self, business_id: &str, ids: &[String]) -> DbResult<u64> {
        let ids: BTreeSet<&str> = ids.iter().map(String::as_str).collect();
        let mut tx = self.pool.begin().await?;

        for id in ids.iter().copied() {
            let deleted = sqlx::query("DELETE FROM services WHERE id = ?1 AND business_id = ?2")
                .bind(id)
                .bind(business_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            if deleted == 0 {
                return Err(DbError::not_found("Service", id));
            }
        }

        tx.commit().await?;
        info!(business_id = %business_id, count = ids.len(), "Services deleted");
        Ok(ids.len() as u64)
    }
}
