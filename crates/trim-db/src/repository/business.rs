//! # Business Repository
//!
//! Tenants, their login credentials and their opening schedule.
//!
//! A business row is created at registration. The schedule row is created
//! the first time the owner saves opening hours, so a business without one
//! is closed every day.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::{new_id, parse_json, parse_timestamp, timestamp, to_json};
use crate::error::{DbError, DbResult};
use trim_core::{Business, BusinessSchedule, OwnerDetails, ScheduleSpec};

#[derive(Debug, sqlx::FromRow)]
struct BusinessRow {
    id: String,
    name: String,
    owner_name: String,
    email: String,
    inventory_enabled: bool,
    created_at: String,
}

impl TryFrom<BusinessRow> for Business {
    type Error = DbError;

    fn try_from(row: BusinessRow) -> DbResult<Self> {
        Ok(Business {
            created_at: parse_timestamp("businesses.created_at", &row.created_at)?,
            id: row.id,
            name: row.name,
            owner_name: row.owner_name,
            email: row.email,
            inventory_enabled: row.inventory_enabled,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ScheduleRow {
    business_id: String,
    schedule: String,
    owner: String,
    timezone: String,
    updated_at: String,
}

impl TryFrom<ScheduleRow> for BusinessSchedule {
    type Error = DbError;

    fn try_from(row: ScheduleRow) -> DbResult<Self> {
        Ok(BusinessSchedule {
            schedule: parse_json("business_schedules.schedule", &row.schedule)?,
            owner: parse_json("business_schedules.owner", &row.owner)?,
            updated_at: parse_timestamp("business_schedules.updated_at", &row.updated_at)?,
            business_id: row.business_id,
            timezone: row.timezone,
        })
    }
}

/// A business together with its stored password hash, for login only.
#[derive(Debug, Clone)]
pub struct BusinessCredentials {
    pub business: Business,
    pub password_hash: String,
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    business: BusinessRow,
    password_hash: String,
}

const BUSINESS_COLUMNS: &str = "id, name, owner_name, email, inventory_enabled, created_at";

/// Repository for business and business-schedule operations.
#[derive(Debug, Clone)]
pub struct BusinessRepository {
    pool: SqlitePool,
}

impl BusinessRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BusinessRepository { pool }
    }

    /// Registers a business. `email` must already be normalized.
    ///
    /// ## Errors
    /// * `UniqueViolation` - email already registered
    pub async fn insert(
        &self,
        name: &str,
        owner_name: &str,
        email: &str,
        password_hash: &str,
    ) -> DbResult<Business> {
        let business = Business {
            id: new_id(),
            name: name.to_string(),
            owner_name: owner_name.to_string(),
            email: email.to_string(),
            inventory_enabled: false,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO businesses (id, name, owner_name, email, password_hash, inventory_enabled, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
            "#,
        )
        .bind(&business.id)
        .bind(&business.name)
        .bind(&business.owner_name)
        .bind(&business.email)
        .bind(password_hash)
        .bind(timestamp(business.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: email.to_string(),
            },
            other => other,
        })?;

        info!(business_id = %business.id, "Business registered");
        Ok(business)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Business>> {
        let row: Option<BusinessRow> = sqlx::query_as(&format!(
            "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Business::try_from).transpose()
    }

    /// Like [`get`](Self::get) but a missing business is an error.
    pub async fn require(&self, id: &str) -> DbResult<Business> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Business", id))
    }

    pub async fn credentials_by_email(&self, email: &str) -> DbResult<Option<BusinessCredentials>> {
        let row: Option<CredentialsRow> = sqlx::query_as(&format!(
            "SELECT {BUSINESS_COLUMNS}, password_hash FROM businesses WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(BusinessCredentials {
                business: Business::try_from(row.business)?,
                password_hash: row.password_hash,
            })
        })
        .transpose()
    }

    /// Turns inventory tracking on or off for a business.
    pub async fn set_inventory_enabled(&self, id: &str, enabled: bool) -> DbResult<Business> {
        let result = sqlx::query("UPDATE businesses SET inventory_enabled = ?1 WHERE id = ?2")
            .bind(enabled)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Business", id));
        }

        info!(business_id = %id, enabled, "Inventory tracking toggled");
        self.require(id).await
    }

    // -------------------------------------------------------------------------
    // Schedule
    // -------------------------------------------------------------------------

    pub async fn get_schedule(&self, business_id: &str) -> DbResult<Option<BusinessSchedule>> {
        let row: Option<ScheduleRow> = sqlx::query_as(
            r#"
            SELECT business_id, schedule, owner, timezone, updated_at
            FROM business_schedules
            WHERE business_id = ?1
            "#,
        )
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        debug!(business_id = %business_id, found = row.is_some(), "Loaded business schedule");
        row.map(BusinessSchedule::try_from).transpose()
    }

    /// Creates or replaces the schedule of a business.
    ///
    /// ## Errors
    /// * `ForeignKeyViolation` - unknown business
    pub async fn upsert_schedule(
        &self,
        business_id: &str,
        schedule: &ScheduleSpec,
        owner: &OwnerDetails,
        timezone: &str,
    ) -> DbResult<BusinessSchedule> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO business_schedules (business_id, schedule, owner, timezone, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (business_id) DO UPDATE SET
                schedule = excluded.schedule,
                owner = excluded.owner,
                timezone = excluded.timezone,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(business_id)
        .bind(to_json("business_schedules.schedule", schedule)?)
        .bind(to_json("business_schedules.owner", owner)?)
        .bind(timezone)
        .bind(timestamp(now))
        .execute(&self.pool)
        .await?;

        info!(business_id = %business_id, days = schedule.working_days.len(), "Business schedule saved");

        Ok(BusinessSchedule {
            business_id: business_id.to_string(),
            schedule: schedule.clone(),
            owner: owner.clone(),
            timezone: timezone.to_string(),
            updated_at: now,
        })
    }

    /// Replaces the disabled dates of an existing schedule.
    ///
    /// ## Errors
    /// * `NotFound` - the business has never saved a schedule
    pub async fn set_disabled_dates(
        &self,
        business_id: &str,
        dates: &BTreeSet<NaiveDate>,
    ) -> DbResult<BusinessSchedule> {
        let mut current = self
            .get_schedule(business_id)
            .await?
            .ok_or_else(|| DbError::not_found("BusinessSchedule", business_id))?;

        current.schedule.disabled_dates = dates.clone();
        current.updated_at = Utc::now();

        sqlx::query(
            "UPDATE business_schedules SET schedule = ?1, updated_at = ?2 WHERE business_id = ?3",
        )
        .bind(to_json("business_schedules.schedule", &current.schedule)?)
        .bind(timestamp(current.updated_at))
        .bind(business_id)
        .execute(&self.pool)
        .await?;

        debug!(business_id = %business_id, count = dates.len(), "Business disabled dates updated");
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use trim_core::schedule::OpeningHours;
    use trim_core::{TimeOfDay, Weekday};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_support::db().await;
        let business = test_support::business(&db, "owner@fade.test").await;

        let loaded = db.businesses().require(&business.id).await.unwrap();
        assert_eq!(loaded.email, "owner@fade.test");
        assert!(!loaded.inventory_enabled);

        assert!(db.businesses().get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_support::db().await;
        test_support::business(&db, "owner@fade.test").await;

        let err = db
            .businesses()
            .insert("Other", "Other Owner", "owner@fade.test", "hash")
            .await
            .unwrap_err();
        assert!(err.is_unique_on("businesses.email"));
    }

    #[tokio::test]
    async fn test_credentials_by_email() {
        let db = test_support::db().await;
        let business = test_support::business(&db, "owner@fade.test").await;

        let creds = db
            .businesses()
            .credentials_by_email("owner@fade.test")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(creds.business.id, business.id);
        assert_eq!(creds.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_toggle_inventory() {
        let db = test_support::db().await;
        let business = test_support::business(&db, "owner@fade.test").await;

        let updated = db
            .businesses()
            .set_inventory_enabled(&business.id, true)
            .await
            .unwrap();
        assert!(updated.inventory_enabled);

        let err = db
            .businesses()
            .set_inventory_enabled("missing", true)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_schedule_upsert_and_disabled_dates() {
        let db = test_support::db().await;
        let business = test_support::business(&db, "owner@fade.test").await;
        let repo = db.businesses();

        assert!(repo.get_schedule(&business.id).await.unwrap().is_none());

        let mut spec = ScheduleSpec {
            working_days: vec![Weekday::Monday],
            ..Default::default()
        };
        repo.upsert_schedule(&business.id, &spec, &OwnerDetails::default(), "America/New_York")
            .await
            .unwrap();

        spec.working_hours.insert(
            Weekday::Monday,
            OpeningHours::new(TimeOfDay::hm(10, 0), TimeOfDay::hm(14, 0)),
        );
        repo.upsert_schedule(&business.id, &spec, &OwnerDetails::default(), "America/New_York")
            .await
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        let saved = repo
            .set_disabled_dates(&business.id, &BTreeSet::from([date]))
            .await
            .unwrap();
        assert!(saved.schedule.is_disabled(date));

        let loaded = repo.get_schedule(&business.id).await.unwrap().unwrap();
        assert_eq!(loaded.schedule.working_hours.len(), 1);
        assert!(loaded.schedule.is_disabled(date));
    }

    #[tokio::test]
    async fn test_disabled_dates_need_schedule() {
        let db = test_support::db().await;
        let business = test_support::business(&db, "owner@fade.test").await;

        let err = db
            .businesses()
            .set_disabled_dates(&business.id, &BTreeSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
