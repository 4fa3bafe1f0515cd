//! # Booking Repository
//!
//! Appointments and the booked-instant lookup behind slot availability.
//!
//! ## Slot Exclusivity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert(employee, 15:00Z)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  active booking at (employee, 15:00Z)? ──yes──► CoreError::SlotTaken    │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  INSERT ─── idx_bookings_active_slot violated ──► CoreError::SlotTaken  │
//! │       │     (a concurrent insert won the race)                          │
//! │       ▼                                                                 │
//! │  Booking { status: confirmed }                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Cancelled and no-show bookings release their slot.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::{new_id, parse_json, parse_timestamp, timestamp, to_json};
use crate::error::{DbError, DbResult};
use trim_core::booking::transition;
use trim_core::{Booking, BookingStatus, CoreError};

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: String,
    business_id: String,
    service_id: String,
    employee_id: String,
    contact_id: String,
    booking_at: String,
    status: BookingStatus,
    additional_service_ids: String,
    created_at: String,
}

impl TryFrom<BookingRow> for Booking {
    type Error = DbError;

    fn try_from(row: BookingRow) -> DbResult<Self> {
        Ok(Booking {
            booking_at: parse_timestamp("bookings.booking_at", &row.booking_at)?,
            additional_service_ids: parse_json(
                "bookings.additional_service_ids",
                &row.additional_service_ids,
            )?,
            created_at: parse_timestamp("bookings.created_at", &row.created_at)?,
            id: row.id,
            business_id: row.business_id,
            service_id: row.service_id,
            employee_id: row.employee_id,
            contact_id: row.contact_id,
            status: row.status,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, business_id, service_id, employee_id, contact_id, \
     booking_at, status, additional_service_ids, created_at";

/// Fields of a booking about to be committed.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub business_id: String,
    pub service_id: String,
    pub employee_id: String,
    pub contact_id: String,
    pub booking_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    /// Persists a booking with status `confirmed`.
    ///
    /// ## Errors
    /// * `Domain(SlotTaken)` - the employee already has an active booking at
    ///   this instant
    /// * `ForeignKeyViolation` - unknown service, employee or contact
    pub async fn insert(&self, new: NewBooking) -> DbResult<Booking> {
        let slot_taken = || {
            DbError::Domain(CoreError::SlotTaken {
                employee_id: new.employee_id.clone(),
                at: new.booking_at.to_rfc3339(),
            })
        };

        if self.has_active_at(&new.employee_id, new.booking_at).await? {
            warn!(employee_id = %new.employee_id, at = %new.booking_at, "Slot already booked");
            return Err(slot_taken());
        }

        let booking = Booking {
            id: new_id(),
            business_id: new.business_id.clone(),
            service_id: new.service_id.clone(),
            employee_id: new.employee_id.clone(),
            contact_id: new.contact_id.clone(),
            booking_at: new.booking_at,
            status: BookingStatus::Confirmed,
            additional_service_ids: Vec::new(),
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO bookings
                (id, business_id, service_id, employee_id, contact_id, booking_at, status,
                 additional_service_ids, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, '[]', ?8)
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.business_id)
        .bind(&booking.service_id)
        .bind(&booking.employee_id)
        .bind(&booking.contact_id)
        .bind(timestamp(booking.booking_at))
        .bind(booking.status)
        .bind(timestamp(booking.created_at))
        .execute(&self.pool)
        .await;

        match result.map_err(DbError::from) {
            Ok(_) => {}
            Err(e) if e.is_unique_on("bookings.employee_id") => {
                warn!(employee_id = %new.employee_id, at = %new.booking_at, "Lost race for slot");
                return Err(slot_taken());
            }
            Err(e) => return Err(e),
        }

        info!(
            booking_id = %booking.id,
            employee_id = %booking.employee_id,
            at = %booking.booking_at,
            "Booking committed"
        );
        Ok(booking)
    }

    async fn has_active_at(&self, employee_id: &str, at: DateTime<Utc>) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE employee_id = ?1 AND booking_at = ?2
              AND status NOT IN ('cancelled', 'no_show')
            "#,
        )
        .bind(employee_id)
        .bind(timestamp(at))
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Booking::try_from).transpose()
    }

    pub async fn require(&self, id: &str) -> DbResult<Booking> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Booking", id))
    }

    pub async fn list_by_business(&self, business_id: &str) -> DbResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE business_id = ?1 ORDER BY booking_at"
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    pub async fn list_by_employee(&self, employee_id: &str) -> DbResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE employee_id = ?1 ORDER BY booking_at"
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    /// Instants in `[from, to)` at which the employee has an active booking.
    pub async fn booked_instants(
        &self,
        employee_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<DateTime<Utc>>> {
        let raw: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT booking_at FROM bookings
            WHERE employee_id = ?1
              AND booking_at >= ?2 AND booking_at < ?3
              AND status NOT IN ('cancelled', 'no_show')
            ORDER BY booking_at
            "#,
        )
        .bind(employee_id)
        .bind(timestamp(from))
        .bind(timestamp(to))
        .fetch_all(&self.pool)
        .await?;

        debug!(employee_id = %employee_id, count = raw.len(), "Loaded booked instants");
        raw.iter()
            .map(|at| parse_timestamp("bookings.booking_at", at))
            .collect()
    }

    /// Moves a booking to a new status, checked against the lifecycle.
    ///
    /// The update is conditional on the status that was read, so a booking
    /// settled in the meantime is reported instead of overwritten.
    pub async fn update_status(&self, id: &str, requested: BookingStatus) -> DbResult<Booking> {
        let mut booking = self.require(id).await?;
        let next = transition(id, booking.status, requested)?;

        let result = sqlx::query("UPDATE bookings SET status = ?1 WHERE id = ?2 AND status = ?3")
            .bind(next)
            .bind(id)
            .bind(booking.status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            let current = self.require(id).await?;
            return Err(CoreError::InvalidBookingStatus {
                booking_id: id.to_string(),
                current: current.status.to_string(),
                requested: requested.to_string(),
            }
            .into());
        }

        info!(booking_id = %id, from = %booking.status, to = %next, "Booking status changed");
        booking.status = next;
        Ok(booking)
    }

    /// Sets the services added at checkout and optionally moves the status.
    pub async fn update_services(
        &self,
        id: &str,
        additional_service_ids: Vec<String>,
        status: Option<BookingStatus>,
    ) -> DbResult<Booking> {
        let mut booking = self.require(id).await?;
        let next = match status {
            Some(requested) => transition(id, booking.status, requested)?,
            None => booking.status,
        };

        let result = sqlx::query(
            r#"
            UPDATE bookings SET additional_service_ids = ?1, status = ?2
            WHERE id = ?3 AND status = ?4
            "#,
        )
        .bind(to_json("bookings.additional_service_ids", &additional_service_ids)?)
        .bind(next)
        .bind(id)
        .bind(booking.status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.require(id).await?;
            return Err(CoreError::InvalidBookingStatus {
                booking_id: id.to_string(),
                current: current.status.to_string(),
                requested: next.to_string(),
            }
            .into());
        }

        debug!(booking_id = %id, count = additional_service_ids.len(), "Booking services updated");
        booking.additional_service_ids = additional_service_ids;
        booking.status = next;
        Ok(booking)
    }
}
