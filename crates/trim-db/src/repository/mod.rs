//! # Repository Module
//!
//! Database repository implementations for Trim.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  axum handler / trim-api service                                        │
//! │       │                                                                 │
//! │       │  db.bookings().booked_instants(employee_id, from, to)           │
//! │       ▼                                                                 │
//! │  BookingRepository                                                      │
//! │  ├── insert(&self, booking)                                             │
//! │  ├── get(&self, id)                                                     │
//! │  └── update_status(&self, id, status)                                   │
//! │       │                                                                 │
//! │       │  SQL (runtime-checked sqlx::query_as)                           │
//! │       ▼                                                                 │
//! │  Row struct (FromRow) ──TryFrom──► trim_core domain type                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every query is scoped by `business_id` where the table has one.
//!
//! ## Available Repositories
//!
//! - [`business::BusinessRepository`] - Tenants, credentials, business schedule
//! - [`employee::EmployeeRepository`] - Staff, credentials, employee schedules
//! - [`service::ServiceRepository`] - Service menu
//! - [`contact::ContactRepository`] - Customers, find-or-create by phone
//! - [`booking::BookingRepository`] - Appointments and booked instants
//! - [`invoice::InvoiceRepository`] - Settlement transaction and history
//! - [`catalog::CatalogRepository`] - Categories and products
//! - [`inventory::InventoryRepository`] - Per-product stock

pub mod booking;
pub mod business;
pub mod catalog;
pub mod contact;
pub mod employee;
pub mod inventory;
pub mod invoice;
pub mod service;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;

use crate::error::{DbError, DbResult};

/// Stored timestamps are RFC 3339 text.
///
/// Every writer goes through [`timestamp`], so one instant always has one
/// spelling and text comparison orders chronologically.
pub(crate) fn parse_timestamp(column: &str, raw: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Decode {
            column: column.to_string(),
            reason: e.to_string(),
        })
}

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Decodes a JSON text column.
pub(crate) fn parse_json<T: DeserializeOwned>(column: &str, raw: &str) -> DbResult<T> {
    serde_json::from_str(raw).map_err(|e| DbError::Decode {
        column: column.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn to_json<T: serde::Serialize>(column: &str, value: &T) -> DbResult<String> {
    serde_json::to_string(value).map_err(|e| DbError::Decode {
        column: column.to_string(),
        reason: e.to_string(),
    })
}

/// Fresh UUID v4 identifier.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by repository tests.

    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use trim_core::{Business, Contact, Employee, ScheduleSpec, Service};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn business(db: &Database, email: &str) -> Business {
        db.businesses()
            .insert("Fade Factory", "Sam Rivera", email, "hash")
            .await
            .unwrap()
    }

    pub async fn service(db: &Database, business_id: &str) -> Service {
        db.services()
            .insert(business_id, "Haircut", 4000, 30)
            .await
            .unwrap()
    }

    pub async fn employee(db: &Database, business_id: &str, email: &str) -> Employee {
        db.employees()
            .insert(
                business_id,
                "Alex",
                email,
                None,
                "hash",
                &[],
                &ScheduleSpec::default(),
            )
            .await
            .unwrap()
    }

    pub async fn contact(db: &Database, business_id: &str, phone: &str) -> Contact {
        db.contacts()
            .insert(business_id, "Jordan", phone, None)
            .await
            .unwrap()
    }

    pub fn at(raw: &str) -> chrono::DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339(raw)
            .unwrap()
            .with_timezone(&Utc)
    }
}
