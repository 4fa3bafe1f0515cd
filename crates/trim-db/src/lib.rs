//! # trim-db: Database Layer for Trim
//!
//! SQLite persistence for every business-scoped entity, using sqlx with
//! runtime-checked queries.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Trim Data Flow                                   │
//! │                                                                         │
//! │  trim-api service (create_booking, settle_invoice, ...)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     trim-db (THIS CRATE)                        │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐   │    │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │   │    │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │   │    │
//! │  │   │               │    │ BookingRepo    │    │ 0001_initial │   │    │
//! │  │   │ SqlitePool    │◄───│ InvoiceRepo    │    │ ...          │   │    │
//! │  │   │ WAL, FKs on   │    │ InventoryRepo  │    │              │   │    │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘   │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (DATABASE_PATH, default ./trim.db)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use trim_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./trim.db")).await?;
//! let services = db.services().list_by_business(&business_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::booking::{BookingRepository, NewBooking};
pub use repository::business::{BusinessCredentials, BusinessRepository};
pub use repository::catalog::{CatalogRepository, ProductFields};
pub use repository::contact::ContactRepository;
pub use repository::employee::{EmployeeCredentials, EmployeeProfile, EmployeeRepository};
pub use repository::inventory::{InventoryRepository, SyncOutcome};
pub use repository::invoice::InvoiceRepository;
pub use repository::service::ServiceRepository;
