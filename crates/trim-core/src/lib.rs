//! # trim-core: Pure Business Logic for Trim
//!
//! Slot availability, booking rules and invoice settlement as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Trim Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                 Dashboard / Booking page (SPA)                  │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │ REST (JSON)                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                 trim-api (axum handlers, services)              │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ trim-core (THIS CRATE) ★                        │    │
//! │  │                                                                 │    │
//! │  │   schedule ──► availability      booking      settlement        │    │
//! │  │   (resolver)   (conflict filter) (rules)      (invoice math)    │    │
//! │  │                                                                 │    │
//! │  │   types · money · validation · report · error                   │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                 trim-db (SQLite repositories)                   │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`schedule`] - Effective schedule, opening hours and the slot grid
//! - [`availability`] - Removes booked and break slots
//! - [`booking`] - Booking request validation and status lifecycle
//! - [`settlement`] - Invoice validation, totals and stock checks
//! - [`report`] - Revenue aggregation
//! - [`types`] - Domain types (Business, Booking, Invoice, ...)
//! - [`money`] - Integer-cent Money type
//! - [`validation`] - Field validators
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use trim_core::money::Money;
//! use trim_core::settlement::InvoiceTotals;
//! use trim_core::types::TaxRate;
//!
//! let totals = InvoiceTotals::compute(
//!     Money::from_cents(4000),          // services
//!     Money::from_cents(500),           // misc
//!     Money::zero(),                    // products
//!     TaxRate::from_percentage(10.0),
//!     Money::from_cents(500),           // tip
//! )
//! .expect("within range");
//! assert_eq!(totals.tax.cents(), 450);
//! assert_eq!(totals.total.cents(), 5450);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod availability;
pub mod booking;
pub mod error;
pub mod money;
pub mod report;
pub mod schedule;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use schedule::{ScheduleSpec, TimeOfDay, Weekday};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// The single supported business timezone.
///
/// Slot times, booked-time comparison and notification text all use it.
pub const BUSINESS_TIMEZONE: chrono_tz::Tz = chrono_tz::America::New_York;
