//! # Booking Rules
//!
//! Request validation for new bookings and the booking status lifecycle.
//!
//! ## Status Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Booked ⇄ confirmed ──► checkout ──(invoice settled)──► Billed         │
//! │               │  ▲           │                                          │
//! │               │  └───────────┘                                          │
//! │               ├──► no_show                                              │
//! │               └──► cancelled ◄── checkout                               │
//! │                                                                         │
//! │   Billed, no_show and cancelled are terminal.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::BookingStatus;
use crate::validation::{non_blank, ValidationResult};

// =============================================================================
// Create Booking Request
// =============================================================================

/// Customer details as typed into the booking form.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ContactDetails {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Raw booking request. Every field is optional here so that a missing
/// field is reported by name instead of as a JSON parse failure.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct BookingRequest {
    pub service_id: Option<String>,
    pub employee_id: Option<String>,
    /// ISO 8601 instant, e.g. "2024-05-06T13:30:00.000Z".
    pub booking_date_time: Option<String>,
    pub contact: Option<ContactDetails>,
}

/// Contact fields after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// A booking request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBooking {
    pub service_id: String,
    pub employee_id: String,
    pub booking_at: DateTime<Utc>,
    pub contact: NewContact,
}

/// Validates a booking request.
///
/// Checks run in order: serviceId, employeeId, bookingDateTime,
/// contact.name, contact.phone. The first failure is returned.
pub fn validate_booking_request(req: &BookingRequest) -> ValidationResult<ValidatedBooking> {
    let service_id = non_blank(req.service_id.as_deref(), "serviceId")?;
    let employee_id = non_blank(req.employee_id.as_deref(), "employeeId")?;
    let raw_instant = non_blank(req.booking_date_time.as_deref(), "bookingDateTime")?;

    let contact = req.contact.clone().unwrap_or_default();
    let name = non_blank(contact.name.as_deref(), "contact.name")?;
    let phone = non_blank(contact.phone.as_deref(), "contact.phone")?;
    let email = contact
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());

    let booking_at = parse_instant(&raw_instant, "bookingDateTime")?;

    Ok(ValidatedBooking {
        service_id,
        employee_id,
        booking_at,
        contact: NewContact { name, phone, email },
    })
}

/// Parses an RFC 3339 instant into UTC.
pub fn parse_instant(raw: &str, field: &str) -> ValidationResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ValidationError::invalid(field, e.to_string()))
}

// =============================================================================
// Status Lifecycle
// =============================================================================

impl BookingStatus {
    /// Whether staff may move a booking from `self` to `next`.
    ///
    /// `Billed` is never a valid target here; it is set by invoice
    /// settlement only. Re-applying the current status is a no-op for
    /// non-terminal bookings.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;

        match (self, next) {
            (_, Billed) => false,
            (current, next) if current == next => !current.is_terminal(),
            (Booked | Confirmed, Booked | Confirmed | Checkout | NoShow | Cancelled) => true,
            (Checkout, Booked | Confirmed | Cancelled) => true,
            _ => false,
        }
    }

    /// Whether an invoice may be settled against a booking in this status.
    pub fn can_settle(self) -> bool {
        matches!(
            self,
            BookingStatus::Booked | BookingStatus::Confirmed | BookingStatus::Checkout
        )
    }
}

/// Checks a staff-driven status change.
pub fn transition(
    booking_id: &str,
    current: BookingStatus,
    requested: BookingStatus,
) -> CoreResult<BookingStatus> {
    if current.can_transition_to(requested) {
        Ok(requested)
    } else {
        Err(invalid_status(booking_id, current, requested))
    }
}

/// Checks that a booking can be billed.
pub fn ensure_settleable(booking_id: &str, current: BookingStatus) -> CoreResult<()> {
    if current.can_settle() {
        Ok(())
    } else {
        Err(invalid_status(booking_id, current, BookingStatus::Billed))
    }
}

fn invalid_status(booking_id: &str, current: BookingStatus, requested: BookingStatus) -> CoreError {
    CoreError::InvalidBookingStatus {
        booking_id: booking_id.to_string(),
        current: current.to_string(),
        requested: requested.to_string(),
    }
}

/// Cleans the service list sent during checkout assembly: blanks dropped,
/// duplicates removed, first occurrence wins.
pub fn sanitize_service_ids(ids: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        if !out.iter().any(|seen| seen == id) {
            out.push(id.to_string());
        }
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
