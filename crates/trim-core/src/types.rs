//! # Domain Types
//!
//! Core domain types used throughout Trim.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Business ──owns──► Service, Employee, Contact, Product, Category       │
//! │     │                                                                   │
//! │     └──owns──► Booking ──settles into──► Invoice                        │
//! │                   │                        │                            │
//! │                   │ status                 ├── misc_items (snapshot)    │
//! │                   ▼                        └── products   (snapshot)    │
//! │   confirmed → checkout → Billed                                         │
//! │                                                                         │
//! │  Inventory: one record per (Business, Product)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identifiers are UUID v4 strings. Money fields end in `_cents`.
//! Wire format is camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::schedule::ScheduleSpec;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps = 10%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage such as `8.25`.
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Business
// =============================================================================

/// A tenant: one salon or barbershop.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Business {
    pub id: String,
    pub name: String,
    pub owner_name: String,
    pub email: String,
    /// Opt-in: ties product sales on invoices to stock decrement.
    pub inventory_enabled: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Owner contact details kept with the business schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct OwnerDetails {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Opening schedule of a business, one per business.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSchedule {
    pub business_id: String,
    #[serde(flatten)]
    pub schedule: ScheduleSpec,
    #[serde(default)]
    pub owner: OwnerDetails,
    /// Display label only; slot math always uses the business timezone.
    pub timezone: String,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Service
// =============================================================================

/// A service on the menu (haircut, beard trim, ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Service {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub price_cents: i64,
    /// Always a positive multiple of 5.
    pub duration_minutes: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Service {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Employee
// =============================================================================

/// A staff member with an individually configurable schedule.
///
/// When `schedule.working_days` is empty the employee follows the business
/// schedule; see [`crate::schedule::effective_schedule`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service_ids: Vec<String>,
    #[serde(flatten)]
    pub schedule: ScheduleSpec,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Contact
// =============================================================================

/// A customer, unique per (phone, business).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Contact {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Booking Status
// =============================================================================

/// Lifecycle status of a booking.
///
/// Wire values keep their historical mixed casing, so each variant is
/// renamed explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum BookingStatus {
    #[serde(rename = "Booked")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Booked"))]
    Booked,
    #[default]
    #[serde(rename = "confirmed")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "confirmed"))]
    Confirmed,
    /// Staff are assembling the checkout.
    #[serde(rename = "checkout")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "checkout"))]
    Checkout,
    #[serde(rename = "no_show")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "no_show"))]
    NoShow,
    /// Reached only once an invoice has been persisted.
    #[serde(rename = "Billed")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Billed"))]
    Billed,
    #[serde(rename = "cancelled")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cancelled"))]
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 6] = [
        BookingStatus::Booked,
        BookingStatus::Confirmed,
        BookingStatus::Checkout,
        BookingStatus::NoShow,
        BookingStatus::Billed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "Booked",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Checkout => "checkout",
            BookingStatus::NoShow => "no_show",
            BookingStatus::Billed => "Billed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the booking still holds its slot.
    pub fn is_active(&self) -> bool {
        !matches!(self, BookingStatus::NoShow | BookingStatus::Cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Billed | BookingStatus::NoShow | BookingStatus::Cancelled
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: BookingStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Booking
// =============================================================================

/// An appointment for one service with one employee.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Booking {
    pub id: String,
    pub business_id: String,
    pub service_id: String,
    pub employee_id: String,
    pub contact_id: String,
    #[serde(rename = "bookingDateTime")]
    #[ts(as = "String")]
    pub booking_at: DateTime<Utc>,
    pub status: BookingStatus,
    /// Services added at checkout time.
    pub additional_service_ids: Vec<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment Method / Invoice Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum InvoiceStatus {
    #[default]
    Paid,
    Pending,
}

// =============================================================================
// Invoice
// =============================================================================

/// A named ad-hoc charge on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MiscItem {
    pub name: String,
    pub price_cents: i64,
}

/// A product sold on an invoice.
///
/// ## Snapshot Pattern
/// Name and unit price are copied at settlement time so that later catalog
/// edits never rewrite invoice history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceLine {
    pub product_id: String,
    pub name: String,
    pub price_per_unit_cents: i64,
    pub quantity: i64,
    /// `price_per_unit_cents * quantity`
    pub line_total_cents: i64,
}

/// A settled checkout. Totals are computed once at creation and stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub business_id: String,
    pub booking_id: String,
    pub contact_id: String,
    pub employee_id: String,
    pub service_ids: Vec<String>,
    pub misc_items: Vec<MiscItem>,
    pub products: Vec<InvoiceLine>,
    pub tax_rate_bps: u32,
    pub service_total_cents: i64,
    pub misc_total_cents: i64,
    pub products_total_cents: i64,
    pub tax_cents: i64,
    pub tip_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: InvoiceStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub description: Option<String>,
}

/// A retail product (pomade, shampoo, ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub business_id: String,
    pub category_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    /// Selling unit ("bottle", "jar").
    pub unit: Option<String>,
    pub price_per_unit_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_per_unit_cents)
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// Default reorder threshold for new inventory records.
pub const DEFAULT_REORDER_LEVEL: i64 = 10;

/// Stock for one (business, product) pair.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryItem {
    pub id: String,
    pub business_id: String,
    pub product_id: String,
    /// Never negative.
    pub quantity_in_stock: i64,
    pub reorder_level: i64,
    #[ts(as = "String")]
    pub last_updated: DateTime<Utc>,
}

impl InventoryItem {
    pub fn needs_reorder(&self) -> bool {
        self.quantity_in_stock <= self.reorder_level
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(10.0).bps(), 1000);
        assert_eq!(TaxRate::from_percentage(8.25).bps(), 825);
        assert_eq!(TaxRate::from_bps(825).percentage(), 8.25);
    }

    #[test]
    fn test_booking_status_wire_values() {
        assert_eq!(
            serde_json::to_string(&BookingStatus::NoShow).unwrap(),
            "\"no_show\""
        );
        assert_eq!(
            serde_json::to_string(&BookingStatus::Billed).unwrap(),
            "\"Billed\""
        );
        let parsed: BookingStatus = serde_json::from_str("\"confirmed\"").unwrap();
        assert_eq!(parsed, BookingStatus::Confirmed);
    }

    #[test]
    fn test_booking_status_from_str() {
        assert_eq!("checkout".parse::<BookingStatus>().unwrap(), BookingStatus::Checkout);
        assert!("Checkout".parse::<BookingStatus>().is_err());
        assert_eq!(BookingStatus::default(), BookingStatus::Confirmed);
    }

    #[test]
    fn test_booking_status_activity() {
        assert!(BookingStatus::Confirmed.is_active());
        assert!(BookingStatus::Billed.is_active());
        assert!(!BookingStatus::Cancelled.is_active());
        assert!(!BookingStatus::NoShow.is_active());
        assert!(BookingStatus::Billed.is_terminal());
        assert!(!BookingStatus::Checkout.is_terminal());
    }

    #[test]
    fn test_payment_method_and_invoice_status_wire() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Card).unwrap(), "\"card\"");
        assert_eq!(serde_json::to_string(&InvoiceStatus::Paid).unwrap(), "\"Paid\"");
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Paid);
    }

    #[test]
    fn test_inventory_reorder() {
        let item = InventoryItem {
            id: "i".into(),
            business_id: "b".into(),
            product_id: "p".into(),
            quantity_in_stock: 10,
            reorder_level: DEFAULT_REORDER_LEVEL,
            last_updated: Utc::now(),
        };
        assert!(item.needs_reorder());
    }
}
