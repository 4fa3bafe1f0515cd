//! # Invoice Repository
//!
//! Persists settled checkouts. [`InvoiceRepository::settle`] is the only
//! writer and runs as one transaction.
//!
//! ## Settlement Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    1. UPDATE bookings SET status = 'Billed'                             │
//! │         WHERE id = ? AND status IN ('Booked','confirmed','checkout')    │
//! │         0 rows → NotFound / InvalidBookingStatus                        │
//! │    2. INSERT invoices + invoice_items (name/price snapshots)            │
//! │    3. inventory on: for every product                                  │
//! │         UPDATE inventory SET quantity_in_stock = quantity_in_stock - n  │
//! │           WHERE ... AND quantity_in_stock >= n                          │
//! │         0 rows → InsufficientStock                                      │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error drops the transaction: no invoice, stock and booking as they │
//! │  were.                                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The booking update goes first so the write lock is taken before any
//! read, which serializes concurrent checkouts of one SQLite file.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::{new_id, parse_json, parse_timestamp, timestamp, to_json};
use crate::error::{DbError, DbResult};
use trim_core::booking::ensure_settleable;
use trim_core::settlement::InvoiceDraft;
use trim_core::{BookingStatus, CoreError, Invoice, InvoiceLine, InvoiceStatus, PaymentMethod};

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    business_id: String,
    booking_id: String,
    contact_id: String,
    employee_id: String,
    service_ids: String,
    misc_items: String,
    tax_rate_bps: i64,
    service_total_cents: i64,
    misc_total_cents: i64,
    products_total_cents: i64,
    tax_cents: i64,
    tip_cents: i64,
    total_cents: i64,
    payment_method: PaymentMethod,
    status: InvoiceStatus,
    created_at: String,
}

impl InvoiceRow {
    fn into_invoice(self, products: Vec<InvoiceLine>) -> DbResult<Invoice> {
        let tax_rate_bps = u32::try_from(self.tax_rate_bps).map_err(|e| DbError::Decode {
            column: "invoices.tax_rate_bps".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Invoice {
            service_ids: parse_json("invoices.service_ids", &self.service_ids)?,
            misc_items: parse_json("invoices.misc_items", &self.misc_items)?,
            created_at: parse_timestamp("invoices.created_at", &self.created_at)?,
            products,
            tax_rate_bps,
            id: self.id,
            business_id: self.business_id,
            booking_id: self.booking_id,
            contact_id: self.contact_id,
            employee_id: self.employee_id,
            service_total_cents: self.service_total_cents,
            misc_total_cents: self.misc_total_cents,
            products_total_cents: self.products_total_cents,
            tax_cents: self.tax_cents,
            tip_cents: self.tip_cents,
            total_cents: self.total_cents,
            payment_method: self.payment_method,
            status: self.status,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    invoice_id: String,
    product_id: String,
    name_snapshot: String,
    price_per_unit_cents: i64,
    quantity: i64,
    line_total_cents: i64,
}

impl From<LineRow> for InvoiceLine {
    fn from(row: LineRow) -> Self {
        InvoiceLine {
            product_id: row.product_id,
            name: row.name_snapshot,
            price_per_unit_cents: row.price_per_unit_cents,
            quantity: row.quantity,
            line_total_cents: row.line_total_cents,
        }
    }
}

const INVOICE_COLUMNS: &str = "id, business_id, booking_id, contact_id, employee_id, service_ids, \
     misc_items, tax_rate_bps, service_total_cents, misc_total_cents, products_total_cents, \
     tax_cents, tip_cents, total_cents, payment_method, status, created_at";

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Settles a booking: writes the invoice, decrements stock when
    /// `track_inventory` is set, and marks the booking `Billed`, all or
    /// nothing.
    ///
    /// ## Errors
    /// * `NotFound` - booking does not exist in this business
    /// * `Domain(InvalidBookingStatus)` - booking already billed, cancelled
    ///   or marked no-show
    /// * `Domain(InsufficientStock)` - a product ran short; nothing written
    /// * `UniqueViolation` - the booking already has an invoice
    pub async fn settle(&self, draft: InvoiceDraft, track_inventory: bool) -> DbResult<Invoice> {
        let demand = draft.stock_demand();
        let invoice = draft.into_invoice(new_id(), Utc::now());

        let mut tx = self.pool.begin().await?;

        // 1. Claim the booking
        let claimed = sqlx::query(
            r#"
            UPDATE bookings SET status = ?1
            WHERE id = ?2 AND business_id = ?3
              AND status IN ('Booked', 'confirmed', 'checkout')
            "#,
        )
        .bind(BookingStatus::Billed)
        .bind(&invoice.booking_id)
        .bind(&invoice.business_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if claimed == 0 {
            let current: Option<BookingStatus> = sqlx::query_scalar(
                "SELECT status FROM bookings WHERE id = ?1 AND business_id = ?2",
            )
            .bind(&invoice.booking_id)
            .bind(&invoice.business_id)
            .fetch_optional(&mut *tx)
            .await?;

            return Err(match current {
                None => DbError::not_found("Booking", invoice.booking_id.as_str()),
                Some(status) => match ensure_settleable(&invoice.booking_id, status) {
                    Err(e) => e.into(),
                    Ok(()) => DbError::Internal(format!(
                        "booking {} is {status} but could not be claimed",
                        invoice.booking_id
                    )),
                },
            });
        }

        // 2. Invoice and line snapshots
        sqlx::query(&format!(
            r#"
            INSERT INTO invoices ({INVOICE_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#
        ))
        .bind(&invoice.id)
        .bind(&invoice.business_id)
        .bind(&invoice.booking_id)
        .bind(&invoice.contact_id)
        .bind(&invoice.employee_id)
        .bind(to_json("invoices.service_ids", &invoice.service_ids)?)
        .bind(to_json("invoices.misc_items", &invoice.misc_items)?)
        .bind(i64::from(invoice.tax_rate_bps))
        .bind(invoice.service_total_cents)
        .bind(invoice.misc_total_cents)
        .bind(invoice.products_total_cents)
        .bind(invoice.tax_cents)
        .bind(invoice.tip_cents)
        .bind(invoice.total_cents)
        .bind(invoice.payment_method)
        .bind(invoice.status)
        .bind(timestamp(invoice.created_at))
        .execute(&mut *tx)
        .await?;

        for (position, line) in invoice.products.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO invoice_items
                    (id, invoice_id, position, product_id, name_snapshot,
                     price_per_unit_cents, quantity, line_total_cents)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(new_id())
            .bind(&invoice.id)
            .bind(position as i64)
            .bind(&line.product_id)
            .bind(&line.name)
            .bind(line.price_per_unit_cents)
            .bind(line.quantity)
            .bind(line.line_total_cents)
            .execute(&mut *tx)
            .await?;
        }

        // 3. Stock
        if track_inventory {
            let now = timestamp(invoice.created_at);
            for need in &demand {
                let decremented = sqlx::query(
                    r#"
                    UPDATE inventory
                    SET quantity_in_stock = quantity_in_stock - ?1, last_updated = ?2
                    WHERE business_id = ?3 AND product_id = ?4 AND quantity_in_stock >= ?1
                    "#,
                )
                .bind(need.quantity)
                .bind(&now)
                .bind(&invoice.business_id)
                .bind(&need.product_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

                if decremented == 0 {
                    let available: Option<i64> = sqlx::query_scalar(
                        "SELECT quantity_in_stock FROM inventory WHERE business_id = ?1 AND product_id = ?2",
                    )
                    .bind(&invoice.business_id)
                    .bind(&need.product_id)
                    .fetch_optional(&mut *tx)
                    .await?;

                    warn!(
                        product_id = %need.product_id,
                        requested = need.quantity,
                        "Stock ran short during settlement, rolling back"
                    );
                    return Err(CoreError::InsufficientStock {
                        product: need.name.clone(),
                        requested: need.quantity,
                        available: available.unwrap_or(0),
                    }
                    .into());
                }
            }
        }

        tx.commit().await?;

        info!(
            invoice_id = %invoice.id,
            booking_id = %invoice.booking_id,
            total_cents = invoice.total_cents,
            lines = invoice.products.len(),
            "Invoice settled"
        );
        Ok(invoice)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Invoice>> {
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines: Vec<LineRow> = sqlx::query_as(
            r#"
            SELECT invoice_id, product_id, name_snapshot, price_per_unit_cents, quantity, line_total_cents
            FROM invoice_items
            WHERE invoice_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        row.into_invoice(lines.into_iter().map(InvoiceLine::from).collect())
            .map(Some)
    }

    /// Invoices of a business, newest first, optionally limited to
    /// `from <= created_at < to`.
    pub async fn list_by_business(
        &self,
        business_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<Invoice>> {
        let from = from.map(timestamp);
        let to = to.map(timestamp);

        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            r#"
            SELECT {INVOICE_COLUMNS} FROM invoices
            WHERE business_id = ?1
              AND (?2 IS NULL OR created_at >= ?2)
              AND (?3 IS NULL OR created_at < ?3)
            ORDER BY created_at DESC
            "#
        ))
        .bind(business_id)
        .bind(&from)
        .bind(&to)
        .fetch_all(&self.pool)
        .await?;

        let line_rows: Vec<LineRow> = sqlx::query_as(
            r#"
            SELECT ii.invoice_id, ii.product_id, ii.name_snapshot, ii.price_per_unit_cents,
                   ii.quantity, ii.line_total_cents
            FROM invoice_items ii
            JOIN invoices i ON i.id = ii.invoice_id
            WHERE i.business_id = ?1
              AND (?2 IS NULL OR i.created_at >= ?2)
              AND (?3 IS NULL OR i.created_at < ?3)
            ORDER BY ii.invoice_id, ii.position
            "#,
        )
        .bind(business_id)
        .bind(&from)
        .bind(&to)
        .fetch_all(&self.pool)
        .await?;

        let mut lines: HashMap<String, Vec<InvoiceLine>> = HashMap::new();
        for row in line_rows {
            lines.entry(row.invoice_id.clone()).or_default().push(row.into());
        }

        debug!(business_id = %business_id, count = rows.len(), "Listed invoices");
        rows.into_iter()
            .map(|row| {
                let products = lines.remove(&row.id).unwrap_or_default();
                row.into_invoice(products)
            })
            .collect()
    }
}
