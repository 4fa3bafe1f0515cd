//! Invoice service.
//!
//! Settles a booking into an invoice. All checks that can fail run before
//! the settlement transaction opens; the transaction itself repeats the
//! stock check as a conditional decrement so concurrent checkouts cannot
//! oversell.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;
use trim_core::availability::local_day_bounds;
use trim_core::booking::ensure_settleable;
use trim_core::report::{revenue_report, RevenueReport};
use trim_core::settlement::{check_stock, validate_invoice_request, CreateInvoiceRequest};
use trim_core::{CoreError, Invoice, ValidationError};

use crate::error::ApiResult;
use crate::state::AppState;

pub struct InvoiceService {
    state: Arc<AppState>,
}

impl InvoiceService {
    pub fn new(state: Arc<AppState>) -> Self {
        InvoiceService { state }
    }

    /// Validates, checks stock and settles.
    ///
    /// ## Errors
    /// * `ValidationError` - malformed request
    /// * `NotFound` - unknown business, or a booking, employee or contact
    ///   not in this business
    /// * `Conflict` - booking already billed, cancelled or a no-show
    /// * `InsufficientStock` - inventory tracking on and a product runs short
    pub async fn create(&self, req: &CreateInvoiceRequest) -> ApiResult<Invoice> {
        let draft = validate_invoice_request(req)?;
        let db = &self.state.db;

        let business = db.businesses().require(&draft.business_id).await?;
        let booking = db
            .bookings()
            .get(&draft.booking_id)
            .await?
            .filter(|b| b.business_id == business.id)
            .ok_or_else(|| CoreError::not_found("Booking", &draft.booking_id))?;
        ensure_settleable(&booking.id, booking.status)?;

        db.employees()
            .get(&draft.employee_id)
            .await?
            .filter(|e| e.business_id == business.id)
            .ok_or_else(|| CoreError::not_found("Employee", &draft.employee_id))?;
        db.contacts()
            .get(&draft.contact_id)
            .await?
            .filter(|c| c.business_id == business.id)
            .ok_or_else(|| CoreError::not_found("Contact", &draft.contact_id))?;

        if business.inventory_enabled {
            let stock = db.inventory().stock_levels(&business.id).await?;
            check_stock(&draft.stock_demand(), |product_id| {
                stock.get(product_id).copied()
            })?;
        }

        let invoice = db
            .invoices()
            .settle(draft, business.inventory_enabled)
            .await?;

        info!(
            invoice_id = %invoice.id,
            booking_id = %invoice.booking_id,
            total_cents = invoice.total_cents,
            "Invoice settled"
        );
        Ok(invoice)
    }

    pub async fn list(
        &self,
        business_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ApiResult<Vec<Invoice>> {
        let (from, to) = self.range(from, to)?;
        Ok(self
            .state
            .db
            .invoices()
            .list_by_business(business_id, from, to)
            .await?)
    }

    pub async fn revenue(
        &self,
        business_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ApiResult<RevenueReport> {
        let invoices = self.list(business_id, from, to).await?;
        Ok(revenue_report(&invoices))
    }

    /// Inclusive local-date range as UTC instants `[start of from, end of to)`.
    fn range(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ApiResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(ValidationError::invalid("to", "must not be before from").into());
            }
        }
        let tz = self.state.config.business_timezone;
        Ok((
            from.map(|d| local_day_bounds(d, tz).0),
            to.map(|d| local_day_bounds(d, tz).1),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::testing::state;
    use trim_core::settlement::{MiscItemInput, ProductLineInput};
    use trim_core::{BookingStatus, PaymentMethod, ScheduleSpec};
    use trim_db::{NewBooking, ProductFields};

    struct Checkout {
        business_id: String,
        booking_id: String,
        contact_id: String,
        employee_id: String,
        service_id: String,
        product_id: String,
    }

    async fn checkout(state: &AppState, inventory: bool, stock: i64) -> Checkout {
        let db = &state.db;
        let business = db
            .businesses()
            .insert("Fade Factory", "Sam Rivera", "owner@fade.test", "hash")
            .await
            .unwrap();
        db.businesses()
            .set_inventory_enabled(&business.id, inventory)
            .await
            .unwrap();
        let service = db.services().insert(&business.id, "Haircut", 4000, 30).await.unwrap();
        let employee = db
            .employees()
            .insert(&business.id, "Alex", "alex@fade.test", None, "hash", &[], &ScheduleSpec::default())
            .await
            .unwrap();
        let contact = db
            .contacts()
            .insert(&business.id, "Jordan", "555-0101", None)
            .await
            .unwrap();
        let booking = db
            .bookings()
            .insert(NewBooking {
                business_id: business.id.clone(),
                service_id: service.id.clone(),
                employee_id: employee.id.clone(),
                contact_id: contact.id.clone(),
                booking_at: "2024-05-06T13:30:00Z".parse().unwrap(),
            })
            .await
            .unwrap();
        let product = db
            .catalog()
            .insert_product(
                &business.id,
                ProductFields {
                    category_id: None,
                    name: "Pomade".into(),
                    description: None,
                    unit: Some("jar".into()),
                    price_per_unit_cents: 1200,
                },
            )
            .await
            .unwrap();
        db.inventory()
            .set_quantity(&business.id, &product.id, stock, None)
            .await
            .unwrap();

        Checkout {
            business_id: business.id,
            booking_id: booking.id,
            contact_id: contact.id,
            employee_id: employee.id,
            service_id: service.id,
            product_id: product.id,
        }
    }

    fn request(c: &Checkout, pomades: i64) -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            business_id: Some(c.business_id.clone()),
            booking_id: Some(c.booking_id.clone()),
            contact_id: Some(c.contact_id.clone()),
            employee_id: Some(c.employee_id.clone()),
            service_ids: vec![c.service_id.clone()],
            products: vec![ProductLineInput {
                product_id: Some(c.product_id.clone()),
                name: Some("Pomade".into()),
                price_per_unit_cents: Some(1200),
                quantity: Some(pomades),
                ..Default::default()
            }],
            service_total_cents: Some(4000),
            payment_method: Some(PaymentMethod::Card),
            ..Default::default()
        }
    }

    async fn stock_of(state: &AppState, c: &Checkout) -> i64 {
        state
            .db
            .inventory()
            .get(&c.business_id, &c.product_id)
            .await
            .unwrap()
            .unwrap()
            .quantity_in_stock
    }

    #[tokio::test]
    async fn test_settle_decrements_stock() {
        let state = state().await;
        let c = checkout(&state, true, 5).await;

        let invoice = InvoiceService::new(state.clone())
            .create(&request(&c, 2))
            .await
            .unwrap();

        assert_eq!(invoice.products_total_cents, 2400);
        assert_eq!(stock_of(&state, &c).await, 3);
        let booking = state.db.bookings().require(&c.booking_id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Billed);
    }

    #[tokio::test]
    async fn test_short_stock_writes_nothing() {
        let state = state().await;
        let c = checkout(&state, true, 2).await;

        let err = InvoiceService::new(state.clone())
            .create(&request(&c, 3))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("Requested: 3, Available: 2"));
        assert_eq!(stock_of(&state, &c).await, 2);
        assert!(state
            .db
            .invoices()
            .list_by_business(&c.business_id, None, None)
            .await
            .unwrap()
            .is_empty());
        let booking = state.db.bookings().require(&c.booking_id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_inventory_off_ignores_stock() {
        let state = state().await;
        let c = checkout(&state, false, 1).await;

        InvoiceService::new(state.clone())
            .create(&request(&c, 4))
            .await
            .unwrap();
        assert_eq!(stock_of(&state, &c).await, 1);
    }

    #[tokio::test]
    async fn test_totals_with_misc_tax_and_tip() {
        let state = state().await;
        let c = checkout(&state, false, 0).await;

        let mut req = request(&c, 1);
        req.products.clear();
        req.misc_items = vec![MiscItemInput {
            name: Some("Shampoo".into()),
            price_cents: Some(500),
        }];
        req.tax_percent = Some(10.0);
        req.tip_cents = Some(500);

        let invoice = InvoiceService::new(state.clone()).create(&req).await.unwrap();
        assert_eq!(invoice.service_total_cents, 4000);
        assert_eq!(invoice.misc_total_cents, 500);
        assert_eq!(invoice.tax_cents, 450);
        assert_eq!(invoice.total_cents, 5450);
        assert_eq!(invoice.tax_rate_bps, 1000);
    }

    #[tokio::test]
    async fn test_billed_booking_cannot_settle_twice() {
        let state = state().await;
        let c = checkout(&state, false, 0).await;
        let service = InvoiceService::new(state.clone());

        service.create(&request(&c, 1)).await.unwrap();
        let err = service.create(&request(&c, 1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_unknown_business_or_foreign_booking() {
        let state = state().await;
        let c = checkout(&state, false, 0).await;
        let service = InvoiceService::new(state.clone());

        let mut req = request(&c, 1);
        req.business_id = Some("missing".into());
        assert_eq!(service.create(&req).await.unwrap_err().code, ErrorCode::NotFound);

        let other = state
            .db
            .businesses()
            .insert("Other", "Kim", "kim@other.test", "hash")
            .await
            .unwrap();
        let mut req = request(&c, 1);
        req.business_id = Some(other.id);
        assert_eq!(service.create(&req).await.unwrap_err().code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_employee_and_contact_must_belong_to_business() {
        let state = state().await;
        let c = checkout(&state, false, 0).await;
        let service = InvoiceService::new(state.clone());

        let mut req = request(&c, 1);
        req.employee_id = Some("ghost".into());
        let err = service.create(&req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("Employee"));

        let other = state
            .db
            .businesses()
            .insert("Other", "Kim", "kim@other.test", "hash")
            .await
            .unwrap();
        let stranger = state
            .db
            .contacts()
            .insert(&other.id, "Casey", "555-0199", None)
            .await
            .unwrap();
        let mut req = request(&c, 1);
        req.contact_id = Some(stranger.id);
        let err = service.create(&req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("Contact"));

        let booking = state.db.bookings().require(&c.booking_id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        service.create(&request(&c, 1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_revenue_over_range() {
        let state = state().await;
        let c = checkout(&state, false, 0).await;
        let service = InvoiceService::new(state.clone());
        service.create(&request(&c, 1)).await.unwrap();

        let report = service.revenue(&c.business_id, None, None).await.unwrap();
        assert_eq!(report.invoice_count, 1);
        assert_eq!(report.service_total_cents, 4000);
        assert_eq!(report.products_total_cents, 1200);
        assert_eq!(report.by_employee[0].employee_id, c.employee_id);

        let long_ago = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let report = service
            .revenue(&c.business_id, Some(long_ago), Some(long_ago))
            .await
            .unwrap();
        assert_eq!(report.invoice_count, 0);

        let err = service
            .revenue(&c.business_id, Some(long_ago.succ_opt().unwrap()), Some(long_ago))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
