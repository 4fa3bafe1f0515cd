//! # Invoice Settlement
//!
//! Pure half of checkout: validates a create-invoice request, snapshots the
//! product lines, computes totals and checks stock. Persisting the invoice,
//! decrementing stock and billing the booking happen together in one
//! database transaction in trim-db.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CreateInvoiceRequest                                                   │
//! │       │ validate_invoice_request()                                      │
//! │       │   businessId → bookingId → contactId → employeeId → serviceIds  │
//! │       │   → no dollar-named amounts → product lines → checked totals    │
//! │       ▼                                                                 │
//! │  InvoiceDraft ──► stock_demand() ──► check_stock()   (inventory on)     │
//! │       │                                  │ all lines, before any write  │
//! │       ▼                                  ▼                              │
//! │  totals: services + misc + products ──► tax ──► + tip ──► total         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  into_invoice() ──► trim-db commits invoice + stock + Billed            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `serviceTotalCents` is taken from the caller. `productsTotalCents` is
//! always recomputed from the submitted lines. `miscTotalCents` is computed
//! from the misc items and, when the caller sends one, must match.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::booking::sanitize_service_ids;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Invoice, InvoiceLine, InvoiceStatus, MiscItem, PaymentMethod, TaxRate};
use crate::validation::{
    non_blank, validate_price_cents, validate_quantity, validate_tax_percent, ValidationResult,
};

// =============================================================================
// Request
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct MiscItemInput {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ProductLineInput {
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub price_per_unit_cents: Option<i64>,
    pub quantity: Option<i64>,
    /// Dollar-denominated name, refused so it cannot be read as cents.
    #[serde(rename = "price_per_unit")]
    #[ts(skip)]
    pub legacy_price: Option<IgnoredAny>,
}

/// Checkout request as sent by the dashboard.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CreateInvoiceRequest {
    pub business_id: Option<String>,
    pub booking_id: Option<String>,
    pub contact_id: Option<String>,
    pub employee_id: Option<String>,
    pub service_ids: Vec<String>,
    pub misc_items: Vec<MiscItemInput>,
    pub products: Vec<ProductLineInput>,
    /// Percentage, e.g. `8.25`. Defaults to 0.
    pub tax_percent: Option<f64>,
    /// Defaults to 0.
    pub tip_cents: Option<i64>,
    pub service_total_cents: Option<i64>,
    pub misc_total_cents: Option<i64>,
    pub payment_method: Option<PaymentMethod>,
    /// Defaults to `Paid`.
    pub status: Option<InvoiceStatus>,
    /// Dollar-denominated names, refused so they cannot be read as cents.
    #[ts(skip)]
    pub tip_amount: Option<IgnoredAny>,
    #[ts(skip)]
    pub service_total: Option<IgnoredAny>,
}

// =============================================================================
// Draft
// =============================================================================

/// A validated checkout, ready for stock checks and persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub business_id: String,
    pub booking_id: String,
    pub contact_id: String,
    pub employee_id: String,
    pub service_ids: Vec<String>,
    pub misc_items: Vec<MiscItem>,
    pub lines: Vec<InvoiceLine>,
    pub tax_rate: TaxRate,
    pub tip: Money,
    pub service_total: Money,
    pub payment_method: PaymentMethod,
    pub status: InvoiceStatus,
    pub totals: InvoiceTotals,
}

/// Stored invoice amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceTotals {
    pub service_total: Money,
    pub misc_total: Money,
    pub products_total: Money,
    pub tax: Money,
    pub tip: Money,
    pub total: Money,
}

impl InvoiceTotals {
    /// `tax = (service + misc + products) × rate`, `total = subtotal + tax + tip`.
    ///
    /// `None` when any sum leaves the `i64` cent range.
    pub fn compute(
        service_total: Money,
        misc_total: Money,
        products_total: Money,
        tax_rate: TaxRate,
        tip: Money,
    ) -> Option<Self> {
        let taxable = Money::checked_sum([service_total, misc_total, products_total])?;
        let tax = taxable.calculate_tax(tax_rate);
        Some(InvoiceTotals {
            service_total,
            misc_total,
            products_total,
            tax,
            tip,
            total: Money::checked_sum([taxable, tax, tip])?,
        })
    }
}

/// Quantity of one product needed by an invoice, summed across lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDemand {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
}

impl InvoiceDraft {
    /// Per-product demand in first-seen order.
    pub fn stock_demand(&self) -> Vec<StockDemand> {
        let mut demand: Vec<StockDemand> = Vec::new();
        for line in &self.lines {
            match demand.iter_mut().find(|d| d.product_id == line.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity)
                }
                None => demand.push(StockDemand {
                    product_id: line.product_id.clone(),
                    name: line.name.clone(),
                    quantity: line.quantity,
                }),
            }
        }
        demand
    }

    /// Builds the invoice record with its computed totals.
    pub fn into_invoice(self, id: String, created_at: DateTime<Utc>) -> Invoice {
        let totals = self.totals;
        Invoice {
            id,
            business_id: self.business_id,
            booking_id: self.booking_id,
            contact_id: self.contact_id,
            employee_id: self.employee_id,
            service_ids: self.service_ids,
            misc_items: self.misc_items,
            products: self.lines,
            tax_rate_bps: self.tax_rate.bps(),
            service_total_cents: totals.service_total.cents(),
            misc_total_cents: totals.misc_total.cents(),
            products_total_cents: totals.products_total.cents(),
            tax_cents: totals.tax.cents(),
            tip_cents: totals.tip.cents(),
            total_cents: totals.total.cents(),
            payment_method: self.payment_method,
            status: self.status,
            created_at,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validates a checkout request into an [`InvoiceDraft`].
///
/// Identity fields are checked first, in the order businessId, bookingId,
/// contactId, employeeId, serviceIds. Every product line must then carry
/// productId, name, pricePerUnitCents and quantity; one incomplete line
/// fails the whole request. Amounts whose line totals or invoice total
/// overflow are rejected as out of range.
pub fn validate_invoice_request(req: &CreateInvoiceRequest) -> ValidationResult<InvoiceDraft> {
    let business_id = non_blank(req.business_id.as_deref(), "businessId")?;
    let booking_id = non_blank(req.booking_id.as_deref(), "bookingId")?;
    let contact_id = non_blank(req.contact_id.as_deref(), "contactId")?;
    let employee_id = non_blank(req.employee_id.as_deref(), "employeeId")?;

    let service_ids = sanitize_service_ids(&req.service_ids);
    if service_ids.is_empty() {
        return Err(ValidationError::required("serviceIds"));
    }

    reject_dollar_field(req.tip_amount, "tipAmount", "tipCents")?;
    reject_dollar_field(req.service_total, "serviceTotal", "serviceTotalCents")?;
    for (i, line) in req.products.iter().enumerate() {
        reject_dollar_field(
            line.legacy_price,
            &format!("products[{i}].price_per_unit"),
            "pricePerUnitCents",
        )?;
    }

    let lines = req
        .products
        .iter()
        .enumerate()
        .map(|(i, line)| product_line(i, line))
        .collect::<ValidationResult<Vec<_>>>()?;

    let misc_items = req
        .misc_items
        .iter()
        .enumerate()
        .map(|(i, item)| misc_item(i, item))
        .collect::<ValidationResult<Vec<_>>>()?;

    let tax_percent = req.tax_percent.unwrap_or(0.0);
    validate_tax_percent(tax_percent)?;

    let tip_cents = req.tip_cents.unwrap_or(0);
    validate_price_cents(tip_cents, "tipCents")?;

    let service_total_cents = req
        .service_total_cents
        .ok_or_else(|| ValidationError::required("serviceTotalCents"))?;
    validate_price_cents(service_total_cents, "serviceTotalCents")?;

    let payment_method = req
        .payment_method
        .ok_or_else(|| ValidationError::required("paymentMethod"))?;

    let misc_total =
        Money::checked_sum(misc_items.iter().map(|m| Money::from_cents(m.price_cents)))
            .ok_or_else(|| out_of_range("miscTotalCents"))?;
    if let Some(supplied) = req.misc_total_cents {
        if supplied != misc_total.cents() {
            return Err(ValidationError::Mismatch {
                field: "miscTotalCents".to_string(),
                supplied,
                computed: misc_total.cents(),
            });
        }
    }

    let products_total =
        Money::checked_sum(lines.iter().map(|l| Money::from_cents(l.line_total_cents)))
            .ok_or_else(|| out_of_range("productsTotalCents"))?;

    let tax_rate = TaxRate::from_percentage(tax_percent);
    let tip = Money::from_cents(tip_cents);
    let service_total = Money::from_cents(service_total_cents);
    let totals = InvoiceTotals::compute(service_total, misc_total, products_total, tax_rate, tip)
        .ok_or_else(|| out_of_range("totalCents"))?;

    Ok(InvoiceDraft {
        business_id,
        booking_id,
        contact_id,
        employee_id,
        service_ids,
        misc_items,
        lines,
        tax_rate,
        tip,
        service_total,
        payment_method,
        status: req.status.unwrap_or_default(),
        totals,
    })
}

/// Amounts travel as integer cents only.
fn reject_dollar_field(
    value: Option<IgnoredAny>,
    field: &str,
    cents_field: &str,
) -> ValidationResult<()> {
    match value {
        Some(_) => Err(ValidationError::invalid(
            field,
            format!("amounts are integer cents, send {cents_field}"),
        )),
        None => Ok(()),
    }
}

fn out_of_range(field: impl Into<String>) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.into(),
        min: 0,
        max: i64::MAX,
    }
}

fn product_line(index: usize, line: &ProductLineInput) -> ValidationResult<InvoiceLine> {
    let field = |name: &str| format!("products[{index}].{name}");

    let product_id = non_blank(line.product_id.as_deref(), &field("productId"))?;
    let name = non_blank(line.name.as_deref(), &field("name"))?;
    let price = line
        .price_per_unit_cents
        .ok_or_else(|| ValidationError::required(field("pricePerUnitCents")))?;
    let quantity = line
        .quantity
        .ok_or_else(|| ValidationError::required(field("quantity")))?;

    validate_price_cents(price, &field("pricePerUnitCents"))?;
    validate_quantity(quantity, &field("quantity"))?;
    let line_total = Money::from_cents(price)
        .checked_mul(quantity)
        .ok_or_else(|| out_of_range(field("quantity")))?;

    Ok(InvoiceLine {
        product_id,
        name,
        price_per_unit_cents: price,
        quantity,
        line_total_cents: line_total.cents(),
    })
}

fn misc_item(index: usize, item: &MiscItemInput) -> ValidationResult<MiscItem> {
    let field = |name: &str| format!("miscItems[{index}].{name}");

    let name = non_blank(item.name.as_deref(), &field("name"))?;
    let price_cents = item
        .price_cents
        .ok_or_else(|| ValidationError::required(field("priceCents")))?;
    validate_price_cents(price_cents, &field("priceCents"))?;

    Ok(MiscItem { name, price_cents })
}

// =============================================================================
// Stock Check
// =============================================================================

/// Checks every demanded product against available stock before anything
/// is written. `available` returns `None` when there is no inventory
/// record, which counts as zero.
pub fn check_stock<F>(demand: &[StockDemand], available: F) -> CoreResult<()>
where
    F: Fn(&str) -> Option<i64>,
{
    for need in demand {
        let in_stock = available(&need.product_id).unwrap_or(0);
        if in_stock < need.quantity {
            return Err(CoreError::InsufficientStock {
                product: need.name.clone(),
                requested: need.quantity,
                available: in_stock,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_request() -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            business_id: Some("biz".into()),
            booking_id: Some("bk".into()),
            contact_id: Some("ct".into()),
            employee_id: Some("emp".into()),
            service_ids: vec!["svc".into()],
            service_total_cents: Some(4000),
            payment_method: Some(PaymentMethod::Cash),
            ..Default::default()
        }
    }

    fn pomade(quantity: i64) -> ProductLineInput {
        ProductLineInput {
            product_id: Some("prod-pomade".into()),
            name: Some("Pomade".into()),
            price_per_unit_cents: Some(1250),
            quantity: Some(quantity),
            ..Default::default()
        }
    }

    #[test]
    fn test_shampoo_scenario_totals() {
        let mut req = base_request();
        req.misc_items = vec![MiscItemInput {
            name: Some("Shampoo".into()),
            price_cents: Some(500),
        }];
        req.tax_percent = Some(10.0);
        req.tip_cents = Some(500);

        let totals = validate_invoice_request(&req).unwrap().totals;
        assert_eq!(totals.service_total.cents(), 4000);
        assert_eq!(totals.misc_total.cents(), 500);
        assert_eq!(totals.products_total.cents(), 0);
        assert_eq!(totals.tax.cents(), 450);
        assert_eq!(totals.total.cents(), 5450);
    }

    #[test]
    fn test_products_total_recomputed() {
        let mut req = base_request();
        req.products = vec![pomade(2)];

        let draft = validate_invoice_request(&req).unwrap();
        assert_eq!(draft.lines[0].line_total_cents, 2500);
        assert_eq!(draft.totals.products_total.cents(), 2500);
        assert_eq!(draft.totals.total.cents(), 6500);
    }

    #[test]
    fn test_line_total_overflow_rejected() {
        let mut req = base_request();
        let mut bulk = pomade(3);
        bulk.price_per_unit_cents = Some(i64::MAX / 2);
        req.products = vec![bulk];

        let err = validate_invoice_request(&req).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
        assert_eq!(err.field(), "products[0].quantity");
    }

    #[test]
    fn test_invoice_total_overflow_rejected() {
        let mut req = base_request();
        req.service_total_cents = Some(i64::MAX - 100);
        req.tip_cents = Some(500);
        let err = validate_invoice_request(&req).unwrap_err();
        assert_eq!(err.field(), "totalCents");

        let mut req = base_request();
        let mut line = pomade(1);
        line.price_per_unit_cents = Some(i64::MAX);
        req.products = vec![line.clone(), line];
        let err = validate_invoice_request(&req).unwrap_err();
        assert_eq!(err.field(), "productsTotalCents");

        let mut req = base_request();
        req.misc_items = vec![
            MiscItemInput {
                name: Some("Towel".into()),
                price_cents: Some(i64::MAX),
            },
            MiscItemInput {
                name: Some("Wax".into()),
                price_cents: Some(1),
            },
        ];
        let err = validate_invoice_request(&req).unwrap_err();
        assert_eq!(err.field(), "miscTotalCents");
    }

    #[test]
    fn test_tax_pushes_total_out_of_range() {
        let mut req = base_request();
        req.service_total_cents = Some(i64::MAX / 10 * 6);
        req.tax_percent = Some(100.0);
        let err = validate_invoice_request(&req).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn test_identity_fields_checked_in_order() {
        let req = CreateInvoiceRequest::default();
        assert_eq!(validate_invoice_request(&req).unwrap_err().field(), "businessId");

        let mut req = base_request();
        req.contact_id = None;
        req.employee_id = None;
        assert_eq!(validate_invoice_request(&req).unwrap_err().field(), "contactId");

        let mut req = base_request();
        req.service_ids = vec!["  ".into()];
        assert_eq!(validate_invoice_request(&req).unwrap_err().field(), "serviceIds");
    }

    #[test]
    fn test_incomplete_product_line_fails_request() {
        let mut req = base_request();
        let mut broken = pomade(1);
        broken.price_per_unit_cents = None;
        req.products = vec![pomade(1), broken];

        let err = validate_invoice_request(&req).unwrap_err();
        assert_eq!(err.field(), "products[1].pricePerUnitCents");
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut req = base_request();
        req.products = vec![pomade(0)];
        assert!(matches!(
            validate_invoice_request(&req),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_misc_total_must_match_items() {
        let mut req = base_request();
        req.misc_items = vec![MiscItemInput {
            name: Some("Towel".into()),
            price_cents: Some(300),
        }];
        req.misc_total_cents = Some(300);
        assert!(validate_invoice_request(&req).is_ok());

        req.misc_total_cents = Some(700);
        assert!(matches!(
            validate_invoice_request(&req),
            Err(ValidationError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_dollar_field_names_rejected() {
        let req: CreateInvoiceRequest = serde_json::from_str(
            r#"{"businessId":"biz","bookingId":"bk","contactId":"ct","employeeId":"emp",
                "serviceIds":["svc"],"serviceTotalCents":4000,"paymentMethod":"cash",
                "tipAmount":5.0}"#,
        )
        .unwrap();
        let err = validate_invoice_request(&req).unwrap_err();
        assert_eq!(err.field(), "tipAmount");
        assert!(err.to_string().contains("tipCents"));

        let req: CreateInvoiceRequest = serde_json::from_str(
            r#"{"businessId":"biz","bookingId":"bk","contactId":"ct","employeeId":"emp",
                "serviceIds":["svc"],"serviceTotalCents":4000,"paymentMethod":"cash",
                "products":[{"productId":"p","name":"Pomade","price_per_unit":12.5,"quantity":1}]}"#,
        )
        .unwrap();
        let err = validate_invoice_request(&req).unwrap_err();
        assert_eq!(err.field(), "products[0].price_per_unit");

        let req: CreateInvoiceRequest = serde_json::from_str(
            r#"{"businessId":"biz","bookingId":"bk","contactId":"ct","employeeId":"emp",
                "serviceIds":["svc"],"serviceTotalCents":4000,"paymentMethod":"cash",
                "tipCents":500}"#,
        )
        .unwrap();
        assert_eq!(validate_invoice_request(&req).unwrap().tip.cents(), 500);
    }

    #[test]
    fn test_defaults() {
        let draft = validate_invoice_request(&base_request()).unwrap();
        assert_eq!(draft.tax_rate, TaxRate::zero());
        assert!(draft.tip.is_zero());
        assert_eq!(draft.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let mut req = base_request();
        req.service_total_cents = Some(-1);
        assert!(validate_invoice_request(&req).is_err());

        let mut req = base_request();
        req.tip_cents = Some(-100);
        assert!(validate_invoice_request(&req).is_err());
    }

    #[test]
    fn test_stock_demand_sums_repeated_products() {
        let mut req = base_request();
        req.products = vec![pomade(1), pomade(2)];
        let demand = validate_invoice_request(&req).unwrap().stock_demand();
        assert_eq!(demand.len(), 1);
        assert_eq!(demand[0].quantity, 3);
    }

    #[test]
    fn test_check_stock_reports_shortfall() {
        let demand = vec![StockDemand {
            product_id: "prod-pomade".into(),
            name: "Pomade".into(),
            quantity: 3,
        }];
        let stock: HashMap<&str, i64> = [("prod-pomade", 2)].into_iter().collect();

        let err = check_stock(&demand, |id| stock.get(id).copied()).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                product,
                requested,
                available,
            } => {
                assert_eq!(product, "Pomade");
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_stock_missing_record_counts_as_zero() {
        let demand = vec![StockDemand {
            product_id: "ghost".into(),
            name: "Ghost".into(),
            quantity: 1,
        }];
        let err = check_stock(&demand, |_| None).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { available: 0, .. }));
    }

    #[test]
    fn test_into_invoice_snapshots() {
        let mut req = base_request();
        req.products = vec![pomade(2)];
        req.tax_percent = Some(10.0);
        let invoice = validate_invoice_request(&req)
            .unwrap()
            .into_invoice("inv-1".into(), Utc::now());

        assert_eq!(invoice.products[0].name, "Pomade");
        assert_eq!(invoice.products_total_cents, 2500);
        assert_eq!(invoice.tax_cents, 650);
        assert_eq!(invoice.total_cents, 7150);
        assert_eq!(invoice.tax_rate_bps, 1000);
    }
}
