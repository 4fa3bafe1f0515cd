//! Invoice endpoints

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use trim_core::settlement::CreateInvoiceRequest;
use trim_core::Invoice;

use super::{optional_text, DateRangeQuery};
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::services::invoice_service::InvoiceService;
use crate::state::AppState;

/// GET /api/invoices?from=&to=
pub async fn list_invoices(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<DateRangeQuery>,
) -> ApiResult<Json<Vec<Invoice>>> {
    let business_id = query.business().scoped(&user)?;
    let (from, to) = query.dates()?;
    let invoices = InvoiceService::new(state)
        .list(&business_id, from, to)
        .await?;
    Ok(Json(invoices))
}

/// POST /api/invoices
///
/// Checkout. `businessId` defaults to the caller's business.
pub async fn create_invoice(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(mut req): ApiJson<CreateInvoiceRequest>,
) -> ApiResult<(StatusCode, Json<Invoice>)> {
    let business_id =
        optional_text(req.business_id.take()).unwrap_or_else(|| user.business_id.clone());
    user.ensure_business(&business_id)?;
    req.business_id = Some(business_id);

    let invoice = InvoiceService::new(state).create(&req).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::routes::testing::{owner, send};
    use crate::state::testing::state;
    use axum::http::{Method, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};

    pub(crate) struct Sale {
        pub token: String,
        pub booking: Value,
        pub service_id: String,
        pub product_id: String,
    }

    /// A shop with one booking, one product stocked at 2 and inventory on.
    pub(crate) async fn sale(app: &Router) -> Sale {
        let (token, business_id) = owner(app, "owner@fade.test").await;
        let (_, service) = send(
            app,
            Method::POST,
            "/api/services",
            Some(&token),
            Some(json!({ "name": "Haircut", "priceCents": 4000, "durationMinutes": 30 })),
        )
        .await;
        let service_id = service["id"].as_str().unwrap().to_string();
        let (_, employee) = send(
            app,
            Method::POST,
            "/api/employees",
            Some(&token),
            Some(json!({
                "name": "Alex",
                "email": "alex@fade.test",
                "password": "clippers99",
                "serviceIds": [service_id],
            })),
        )
        .await;
        let (status, booking) = send(
            app,
            Method::POST,
            "/api/bookings",
            None,
            Some(json!({
                "serviceId": service_id,
                "employeeId": employee["id"],
                "bookingDateTime": "2024-05-06T15:00:00.000Z",
                "contact": { "name": "Jordan", "phone": "555-0101" },
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{booking}");

        let (_, product) = send(
            app,
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({ "name": "Pomade", "pricePerUnitCents": 1200 })),
        )
        .await;
        let product_id = product["id"].as_str().unwrap().to_string();
        send(
            app,
            Method::PUT,
            "/api/inventory",
            Some(&token),
            Some(json!({ "productId": product_id, "quantity": 2 })),
        )
        .await;
        send(
            app,
            Method::PUT,
            &format!("/api/businesses/{business_id}/inventory-status"),
            Some(&token),
            Some(json!({ "inventoryEnabled": true })),
        )
        .await;

        Sale {
            token,
            booking,
            service_id,
            product_id,
        }
    }

    pub(crate) fn checkout(sale: &Sale, quantity: i64) -> Value {
        json!({
            "bookingId": sale.booking["id"],
            "contactId": sale.booking["contactId"],
            "employeeId": sale.booking["employeeId"],
            "serviceIds": [sale.service_id],
            "serviceTotalCents": 4000,
            "products": [{
                "productId": sale.product_id,
                "name": "Pomade",
                "pricePerUnitCents": 1200,
                "quantity": quantity,
            }],
            "taxPercent": 10,
            "tipCents": 500,
            "paymentMethod": "card",
        })
    }

    #[tokio::test]
    async fn test_checkout_over_http() {
        let app = crate::app(state().await);
        let sale = sale(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/invoices",
            Some(&sale.token),
            Some(checkout(&sale, 3)),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");
        assert!(body["message"].as_str().unwrap().contains("Available: 2"));

        let (status, invoice) = send(
            &app,
            Method::POST,
            "/api/invoices",
            Some(&sale.token),
            Some(checkout(&sale, 2)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{invoice}");
        assert_eq!(invoice["productsTotalCents"], 2400);
        assert_eq!(invoice["taxCents"], 640);
        assert_eq!(invoice["totalCents"], 7540);

        let (_, stock) = send(&app, Method::GET, "/api/inventory", Some(&sale.token), None).await;
        assert_eq!(stock[0]["quantityInStock"], 0);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/invoices",
            Some(&sale.token),
            Some(checkout(&sale, 0)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, list) = send(&app, Method::GET, "/api/invoices", Some(&sale.token), None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cannot_bill_other_business() {
        let app = crate::app(state().await);
        let sale = sale(&app).await;
        let (intruder, _) = owner(&app, "owner@other.test").await;

        let mut body = checkout(&sale, 1);
        body["businessId"] = sale.booking["businessId"].clone();
        let (status, _) =
            send(&app, Method::POST, "/api/invoices", Some(&intruder), Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/invoices",
            Some(&intruder),
            Some(checkout(&sale, 1)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
    }
}
