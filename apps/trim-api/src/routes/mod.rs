//! REST routes.
//!
//! ```text
//! /health                                   public
//! /api/auth/*                               public
//! /api/businesses/{id}/schedule      GET    public
//! /api/services                      GET    public
//! /api/services/{id}                 GET    public
//! /api/employees/{id}/schedule       GET    public
//! /api/bookings                      POST   public
//! /api/bookings/booked-slots         GET    public
//! /api/bookings/available-slots      GET    public
//! everything else                           Bearer token
//! ```
//!
//! Authenticated routes take a [`CurrentUser`] and only ever touch rows of
//! the caller's business.

mod auth;
mod bookings;
mod businesses;
mod catalog;
mod contacts;
mod employees;
mod health;
mod inventory;
mod invoices;
mod reports;
mod services;

use axum::routing::{get, post, put};
use axum::Router;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use trim_core::schedule::parse_calendar_date;
use trim_core::validation::non_blank;
use trim_core::ValidationError;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// All API routes, sharing `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/employee-login", post(auth::employee_login))
        .route(
            "/api/businesses/{id}/schedule",
            get(businesses::get_schedule).put(businesses::save_schedule),
        )
        .route(
            "/api/businesses/{id}/disabled-dates",
            put(businesses::set_disabled_dates),
        )
        .route(
            "/api/businesses/{id}/inventory-status",
            get(businesses::inventory_status).put(businesses::set_inventory_status),
        )
        .route(
            "/api/services",
            get(services::list_services).post(services::create_service),
        )
        .route("/api/services/bulk-delete", post(services::bulk_delete_services))
        .route(
            "/api/services/{id}",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        )
        .route(
            "/api/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route("/api/employees/bulk-delete", post(employees::bulk_delete_employees))
        .route(
            "/api/employees/{id}",
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::delete_employee),
        )
        .route(
            "/api/employees/{id}/disabled-dates",
            put(employees::set_disabled_dates),
        )
        .route("/api/employees/{id}/schedule", get(employees::get_schedule))
        .route(
            "/api/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/api/bookings/booked-slots", get(bookings::booked_slots))
        .route("/api/bookings/available-slots", get(bookings::available_slots))
        .route("/api/bookings/{id}/status", put(bookings::update_status))
        .route("/api/bookings/{id}/services", put(bookings::update_services))
        .route(
            "/api/contacts",
            get(contacts::list_contacts).post(contacts::create_contact),
        )
        .route(
            "/api/contacts/{id}",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
        .route(
            "/api/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/api/categories/{id}",
            put(catalog::update_category).delete(catalog::delete_category),
        )
        .route(
            "/api/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route("/api/products/search", get(catalog::search_products))
        .route(
            "/api/products/{id}",
            put(catalog::update_product).delete(catalog::delete_product),
        )
        .route(
            "/api/inventory",
            get(inventory::list_inventory).put(inventory::set_quantity),
        )
        .route("/api/inventory/sync", post(inventory::sync_inventory))
        .route(
            "/api/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route("/api/reports/revenue", get(reports::revenue))
        .with_state(state)
}

/// `?businessId=` on list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessQuery {
    pub business_id: Option<String>,
}

impl BusinessQuery {
    /// The requested business, defaulting to the caller's own.
    pub fn scoped(&self, user: &CurrentUser) -> ApiResult<String> {
        let business_id = self
            .business_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(&user.business_id)
            .to_string();
        user.ensure_business(&business_id)?;
        Ok(business_id)
    }

    /// The requested business on public endpoints, where it is mandatory.
    pub fn required(&self) -> ApiResult<String> {
        Ok(non_blank(self.business_id.as_deref(), "businessId")?)
    }
}

/// `?from=&to=` calendar dates, both optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateRangeQuery {
    pub business_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl DateRangeQuery {
    pub fn dates(&self) -> ApiResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        Ok((optional_date(self.from.as_deref())?, optional_date(self.to.as_deref())?))
    }

    pub fn business(&self) -> BusinessQuery {
        BusinessQuery {
            business_id: self.business_id.clone(),
        }
    }
}

fn optional_date(raw: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Ok(Some(parse_calendar_date(raw)?)),
        None => Ok(None),
    }
}

/// Body of the disabled-dates endpoints. Accepts plain dates or full ISO
/// instants; blank entries are dropped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisabledDatesRequest {
    pub disabled_dates: Vec<String>,
}

impl DisabledDatesRequest {
    pub fn dates(&self) -> ApiResult<BTreeSet<NaiveDate>> {
        let mut dates = BTreeSet::new();
        for raw in &self.disabled_dates {
            if let Some(date) = optional_date(Some(raw))? {
                dates.insert(date);
            }
        }
        Ok(dates)
    }
}

/// Largest id list a bulk delete accepts.
pub const MAX_BULK_IDS: usize = 200;

/// Body of the bulk-delete endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkDeleteRequest {
    pub ids: Option<Vec<String>>,
}

impl BulkDeleteRequest {
    /// The id list, trimmed with blanks dropped. The list itself is required.
    pub fn ids(&self) -> ApiResult<Vec<String>> {
        let ids = self
            .ids
            .as_ref()
            .ok_or_else(|| ValidationError::required("ids"))?;
        if ids.len() > MAX_BULK_IDS {
            return Err(ValidationError::invalid(
                "ids",
                format!("at most {MAX_BULK_IDS} ids per request"),
            )
            .into());
        }
        Ok(ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Count returned by the bulk-delete endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

/// Trims optional text, treating blank as absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    /// Sends one request through the router and returns status and JSON body.
    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    /// Registers an owner and returns (token, business id).
    pub async fn owner(app: &Router, email: &str) -> (String, String) {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(serde_json::json!({
                "businessName": "Fade Factory",
                "name": "Sam Rivera",
                "email": email,
                "password": "password123",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["token"].as_str().unwrap().to_string(),
            body["businessId"].as_str().unwrap().to_string(),
        )
    }
}
