//! Booking endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use trim_core::booking::{sanitize_service_ids, BookingRequest};
use trim_core::schedule::parse_calendar_date;
use trim_core::validation::non_blank;
use trim_core::{Booking, BookingStatus, CoreError, TimeOfDay};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::services::booking_service::BookingService;
use crate::state::AppState;

/// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<BookingRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let booking = BookingService::new(state).create(&req).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListBookingsQuery {
    pub business_id: Option<String>,
    pub employee_id: Option<String>,
}

/// GET /api/bookings?businessId= | ?employeeId=
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<ListBookingsQuery>,
) -> ApiResult<Json<Vec<Booking>>> {
    let repo = state.db.bookings();
    let bookings = match query.employee_id.as_deref().filter(|id| !id.trim().is_empty()) {
        Some(employee_id) => {
            let employee = state.db.employees().require(employee_id).await?;
            user.ensure_business(&employee.business_id)?;
            repo.list_by_employee(employee_id).await?
        }
        None => {
            let business_id = super::BusinessQuery {
                business_id: query.business_id,
            }
            .scoped(&user)?;
            repo.list_by_business(&business_id).await?
        }
    };
    Ok(Json(bookings))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlotQuery {
    pub employee_id: Option<String>,
    pub date: Option<String>,
}

/// GET /api/bookings/booked-slots?employeeId=&date=
pub async fn booked_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotQuery>,
) -> ApiResult<Json<Vec<TimeOfDay>>> {
    let employee_id = non_blank(query.employee_id.as_deref(), "employeeId")?;
    let date = parse_calendar_date(&non_blank(query.date.as_deref(), "date")?)?;
    let booked = BookingService::new(state)
        .booked_slots(&employee_id, date)
        .await?;
    Ok(Json(booked.into_iter().collect()))
}

/// GET /api/bookings/available-slots?employeeId=&date=
pub async fn available_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotQuery>,
) -> ApiResult<Json<Vec<TimeOfDay>>> {
    let employee_id = non_blank(query.employee_id.as_deref(), "employeeId")?;
    let date = parse_calendar_date(&non_blank(query.date.as_deref(), "date")?)?;
    let slots = BookingService::new(state)
        .available_slots(&employee_id, date)
        .await?;
    Ok(Json(slots))
}

async fn owned_booking(state: &AppState, user: &CurrentUser, id: &str) -> ApiResult<Booking> {
    let booking = state
        .db
        .bookings()
        .get(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Booking", id))?;
    user.ensure_business(&booking.business_id)?;
    Ok(booking)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusRequest {
    pub status: Option<String>,
}

/// PUT /api/bookings/{id}/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> ApiResult<Json<Booking>> {
    let requested: BookingStatus = non_blank(req.status.as_deref(), "status")?.parse()?;
    owned_booking(&state, &user, &id).await?;
    Ok(Json(state.db.bookings().update_status(&id, requested).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServicesRequest {
    pub service_ids: Vec<String>,
    pub status: Option<String>,
}

/// PUT /api/bookings/{id}/services
///
/// Checkout assembly: the services actually performed, and optionally the
/// next status.
pub async fn update_services(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ServicesRequest>,
) -> ApiResult<Json<Booking>> {
    let status = match req.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<BookingStatus>()?),
        None => None,
    };
    owned_booking(&state, &user, &id).await?;

    let booking = state
        .db
        .bookings()
        .update_services(&id, sanitize_service_ids(&req.service_ids), status)
        .await?;
    Ok(Json(booking))
}
