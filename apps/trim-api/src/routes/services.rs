//! Service menu endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use trim_core::validation::{validate_duration_minutes, validate_name, validate_price_cents};
use trim_core::{CoreError, Service, ValidationError};

use super::{BulkDeleteRequest, BulkDeleteResponse, BusinessQuery};
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

/// GET /api/services?businessId=
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BusinessQuery>,
) -> ApiResult<Json<Vec<Service>>> {
    let business_id = query.required()?;
    Ok(Json(state.db.services().list_by_business(&business_id).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceRequest {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub duration_minutes: Option<i64>,
}

struct ValidService {
    name: String,
    price_cents: i64,
    duration_minutes: i64,
}

impl ServiceRequest {
    fn validate(&self) -> ApiResult<ValidService> {
        let name = validate_name(self.name.as_deref().unwrap_or_default(), "name")?;
        let price_cents = self
            .price_cents
            .ok_or_else(|| ValidationError::required("priceCents"))?;
        validate_price_cents(price_cents, "priceCents")?;
        let duration_minutes = self
            .duration_minutes
            .ok_or_else(|| ValidationError::required("durationMinutes"))?;
        validate_duration_minutes(duration_minutes)?;
        Ok(ValidService {
            name,
            price_cents,
            duration_minutes,
        })
    }
}

/// Rejects a second service with the same name and price in a business.
async fn ensure_unique(
    state: &AppState,
    business_id: &str,
    valid: &ValidService,
    except_id: Option<&str>,
) -> ApiResult<()> {
    let existing = state
        .db
        .services()
        .find_by_name_and_price(business_id, &valid.name, valid.price_cents)
        .await?;
    match existing {
        Some(s) if Some(s.id.as_str()) != except_id => Err(ValidationError::Duplicate {
            field: "service".to_string(),
            value: format!("{} ({})", valid.name, s.price()),
        }
        .into()),
        _ => Ok(()),
    }
}

/// POST /api/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<ServiceRequest>,
) -> ApiResult<(StatusCode, Json<Service>)> {
    user.ensure_owner()?;
    let valid = req.validate()?;
    ensure_unique(&state, &user.business_id, &valid, None).await?;

    let service = state
        .db
        .services()
        .insert(
            &user.business_id,
            &valid.name,
            valid.price_cents,
            valid.duration_minutes,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(service)))
}

async fn owned_service(state: &AppState, user: &CurrentUser, id: &str) -> ApiResult<Service> {
    let service = state
        .db
        .services()
        .get(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Service", id))?;
    user.ensure_business(&service.business_id)?;
    Ok(service)
}

/// GET /api/services/{id}
///
/// Public, for the booking page.
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Service>> {
    let service = state
        .db
        .services()
        .get(&id)
        .await?
        .ok_or_else(|| CoreError::not_found("Service", &id))?;
    Ok(Json(service))
}

/// PUT /api/services/{id}
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ServiceRequest>,
) -> ApiResult<Json<Service>> {
    user.ensure_owner()?;
    let service = owned_service(&state, &user, &id).await?;
    let valid = req.validate()?;
    ensure_unique(&state, &service.business_id, &valid, Some(&service.id)).await?;

    let updated = state
        .db
        .services()
        .update(&id, &valid.name, valid.price_cents, valid.duration_minutes)
        .await?;
    Ok(Json(updated))
}

/// DELETE /api/services/{id}
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.ensure_owner()?;
    owned_service(&state, &user, &id).await?;
    state.db.services().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/services/bulk-delete
///
/// Deletes all listed services or, if any is missing or foreign, none.
pub async fn bulk_delete_services(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleteResponse>> {
    user.ensure_owner()?;
    let ids = req.ids()?;
    let deleted = state
        .db
        .services()
        .delete_many(&user.business_id, &ids)
        .await?;
    info!(business_id = %user.business_id, deleted, "Services bulk deleted");
    Ok(Json(BulkDeleteResponse { deleted }))
}
