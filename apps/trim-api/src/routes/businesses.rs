//! Business schedule and settings endpoints

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use trim_core::{Business, BusinessSchedule, CoreError, OwnerDetails, ScheduleSpec};

use super::{optional_text, DisabledDatesRequest};
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

/// GET /api/businesses/{id}/schedule
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<BusinessSchedule>> {
    let schedule = state
        .db
        .businesses()
        .get_schedule(&id)
        .await?
        .ok_or_else(|| CoreError::not_found("BusinessSchedule", &id))?;
    Ok(Json(schedule))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveScheduleRequest {
    #[serde(flatten)]
    pub schedule: ScheduleSpec,
    pub owner: OwnerDetails,
    pub timezone: Option<String>,
}

/// PUT /api/businesses/{id}/schedule
///
/// Disabled dates are kept unless the body brings its own.
pub async fn save_schedule(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SaveScheduleRequest>,
) -> ApiResult<Json<BusinessSchedule>> {
    user.ensure_business(&id)?;
    user.ensure_owner()?;

    let repo = state.db.businesses();
    let mut schedule = req.schedule.sanitized();
    if schedule.disabled_dates.is_empty() {
        if let Some(stored) = repo.get_schedule(&id).await? {
            schedule.disabled_dates = stored.schedule.disabled_dates;
        }
    }
    let timezone = optional_text(req.timezone)
        .unwrap_or_else(|| state.config.business_timezone.name().to_string());

    let saved = repo
        .upsert_schedule(&id, &schedule, &req.owner, &timezone)
        .await?;
    Ok(Json(saved))
}

/// PUT /api/businesses/{id}/disabled-dates
pub async fn set_disabled_dates(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<DisabledDatesRequest>,
) -> ApiResult<Json<BusinessSchedule>> {
    user.ensure_business(&id)?;
    user.ensure_owner()?;

    let dates = req.dates()?;
    let saved = state.db.businesses().set_disabled_dates(&id, &dates).await?;
    info!(business_id = %id, count = dates.len(), "Business disabled dates updated");
    Ok(Json(saved))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStatus {
    pub business_id: String,
    pub inventory_enabled: bool,
}

impl From<Business> for InventoryStatus {
    fn from(business: Business) -> Self {
        InventoryStatus {
            business_id: business.id,
            inventory_enabled: business.inventory_enabled,
        }
    }
}

/// GET /api/businesses/{id}/inventory-status
pub async fn inventory_status(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<InventoryStatus>> {
    user.ensure_business(&id)?;
    let business = state.db.businesses().require(&id).await?;
    Ok(Json(business.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetInventoryStatusRequest {
    pub inventory_enabled: bool,
}

/// PUT /api/businesses/{id}/inventory-status
pub async fn set_inventory_status(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SetInventoryStatusRequest>,
) -> ApiResult<Json<InventoryStatus>> {
    user.ensure_business(&id)?;
    user.ensure_owner()?;

    let business = state
        .db
        .businesses()
        .set_inventory_enabled(&id, req.inventory_enabled)
        .await?;
    info!(business_id = %id, enabled = business.inventory_enabled, "Inventory tracking toggled");
    Ok(Json(business.into()))
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::{owner, send};
    use crate::state::testing::state;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_schedule_save_and_public_read() {
        let app = crate::app(state().await);
        let (token, business_id) = owner(&app, "owner@fade.test").await;
        let uri = format!("/api/businesses/{business_id}/schedule");

        let (status, _) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({
                "workingDays": ["Monday", "Tuesday"],
                "workingHours": { "Monday": { "opensAt": "10:00", "closesAt": "18:00" } },
                "owner": { "firstName": "Sam", "lastName": "Rivera", "phone": "555-0100" },
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["timezone"], "America/New_York");

        let (status, body) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["workingDays"], json!(["Monday", "Tuesday"]));
        assert_eq!(body["workingHours"]["Monday"]["opensAt"], "10:00");
        assert_eq!(body["owner"]["firstName"], "Sam");
    }

    #[tokio::test]
    async fn test_disabled_dates_survive_schedule_save() {
        let app = crate::app(state().await);
        let (token, business_id) = owner(&app, "owner@fade.test").await;
        let schedule_uri = format!("/api/businesses/{business_id}/schedule");
        let dates_uri = format!("/api/businesses/{business_id}/disabled-dates");

        let (status, _) = send(
            &app,
            Method::PUT,
            &dates_uri,
            Some(&token),
            Some(json!({ "disabledDates": ["2024-12-25"] })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let week = json!({ "workingDays": ["Monday"] });
        send(&app, Method::PUT, &schedule_uri, Some(&token), Some(week.clone())).await;
        let (status, body) = send(
            &app,
            Method::PUT,
            &dates_uri,
            Some(&token),
            Some(json!({ "disabledDates": ["2024-12-25", "2024-12-31T05:00:00.000Z"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["disabledDates"], json!(["2024-12-25", "2024-12-31"]));

        let (_, body) = send(&app, Method::PUT, &schedule_uri, Some(&token), Some(week)).await;
        assert_eq!(body["disabledDates"], json!(["2024-12-25", "2024-12-31"]));
    }

    #[tokio::test]
    async fn test_other_business_is_off_limits() {
        let app = crate::app(state().await);
        let (_, business_id) = owner(&app, "owner@fade.test").await;
        let (intruder, _) = owner(&app, "owner@other.test").await;

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/businesses/{business_id}/schedule"),
            Some(&intruder),
            Some(json!({ "workingDays": ["Monday"] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/businesses/{business_id}/schedule"),
            None,
            Some(json!({ "workingDays": ["Monday"] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_inventory_toggle() {
        let app = crate::app(state().await);
        let (token, business_id) = owner(&app, "owner@fade.test").await;
        let uri = format!("/api/businesses/{business_id}/inventory-status");

        let (_, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(body["inventoryEnabled"], false);

        let (status, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "inventoryEnabled": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["inventoryEnabled"], true);
    }
}
