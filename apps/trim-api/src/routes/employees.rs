//! Employee endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use trim_core::booking::sanitize_service_ids;
use trim_core::validation::{validate_email, validate_name, validate_password};
use trim_core::{CoreError, Employee, ScheduleSpec, ValidationError};
use trim_db::EmployeeProfile;

use super::{
    optional_text, BulkDeleteRequest, BulkDeleteResponse, BusinessQuery, DisabledDatesRequest,
};
use crate::auth::{hash_password, CurrentUser, Role};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::services::booking_service::BookingService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Read on create only.
    pub password: Option<String>,
    pub service_ids: Vec<String>,
    #[serde(flatten)]
    pub schedule: ScheduleSpec,
}

impl EmployeeRequest {
    fn profile(self) -> ApiResult<EmployeeProfile> {
        let name = validate_name(self.name.as_deref().unwrap_or_default(), "name")?;
        let email = validate_email(self.email.as_deref().unwrap_or_default())?;
        let service_ids = sanitize_service_ids(&self.service_ids);
        if service_ids.is_empty() {
            return Err(ValidationError::required("serviceIds").into());
        }
        Ok(EmployeeProfile {
            name,
            email,
            phone: optional_text(self.phone),
            service_ids,
            schedule: self.schedule.sanitized(),
        })
    }
}

/// GET /api/employees?businessId=
pub async fn list_employees(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<BusinessQuery>,
) -> ApiResult<Json<Vec<Employee>>> {
    let business_id = query.scoped(&user)?;
    Ok(Json(state.db.employees().list_by_business(&business_id).await?))
}

/// POST /api/employees
pub async fn create_employee(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(mut req): ApiJson<EmployeeRequest>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    user.ensure_owner()?;
    let password = req.password.take().unwrap_or_default();
    let profile = req.profile()?;
    validate_password(&password)?;

    let employee = state
        .db
        .employees()
        .insert(
            &user.business_id,
            &profile.name,
            &profile.email,
            profile.phone.as_deref(),
            &hash_password(&password)?,
            &profile.service_ids,
            &profile.schedule,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

async fn visible_employee(state: &AppState, user: &CurrentUser, id: &str) -> ApiResult<Employee> {
    let employee = state
        .db
        .employees()
        .get(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Employee", id))?;
    user.ensure_business(&employee.business_id)?;
    Ok(employee)
}

/// Owners edit anyone in their business; employees only themselves.
fn ensure_editor(user: &CurrentUser, employee: &Employee) -> ApiResult<()> {
    match user.role {
        Role::Owner => Ok(()),
        Role::Employee if user.subject == employee.id => Ok(()),
        Role::Employee => user.ensure_owner(),
    }
}

/// GET /api/employees/{id}
pub async fn get_employee(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Employee>> {
    Ok(Json(visible_employee(&state, &user, &id).await?))
}

/// PUT /api/employees/{id}
pub async fn update_employee(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<EmployeeRequest>,
) -> ApiResult<Json<Employee>> {
    let employee = visible_employee(&state, &user, &id).await?;
    ensure_editor(&user, &employee)?;

    let updated = state
        .db
        .employees()
        .update_profile(&id, req.profile()?)
        .await?;
    Ok(Json(updated))
}

/// PUT /api/employees/{id}/disabled-dates
pub async fn set_disabled_dates(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<DisabledDatesRequest>,
) -> ApiResult<Json<Employee>> {
    let employee = visible_employee(&state, &user, &id).await?;
    ensure_editor(&user, &employee)?;

    let dates = req.dates()?;
    let updated = state.db.employees().set_disabled_dates(&id, &dates).await?;
    info!(employee_id = %id, count = dates.len(), "Employee disabled dates updated");
    Ok(Json(updated))
}

/// DELETE /api/employees/{id}
pub async fn delete_employee(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.ensure_owner()?;
    visible_employee(&state, &user, &id).await?;
    state.db.employees().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/employees/bulk-delete
///
/// Deletes all listed employees or, if any is missing or foreign, none.
pub async fn bulk_delete_employees(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleteResponse>> {
    user.ensure_owner()?;
    let ids = req.ids()?;
    let deleted = state
        .db
        .employees()
        .delete_many(&user.business_id, &ids)
        .await?;
    info!(business_id = %user.business_id, deleted, "Employees bulk deleted");
    Ok(Json(BulkDeleteResponse { deleted }))
}

/// GET /api/employees/{id}/schedule
///
/// The schedule the employee actually works, after falling back to the
/// business week.
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ScheduleSpec>> {
    Ok(Json(BookingService::new(state).employee_schedule(&id).await?))
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::{owner, send};
    use crate::state::testing::state;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    async fn hire(app: &axum::Router, token: &str, service_id: &str) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/employees",
            Some(token),
            Some(json!({
                "name": "Priya",
                "email": "priya@fade.test",
                "password": "clippers99",
                "serviceIds": [service_id, " "],
                "workingDays": ["Wednesday"],
                "breaks": { "Wednesday": [{ "start": "14:00", "end": "14:30" }] },
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    async fn haircut(app: &axum::Router, token: &str) -> String {
        let (_, body) = send(
            app,
            Method::POST,
            "/api/services",
            Some(token),
            Some(json!({ "name": "Haircut", "priceCents": 4000, "durationMinutes": 30 })),
        )
        .await;
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_employee_and_log_in() {
        let app = crate::app(state().await);
        let (token, business_id) = owner(&app, "owner@fade.test").await;
        let service_id = haircut(&app, &token).await;

        let employee = hire(&app, &token, &service_id).await;
        assert_eq!(employee["serviceIds"], json!([service_id]));
        assert!(employee.get("passwordHash").is_none());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/employee-login",
            None,
            Some(json!({ "email": "priya@fade.test", "password": "clippers99" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["businessId"], business_id.as_str());
        assert_eq!(body["role"], "employee");
    }

    #[tokio::test]
    async fn test_employee_requires_services() {
        let app = crate::app(state().await);
        let (token, _) = owner(&app, "owner@fade.test").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/employees",
            Some(&token),
            Some(json!({ "name": "Priya", "email": "priya@fade.test", "password": "clippers99" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("serviceIds"));
    }

    #[tokio::test]
    async fn test_schedule_and_disabled_dates() {
        let app = crate::app(state().await);
        let (token, _) = owner(&app, "owner@fade.test").await;
        let service_id = haircut(&app, &token).await;
        let employee = hire(&app, &token, &service_id).await;
        let id = employee["id"].as_str().unwrap();

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/employees/{id}/disabled-dates"),
            Some(&token),
            Some(json!({ "disabledDates": ["2024-05-08"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            send(&app, Method::GET, &format!("/api/employees/{id}/schedule"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["workingDays"], json!(["Wednesday"]));
        assert_eq!(body["disabledDates"], json!(["2024-05-08"]));

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/employees/{id}"),
            Some(&token),
            Some(json!({
                "name": "Priya K",
                "email": "priya@fade.test",
                "serviceIds": [service_id],
                "workingDays": ["Thursday"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Priya K");
        assert_eq!(body["disabledDates"], json!(["2024-05-08"]));
    }

    #[tokio::test]
    async fn test_employee_cannot_manage_staff() {
        let app = crate::app(state().await);
        let (token, _) = owner(&app, "owner@fade.test").await;
        let service_id = haircut(&app, &token).await;
        let employee = hire(&app, &token, &service_id).await;
        let id = employee["id"].as_str().unwrap();

        let (_, login) = send(
            &app,
            Method::POST,
            "/api/auth/employee-login",
            None,
            Some(json!({ "email": "priya@fade.test", "password": "clippers99" })),
        )
        .await;
        let employee_token = login["token"].as_str().unwrap();

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/employees/{id}"),
            Some(employee_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/employees/{id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_bulk_delete_employees() {
        let app = crate::app(state().await);
        let (token, _) = owner(&app, "owner@fade.test").await;
        let service_id = haircut(&app, &token).await;
        let priya = hire(&app, &token, &service_id).await;
        let priya_id = priya["id"].as_str().unwrap();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/employees/bulk-delete",
            Some(&token),
            Some(json!({ "ids": [priya_id, "ghost"] })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/api/employees/{priya_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/employees/bulk-delete",
            Some(&token),
            Some(json!({ "ids": [priya_id] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 1);

        let (_, list) = send(&app, Method::GET, "/api/employees", Some(&token), None).await;
        assert!(list.as_array().unwrap().is_empty());
    }
}
