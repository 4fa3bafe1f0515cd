//! Contact endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use trim_core::validation::{non_blank, validate_name};
use trim_core::{Contact, CoreError};

use super::{optional_text, BusinessQuery};
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ContactRequest {
    fn fields(self) -> ApiResult<(String, String, Option<String>)> {
        let name = validate_name(self.name.as_deref().unwrap_or_default(), "name")?;
        let phone = non_blank(self.phone.as_deref(), "phone")?;
        Ok((name, phone, optional_text(self.email)))
    }
}

/// GET /api/contacts?businessId=
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<BusinessQuery>,
) -> ApiResult<Json<Vec<Contact>>> {
    let business_id = query.scoped(&user)?;
    Ok(Json(state.db.contacts().list_by_business(&business_id).await?))
}

/// POST /api/contacts
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<ContactRequest>,
) -> ApiResult<(StatusCode, Json<Contact>)> {
    let (name, phone, email) = req.fields()?;
    let contact = state
        .db
        .contacts()
        .insert(&user.business_id, &name, &phone, email.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn owned_contact(state: &AppState, user: &CurrentUser, id: &str) -> ApiResult<Contact> {
    let contact = state
        .db
        .contacts()
        .get(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Contact", id))?;
    user.ensure_business(&contact.business_id)?;
    Ok(contact)
}

/// GET /api/contacts/{id}
pub async fn get_contact(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Contact>> {
    Ok(Json(owned_contact(&state, &user, &id).await?))
}

/// PUT /api/contacts/{id}
pub async fn update_contact(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ContactRequest>,
) -> ApiResult<Json<Contact>> {
    owned_contact(&state, &user, &id).await?;
    let (name, phone, email) = req.fields()?;
    let contact = state
        .db
        .contacts()
        .update(&id, &name, &phone, email.as_deref())
        .await?;
    Ok(Json(contact))
}

/// DELETE /api/contacts/{id}
pub async fn delete_contact(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    owned_contact(&state, &user, &id).await?;
    state.db.contacts().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
