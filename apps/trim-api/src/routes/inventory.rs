//! Inventory endpoints

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use trim_core::validation::{non_blank, validate_stock};
use trim_core::{CoreError, InventoryItem, ValidationError};
use trim_db::SyncOutcome;

use super::BusinessQuery;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Stock given to products entering inventory through a sync.
const SYNC_INITIAL_QUANTITY: i64 = 1;

/// GET /api/inventory?businessId=
pub async fn list_inventory(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<BusinessQuery>,
) -> ApiResult<Json<Vec<InventoryItem>>> {
    let business_id = query.scoped(&user)?;
    Ok(Json(state.db.inventory().list_by_business(&business_id).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncRequest {
    pub business_id: Option<String>,
    pub product_ids: Vec<String>,
}

/// POST /api/inventory/sync
///
/// Brings listed products into inventory; products already tracked keep
/// their counts.
pub async fn sync_inventory(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<SyncRequest>,
) -> ApiResult<Json<SyncOutcome>> {
    user.ensure_owner()?;
    let business_id = BusinessQuery {
        business_id: req.business_id,
    }
    .scoped(&user)?;

    let product_ids: Vec<String> = req
        .product_ids
        .iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    if product_ids.is_empty() {
        return Err(ValidationError::required("productIds").into());
    }

    let outcome = state
        .db
        .inventory()
        .sync(&business_id, &product_ids, SYNC_INITIAL_QUANTITY)
        .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StockRequest {
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
    pub reorder_level: Option<i64>,
}

/// PUT /api/inventory
pub async fn set_quantity(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<StockRequest>,
) -> ApiResult<Json<InventoryItem>> {
    user.ensure_owner()?;
    let product_id = non_blank(req.product_id.as_deref(), "productId")?;
    let quantity = req
        .quantity
        .ok_or_else(|| ValidationError::required("quantity"))?;
    validate_stock(quantity)?;
    if let Some(level) = req.reorder_level {
        if level < 0 {
            return Err(ValidationError::Negative {
                field: "reorderLevel".to_string(),
            }
            .into());
        }
    }

    let product = state
        .db
        .catalog()
        .get_product(&product_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Product", &product_id))?;
    user.ensure_business(&product.business_id)?;

    let item = state
        .db
        .inventory()
        .set_quantity(&user.business_id, &product_id, quantity, req.reorder_level)
        .await?;
    Ok(Json(item))
}
