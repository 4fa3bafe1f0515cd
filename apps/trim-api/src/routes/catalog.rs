//! Category and product endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use trim_core::validation::{validate_name, validate_price_cents};
use trim_core::{Category, CoreError, Product, ValidationError};
use trim_db::ProductFields;

use super::{optional_text, BusinessQuery};
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Default and maximum page size for product search.
const SEARCH_LIMIT: u32 = 20;
const SEARCH_LIMIT_MAX: u32 = 100;

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// GET /api/categories?businessId=
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<BusinessQuery>,
) -> ApiResult<Json<Vec<Category>>> {
    let business_id = query.scoped(&user)?;
    Ok(Json(state.db.catalog().list_categories(&business_id).await?))
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    user.ensure_owner()?;
    let name = validate_name(req.name.as_deref().unwrap_or_default(), "name")?;
    let description = optional_text(req.description);

    let category = state
        .db
        .catalog()
        .insert_category(&user.business_id, &name, description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn owned_category(state: &AppState, user: &CurrentUser, id: &str) -> ApiResult<Category> {
    let category = state
        .db
        .catalog()
        .get_category(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Category", id))?;
    user.ensure_business(&category.business_id)?;
    Ok(category)
}

/// PUT /api/categories/{id}
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> ApiResult<Json<Category>> {
    user.ensure_owner()?;
    owned_category(&state, &user, &id).await?;
    let name = validate_name(req.name.as_deref().unwrap_or_default(), "name")?;
    let description = optional_text(req.description);

    let category = state
        .db
        .catalog()
        .update_category(&id, &name, description.as_deref())
        .await?;
    Ok(Json(category))
}

/// DELETE /api/categories/{id}
///
/// Products in the category stay, uncategorised.
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.ensure_owner()?;
    owned_category(&state, &user, &id).await?;
    state.db.catalog().delete_category(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductRequest {
    pub category_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub price_per_unit_cents: Option<i64>,
}

impl ProductRequest {
    /// Validates the body; a category must belong to the caller's business.
    async fn fields(self, state: &AppState, user: &CurrentUser) -> ApiResult<ProductFields> {
        let name = validate_name(self.name.as_deref().unwrap_or_default(), "name")?;
        let price = self
            .price_per_unit_cents
            .ok_or_else(|| ValidationError::required("pricePerUnitCents"))?;
        validate_price_cents(price, "pricePerUnitCents")?;

        let category_id = optional_text(self.category_id);
        if let Some(category_id) = &category_id {
            owned_category(state, user, category_id).await?;
        }

        Ok(ProductFields {
            category_id,
            name,
            description: optional_text(self.description),
            unit: optional_text(self.unit),
            price_per_unit_cents: price,
        })
    }
}

/// GET /api/products?businessId=
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<BusinessQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let business_id = query.scoped(&user)?;
    Ok(Json(state.db.catalog().list_products(&business_id).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchQuery {
    pub business_id: Option<String>,
    pub q: Option<String>,
    pub limit: Option<u32>,
}

/// GET /api/products/search?q=&limit=
pub async fn search_products(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let business_id = BusinessQuery {
        business_id: query.business_id,
    }
    .scoped(&user)?;
    let limit = query.limit.unwrap_or(SEARCH_LIMIT).clamp(1, SEARCH_LIMIT_MAX);

    let products = state
        .db
        .catalog()
        .search_products(&business_id, query.q.as_deref().unwrap_or_default(), limit)
        .await?;
    Ok(Json(products))
}

/// POST /api/products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<ProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    user.ensure_owner()?;
    let fields = req.fields(&state, &user).await?;
    let product = state
        .db
        .catalog()
        .insert_product(&user.business_id, fields)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn owned_product(state: &AppState, user: &CurrentUser, id: &str) -> ApiResult<Product> {
    let product = state
        .db
        .catalog()
        .get_product(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Product", id))?;
    user.ensure_business(&product.business_id)?;
    Ok(product)
}

/// PUT /api/products/{id}
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ProductRequest>,
) -> ApiResult<Json<Product>> {
    user.ensure_owner()?;
    owned_product(&state, &user, &id).await?;
    let fields = req.fields(&state, &user).await?;
    Ok(Json(state.db.catalog().update_product(&id, fields).await?))
}

/// DELETE /api/products/{id}
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.ensure_owner()?;
    owned_product(&state, &user, &id).await?;
    state.db.catalog().delete_product(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::{owner, send};
    use crate::state::testing::state;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_catalog_and_search() {
        let app = crate::app(state().await);
        let (token, _) = owner(&app, "owner@fade.test").await;

        let (status, category) = send(
            &app,
            Method::POST,
            "/api/categories",
            Some(&token),
            Some(json!({ "name": "Styling" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let category_id = category["id"].as_str().unwrap();

        for name in ["Matte Pomade", "Shine Pomade", "Beard Oil"] {
            let (status, _) = send(
                &app,
                Method::POST,
                "/api/products",
                Some(&token),
                Some(json!({
                    "categoryId": category_id,
                    "name": name,
                    "unit": "jar",
                    "pricePerUnitCents": 1800,
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, found) =
            send(&app, Method::GET, "/api/products/search?q=pOMADE", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found.as_array().unwrap().len(), 2);

        let (_, found) =
            send(&app, Method::GET, "/api/products/search?q=pomade&limit=1", Some(&token), None)
                .await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/categories/{category_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, products) = send(&app, Method::GET, "/api/products", Some(&token), None).await;
        let products = products.as_array().unwrap();
        assert_eq!(products.len(), 3);
        assert!(products.iter().all(|p| p["categoryId"].is_null()));
    }

    #[tokio::test]
    async fn test_product_needs_price_and_own_category() {
        let app = crate::app(state().await);
        let (token, _) = owner(&app, "owner@fade.test").await;
        let (other, _) = owner(&app, "owner@other.test").await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({ "name": "Pomade" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, foreign) = send(
            &app,
            Method::POST,
            "/api/categories",
            Some(&other),
            Some(json!({ "name": "Theirs" })),
        )
        .await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({
                "name": "Pomade",
                "pricePerUnitCents": 1800,
                "categoryId": foreign["id"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
