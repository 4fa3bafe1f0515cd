//! # Catalog Repository
//!
//! Retail categories and products sold at checkout.
//!
//! ## Product Search
//! Case-insensitive substring match on the product name, scoped to one
//! business. Catalogs are small (tens to hundreds of products), so a plain
//! `LIKE` scan is enough.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::{new_id, parse_timestamp, timestamp};
use crate::error::{DbError, DbResult};
use trim_core::{Category, Product};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: String,
    business_id: String,
    name: String,
    description: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            business_id: row.business_id,
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    business_id: String,
    category_id: Option<String>,
    name: String,
    description: Option<String>,
    unit: Option<String>,
    price_per_unit_cents: i64,
    created_at: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        Ok(Product {
            created_at: parse_timestamp("products.created_at", &row.created_at)?,
            id: row.id,
            business_id: row.business_id,
            category_id: row.category_id,
            name: row.name,
            description: row.description,
            unit: row.unit,
            price_per_unit_cents: row.price_per_unit_cents,
        })
    }
}

const PRODUCT_COLUMNS: &str =
    "id, business_id, category_id, name, description, unit, price_per_unit_cents, created_at";

/// Product fields supplied on create and update.
#[derive(Debug, Clone)]
pub struct ProductFields {
    pub category_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub price_per_unit_cents: i64,
}

#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    /// ## Errors
    /// * `UniqueViolation` - category name already used in this business
    pub async fn insert_category(
        &self,
        business_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> DbResult<Category> {
        let category = Category {
            id: new_id(),
            business_id: business_id.to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
        };

        sqlx::query(
            "INSERT INTO categories (id, business_id, name, description) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&category.id)
        .bind(&category.business_id)
        .bind(&category.name)
        .bind(&category.description)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: name.to_string(),
            },
            other => other,
        })?;

        info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    pub async fn get_category(&self, id: &str) -> DbResult<Option<Category>> {
        let row: Option<CategoryRow> = sqlx::query_as(
            "SELECT id, business_id, name, description FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    pub async fn list_categories(&self, business_id: &str) -> DbResult<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            r#"
            SELECT id, business_id, name, description
            FROM categories
            WHERE business_id = ?1
            ORDER BY name
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    pub async fn update_category(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
    ) -> DbResult<Category> {
        let result = sqlx::query("UPDATE categories SET name = ?1, description = ?2 WHERE id = ?3")
            .bind(name)
            .bind(description)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        self.get_category(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Products in the category keep existing with no category.
    pub async fn delete_category(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    pub async fn insert_product(&self, business_id: &str, fields: ProductFields) -> DbResult<Product> {
        let product = Product {
            id: new_id(),
            business_id: business_id.to_string(),
            category_id: fields.category_id,
            name: fields.name,
            description: fields.description,
            unit: fields.unit,
            price_per_unit_cents: fields.price_per_unit_cents,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO products
                (id, business_id, category_id, name, description, unit, price_per_unit_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.business_id)
        .bind(&product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.unit)
        .bind(product.price_per_unit_cents)
        .bind(timestamp(product.created_at))
        .execute(&self.pool)
        .await?;

        info!(product_id = %product.id, business_id = %business_id, "Product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    pub async fn list_products(&self, business_id: &str) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE business_id = ?1 ORDER BY name"
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Searches product names within a business.
    ///
    /// ## Arguments
    /// * `query` - Search term, matched anywhere in the name; blank lists all
    /// * `limit` - Maximum results to return
    pub async fn search_products(
        &self,
        business_id: &str,
        query: &str,
        limit: u32,
    ) -> DbResult<Vec<Product>> {
        let query = query.trim();
        debug!(business_id = %business_id, query = %query, limit, "Searching products");

        let pattern = format!("%{}%", escape_like(query));
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE business_id = ?1 AND name LIKE ?2 ESCAPE '\'
            ORDER BY name
            LIMIT ?3
            "#
        ))
        .bind(business_id)
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Search returned products");
        rows.into_iter().map(Product::try_from).collect()
    }

    pub async fn update_product(&self, id: &str, fields: ProductFields) -> DbResult<Product> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET category_id = ?1, name = ?2, description = ?3, unit = ?4, price_per_unit_cents = ?5
            WHERE id = ?6
            "#,
        )
        .bind(&fields.category_id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.unit)
        .bind(fields.price_per_unit_cents)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_product(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes the product and its inventory record. Invoice lines keep
    /// their snapshot.
    pub async fn delete_product(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(product_id = %id, "Product deleted");
        Ok(())
    }
}

/// Escapes `%`, `_` and the escape character itself for a LIKE pattern.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
