//! # Inventory Repository
//!
//! Stock per (business, product). Settlement decrements stock inside the
//! invoice transaction (see [`super::invoice`]); this repository covers the
//! management side: listing, syncing new products in and setting counts.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{debug, info};

use super::{new_id, parse_timestamp, timestamp};
use crate::error::{DbError, DbResult};
use trim_core::{InventoryItem, DEFAULT_REORDER_LEVEL};

#[derive(Debug, sqlx::FromRow)]
struct InventoryRow {
    id: String,
    business_id: String,
    product_id: String,
    quantity_in_stock: i64,
    reorder_level: i64,
    last_updated: String,
}

impl TryFrom<InventoryRow> for InventoryItem {
    type Error = DbError;

    fn try_from(row: InventoryRow) -> DbResult<Self> {
        Ok(InventoryItem {
            last_updated: parse_timestamp("inventory.last_updated", &row.last_updated)?,
            id: row.id,
            business_id: row.business_id,
            product_id: row.product_id,
            quantity_in_stock: row.quantity_in_stock,
            reorder_level: row.reorder_level,
        })
    }
}

const INVENTORY_COLUMNS: &str =
    "id, business_id, product_id, quantity_in_stock, reorder_level, last_updated";

/// Result of [`InventoryRepository::sync`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    /// Records created by this call.
    pub added: Vec<InventoryItem>,
    /// Every record of the business after the sync.
    pub inventory: Vec<InventoryItem>,
}

#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    pub async fn list_by_business(&self, business_id: &str) -> DbResult<Vec<InventoryItem>> {
        let rows: Vec<InventoryRow> = sqlx::query_as(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE business_id = ?1 ORDER BY product_id"
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(InventoryItem::try_from).collect()
    }

    pub async fn get(&self, business_id: &str, product_id: &str) -> DbResult<Option<InventoryItem>> {
        let row: Option<InventoryRow> = sqlx::query_as(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE business_id = ?1 AND product_id = ?2"
        ))
        .bind(business_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(InventoryItem::try_from).transpose()
    }

    /// Current stock by product id. Products without a record are absent.
    pub async fn stock_levels(&self, business_id: &str) -> DbResult<HashMap<String, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT product_id, quantity_in_stock FROM inventory WHERE business_id = ?1",
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Creates a record with `initial_quantity` for every listed product
    /// that has none yet. Existing records are left untouched.
    ///
    /// ## Errors
    /// * `NotFound` - a product id does not belong to the business; nothing
    ///   is created
    pub async fn sync(
        &self,
        business_id: &str,
        product_ids: &[String],
        initial_quantity: i64,
    ) -> DbResult<SyncOutcome> {
        let mut tx = self.pool.begin().await?;
        let now = timestamp(Utc::now());
        let mut added_ids = Vec::new();

        for product_id in product_ids {
            let owned: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM products WHERE id = ?1 AND business_id = ?2",
            )
            .bind(product_id)
            .bind(business_id)
            .fetch_one(&mut *tx)
            .await?;

            if owned == 0 {
                return Err(DbError::not_found("Product", product_id.as_str()));
            }

            let inserted = sqlx::query(
                r#"
                INSERT INTO inventory
                    (id, business_id, product_id, quantity_in_stock, reorder_level, last_updated)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT (business_id, product_id) DO NOTHING
                "#,
            )
            .bind(new_id())
            .bind(business_id)
            .bind(product_id)
            .bind(initial_quantity)
            .bind(DEFAULT_REORDER_LEVEL)
            .bind(&now)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted > 0 {
                added_ids.push(product_id.clone());
            }
        }

        tx.commit().await?;

        let inventory = self.list_by_business(business_id).await?;
        let added: Vec<InventoryItem> = inventory
            .iter()
            .filter(|item| added_ids.contains(&item.product_id))
            .cloned()
            .collect();

        info!(business_id = %business_id, added = added.len(), "Inventory synced");
        Ok(SyncOutcome { added, inventory })
    }

    /// Sets the stock count of a product, creating the record if needed.
    /// `reorder_level` is kept when `None`.
    pub async fn set_quantity(
        &self,
        business_id: &str,
        product_id: &str,
        quantity: i64,
        reorder_level: Option<i64>,
    ) -> DbResult<InventoryItem> {
        sqlx::query(
            r#"
            INSERT INTO inventory
                (id, business_id, product_id, quantity_in_stock, reorder_level, last_updated)
            VALUES (?1, ?2, ?3, ?4, COALESCE(?5, ?6), ?7)
            ON CONFLICT (business_id, product_id) DO UPDATE SET
                quantity_in_stock = excluded.quantity_in_stock,
                reorder_level = COALESCE(?5, inventory.reorder_level),
                last_updated = excluded.last_updated
            "#,
        )
        .bind(new_id())
        .bind(business_id)
        .bind(product_id)
        .bind(quantity)
        .bind(reorder_level)
        .bind(DEFAULT_REORDER_LEVEL)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        debug!(business_id = %business_id, product_id = %product_id, quantity, "Stock set");
        self.get(business_id, product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory", product_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::catalog::ProductFields;
    use crate::repository::test_support;

    async fn product(db: &crate::Database, business_id: &str, name: &str) -> String {
        db.catalog()
            .insert_product(
                business_id,
                ProductFields {
                    category_id: None,
                    name: name.into(),
                    description: None,
                    unit: None,
                    price_per_unit_cents: 1000,
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_sync_adds_only_missing() {
        let db = test_support::db().await;
        let business = test_support::business(&db, "owner@fade.test").await;
        let wax = product(&db, &business.id, "Wax").await;
        let oil = product(&db, &business.id, "Oil").await;
        let repo = db.inventory();

        repo.set_quantity(&business.id, &wax, 7, None).await.unwrap();

        let outcome = repo
            .sync(&business.id, &[wax.clone(), oil.clone()], 1)
            .await
            .unwrap();
        assert_eq!(outcome.added.len(), 1);
        assert_eq!(outcome.added[0].product_id, oil);
        assert_eq!(outcome.added[0].quantity_in_stock, 1);
        assert_eq!(outcome.added[0].reorder_level, DEFAULT_REORDER_LEVEL);
        assert_eq!(outcome.inventory.len(), 2);

        let levels = repo.stock_levels(&business.id).await.unwrap();
        assert_eq!(levels.get(&wax), Some(&7));
    }

    #[tokio::test]
    async fn test_sync_rejects_foreign_product() {
        let db = test_support::db().await;
        let business = test_support::business(&db, "owner@fade.test").await;
        let other = test_support::business(&db, "other@fade.test").await;
        let theirs = product(&db, &other.id, "Wax").await;

        let err = db
            .inventory()
            .sync(&business.id, &[theirs], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert!(db
            .inventory()
            .list_by_business(&business.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_set_quantity_upserts() {
        let db = test_support::db().await;
        let business = test_support::business(&db, "owner@fade.test").await;
        let wax = product(&db, &business.id, "Wax").await;
        let repo = db.inventory();

        let created = repo.set_quantity(&business.id, &wax, 4, Some(2)).await.unwrap();
        assert_eq!(created.reorder_level, 2);

        let updated = repo.set_quantity(&business.id, &wax, 9, None).await.unwrap();
        assert_eq!(updated.quantity_in_stock, 9);
        assert_eq!(updated.reorder_level, 2);
        assert_eq!(updated.id, created.id);
    }

    #[tokio::test]
    async fn test_negative_quantity_rejected_by_schema() {
        let db = test_support::db().await;
        let business = test_support::business(&db, "owner@fade.test").await;
        let wax = product(&db, &business.id, "Wax").await;

        let err = db
            .inventory()
            .set_quantity(&business.id, &wax, -1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(_)));
    }
}
