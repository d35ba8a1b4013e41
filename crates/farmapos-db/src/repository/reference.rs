//! # Reference Repository
//!
//! Product and location lookups for the ledger, plus the inserts the
//! catalog screens (and tests) use to seed them.
//!
//! The ledger treats this data as read-only: movements reference products
//! and locations but never mutate them.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use farmapos_core::types::{LocationRef, ProductRef};

use crate::error::{DbError, DbResult};

/// Repository for product/location reference data.
#[derive(Debug, Clone)]
pub struct ReferenceRepository {
    pool: SqlitePool,
}

impl ReferenceRepository {
    /// Creates a new repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        ReferenceRepository { pool }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Fetches a product by id.
    ///
    /// ## Errors
    /// * [`DbError::NotFound`] when the id does not resolve
    pub async fn get_product(&self, id: &str) -> DbResult<ProductRef> {
        let product = sqlx::query_as::<_, ProductRef>(
            "SELECT id, sku, barcode, name, category FROM products WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))?;

        Ok(product)
    }

    /// Lists active products, ordered by name.
    pub async fn list_products(&self) -> DbResult<Vec<ProductRef>> {
        let products = sqlx::query_as::<_, ProductRef>(
            "SELECT id, sku, barcode, name, category
             FROM products
             WHERE is_active = 1
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a product and returns its generated id.
    ///
    /// ## Errors
    /// * [`DbError::UniqueViolation`] on a duplicate SKU
    pub async fn insert_product(
        &self,
        sku: &str,
        name: &str,
        barcode: Option<&str>,
        category: Option<&str>,
    ) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO products (id, sku, barcode, name, category, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&id)
        .bind(sku)
        .bind(barcode)
        .bind(name)
        .bind(category)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(product_id = %id, sku = %sku, "Product inserted");
        Ok(id)
    }

    // =========================================================================
    // Locations
    // =========================================================================

    /// Fetches a location by id.
    pub async fn get_location(&self, id: &str) -> DbResult<LocationRef> {
        let location =
            sqlx::query_as::<_, LocationRef>("SELECT id, name FROM locations WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| DbError::not_found("Location", id))?;

        Ok(location)
    }

    /// Lists active locations, ordered by name.
    pub async fn list_locations(&self) -> DbResult<Vec<LocationRef>> {
        let locations = sqlx::query_as::<_, LocationRef>(
            "SELECT id, name FROM locations WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    /// Inserts a location and returns its generated id.
    pub async fn insert_location(&self, name: &str) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO locations (id, name, is_active, created_at, updated_at)
             VALUES (?, ?, 1, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(location_id = %id, name = %name, "Location inserted");
        Ok(id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};

    use super::*;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_product() {
        let db = test_db().await;
        let repo = db.reference();

        let id = repo
            .insert_product("PARA-500", "Paracetamol 500mg", Some("7501001234567"), None)
            .await
            .unwrap();

        let product = repo.get_product(&id).await.unwrap();
        assert_eq!(product.sku, "PARA-500");
        assert_eq!(product.barcode.as_deref(), Some("7501001234567"));
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = test_db().await;
        let repo = db.reference();

        repo.insert_product("PARA-500", "Paracetamol", None, None)
            .await
            .unwrap();
        let err = repo
            .insert_product("PARA-500", "Paracetamol forte", None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let db = test_db().await;
        let err = db.reference().get_product("nope").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_locations_listed_by_name() {
        let db = test_db().await;
        let repo = db.reference();

        repo.insert_location("Sucursal Norte").await.unwrap();
        repo.insert_location("Farmacia Central").await.unwrap();

        let locations = repo.list_locations().await.unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].name, "Farmacia Central");
    }
}
