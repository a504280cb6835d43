//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Paged substring search over name, description, category and SKU
//! - CRUD operations
//! - Price lookups for purchase line snapshots
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Staff types: "laptop"                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LIKE '%laptop%' against: name, description, category, sku (OR)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │ products                                │                           │
//! │  │ Laptop Pro    | Electronics | LAP-001   │ ← MATCH (name)            │
//! │  │ Mouse         | "for laptops" | MOU-01  │ ← MATCH (description)     │
//! │  │ Desk Chair    | Home        | CHR-001   │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ORDER BY name ASC, id ASC, 15 per page                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use backoffice_core::search::{search_text, PRODUCT_SEARCH};
use backoffice_core::validation::{
    validate_price_cents, validate_product_name, validate_sku, validate_stock,
};
use backoffice_core::{
    Money, NewProduct, Page, PageRequest, Product, SearchTerm, ValidationError, ValidationErrors,
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::search::fetch_page;

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, category, stock, sku, \
                               is_active, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let term = SearchTerm::parse(Some("laptop"))?;
/// let page = repo.search(&term, &PageRequest::first(15)?).await?;
///
/// let product = repo.get_by_id(42).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// One page of products matching `term` in any searchable field.
    ///
    /// Inactive products are listed too; the back office manages them.
    pub async fn search(
        &self,
        term: &SearchTerm,
        request: &PageRequest,
    ) -> DbResult<Page<Product>> {
        fetch_page(&self.pool, &PRODUCT_SEARCH, PRODUCT_COLUMNS, term, request).await
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Validation
    /// Name, SKU, price and stock are checked and all failures reported
    /// together. A taken SKU surfaces as [`DbError::UniqueViolation`].
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        let mut errors = ValidationErrors::new();
        let checks = [
            validate_product_name(&product.name),
            validate_sku(&product.sku),
            validate_price_cents(product.price_cents),
            validate_stock(product.stock),
        ];
        for error in checks.into_iter().filter_map(Result::err) {
            errors.push(error);
        }
        if product.category.trim().is_empty() {
            errors.push(ValidationError::Required {
                field: "category".to_string(),
            });
        }
        errors.into_result(())?;

        let now = Utc::now();
        let name = product.name.trim().to_string();
        let sku = product.sku.trim().to_string();
        let category = product.category.trim().to_string();

        debug!(sku = %sku, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                name, description, price_cents, category,
                stock, sku, is_active, search_text, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(&name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&category)
        .bind(product.stock)
        .bind(&sku)
        .bind(product.is_active)
        .bind(search_text([
            Some(name.as_str()),
            product.description.as_deref(),
            Some(category.as_str()),
            Some(sku.as_str()),
        ]))
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(id, sku = %sku, "Product created");

        Ok(Product {
            id,
            name,
            description: product.description.clone(),
            price_cents: product.price_cents,
            category,
            stock: product.stock,
            sku,
            is_active: product.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Changes a product's list price.
    ///
    /// Existing purchase lines keep the price they were created with.
    pub async fn update_price(&self, id: i64, price_cents: i64) -> DbResult<()> {
        validate_price_cents(price_cents)?;

        let result = sqlx::query(
            "UPDATE products SET price_cents = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(price_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id, price_cents, "Product price updated");
        Ok(())
    }

    /// Deletes a product. Fails with a foreign key violation while any
    /// purchase line references it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id, "Product deleted");
        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Current prices of the given products, keyed by id. Unknown ids are
    /// simply absent from the map.
    pub(crate) async fn prices_for(
        conn: &mut SqliteConnection,
        ids: &[i64],
    ) -> DbResult<HashMap<i64, Money>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new("SELECT id, price_cents FROM products WHERE id IN (");
        let mut list = query.separated(", ");
        for id in ids {
            list.push_bind(*id);
        }
        query.push(")");

        let rows: Vec<(i64, i64)> = query.build_query_as::<(i64, i64)>().fetch_all(&mut *conn).await?;

        Ok(rows
            .into_iter()
            .map(|(id, cents)| (id, Money::from_cents(cents)))
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
