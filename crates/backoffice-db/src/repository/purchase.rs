//! # Purchase Repository
//!
//! Purchases, their lines, and the invariant that ties them together:
//! `purchases.total_amount_cents` always equals the sum of the line
//! subtotals.
//!
//! ## Purchase Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Purchase Lifecycle                                │
//! │                                                                         │
//! │  1. CREATE   create(input)                                              │
//! │     ├── field checks + user exists + transaction_id unused             │
//! │     ├── price lines from current product prices (snapshot)             │
//! │     └── INSERT purchase (total = Σ subtotal) + lines, one transaction  │
//! │                                                                         │
//! │  2. EDIT     update(id, input)                                          │
//! │     ├── same checks, transaction_id may stay the same                  │
//! │     └── lines supplied? replace them and recompute the total           │
//! │                                                                         │
//! │  3. ADJUST   attach(id, product, qty) / detach(id, product)             │
//! │     └── line change + total refresh, one transaction                   │
//! │                                                                         │
//! │  4. DELETE   delete(id)                                                 │
//! │     └── lines removed by ON DELETE CASCADE                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! The UNIQUE index on `transaction_id` is the final word: two writers that
//! both pass the duplicate pre-check race on the insert, and the loser gets
//! [`DbError::UniqueViolation`].

use std::collections::HashMap;

use backoffice_core::navigation::{position, Position};
use backoffice_core::purchase::{price_lines, total_of, PricedLine, PurchaseInput, PurchaseRecord};
use backoffice_core::search::PURCHASE_SEARCH;
use backoffice_core::validation::validate_quantity;
use backoffice_core::{
    Money, Page, PageRequest, Purchase, PurchaseDetail, PurchaseLine, SearchTerm, ValidationError,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::product::ProductRepository;
use crate::repository::search::fetch_page;
use crate::repository::user::UserRepository;

const PURCHASE_COLUMNS: &str = "id, user_id, total_amount_cents, status, payment_method, \
                                transaction_id, notes, created_at, updated_at";

const LINE_COLUMNS: &str = "id, purchase_id, product_id, quantity, price_cents, \
                            subtotal_cents, created_at, updated_at";

/// A purchase with its place in ascending-id order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseNavigation {
    pub purchase: PurchaseDetail,
    pub position: Position,
}

/// Logs store-level rejections; they passed every application check.
fn store_rejected(err: sqlx::Error) -> DbError {
    let err = DbError::from(err);
    if err.is_constraint_violation() {
        warn!(error = %err, "Store rejected purchase write");
    }
    err
}

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// One page of purchases, newest first, each with its user and lines.
    pub async fn search(
        &self,
        term: &SearchTerm,
        request: &PageRequest,
    ) -> DbResult<Page<PurchaseDetail>> {
        let mut page: Page<Purchase> =
            fetch_page(&self.pool, &PURCHASE_SEARCH, PURCHASE_COLUMNS, term, request).await?;

        let purchases = std::mem::take(&mut page.data);
        let details = self.with_relations(purchases).await?;
        Ok(page.with_data(details))
    }

    /// Gets a purchase by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Purchase>> {
        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(purchase)
    }

    /// Gets a purchase with its user and lines.
    pub async fn get_detail(&self, id: i64) -> DbResult<Option<PurchaseDetail>> {
        let Some(purchase) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let mut details = self.with_relations(vec![purchase]).await?;
        Ok(details.pop())
    }

    /// Lines of a purchase in insertion order.
    pub async fn lines_of(&self, purchase_id: i64) -> DbResult<Vec<PurchaseLine>> {
        let lines = sqlx::query_as::<_, PurchaseLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM purchase_product WHERE purchase_id = ?1 ORDER BY id"
        ))
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Where `id` sits among all purchases in ascending id order.
    pub async fn navigation(&self, id: i64) -> DbResult<Position> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM purchases ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        position(id, &ids).ok_or_else(|| DbError::not_found("Purchase", id))
    }

    /// Detail view: the purchase, its relations and its navigation.
    pub async fn show(&self, id: i64) -> DbResult<PurchaseNavigation> {
        let purchase = self
            .get_detail(id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", id))?;
        let position = self.navigation(id).await?;

        Ok(PurchaseNavigation { purchase, position })
    }

    /// Counts all purchases.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Batch-loads users and lines for a set of purchases, keeping their order.
    async fn with_relations(&self, purchases: Vec<Purchase>) -> DbResult<Vec<PurchaseDetail>> {
        if purchases.is_empty() {
            return Ok(Vec::new());
        }

        let mut user_ids: Vec<i64> = purchases.iter().map(|p| p.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let users = UserRepository::by_ids(&self.pool, &user_ids).await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {LINE_COLUMNS} FROM purchase_product WHERE purchase_id IN ("
        ));
        let mut list = query.separated(", ");
        for purchase in &purchases {
            list.push_bind(purchase.id);
        }
        query.push(") ORDER BY purchase_id, id");

        let lines: Vec<PurchaseLine> = query
            .build_query_as::<PurchaseLine>()
            .fetch_all(&self.pool)
            .await?;

        let mut lines_by_purchase: HashMap<i64, Vec<PurchaseLine>> = HashMap::new();
        for line in lines {
            lines_by_purchase.entry(line.purchase_id).or_default().push(line);
        }

        purchases
            .into_iter()
            .map(|purchase| {
                let user = users
                    .get(&purchase.user_id)
                    .cloned()
                    .ok_or_else(|| DbError::not_found("User", purchase.user_id))?;
                let lines = lines_by_purchase.remove(&purchase.id).unwrap_or_default();
                Ok(PurchaseDetail {
                    purchase,
                    user,
                    lines,
                })
            })
            .collect()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates a purchase and its lines in one transaction.
    ///
    /// ## What This Does
    /// 1. Field checks, user existence, transaction id uniqueness
    /// 2. Prices each line from the product's current price
    /// 3. Inserts the purchase with `total = Σ subtotal` (0 without lines)
    /// 4. Inserts the lines
    ///
    /// Every validation failure is reported at once; nothing is written
    /// unless all of them pass.
    pub async fn create(&self, input: &PurchaseInput) -> DbResult<PurchaseDetail> {
        let mut tx = self.pool.begin().await?;

        let (record, lines) = check_input(&mut tx, input, None).await?;
        let lines = lines.unwrap_or_default();
        let total = total_of(&lines)?;
        let now = Utc::now();

        debug!(transaction_id = %record.transaction_id, lines = lines.len(), "Creating purchase");

        let result = sqlx::query(
            r#"
            INSERT INTO purchases (
                user_id, total_amount_cents, status, payment_method,
                transaction_id, notes, search_text, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
        )
        .bind(record.user_id)
        .bind(total.cents())
        .bind(record.status)
        .bind(record.payment_method)
        .bind(&record.transaction_id)
        .bind(&record.notes)
        .bind(record.search_text())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(store_rejected)?;

        let id = result.last_insert_rowid();
        insert_lines(&mut tx, id, &lines, now).await?;

        tx.commit().await?;

        info!(
            id,
            transaction_id = %record.transaction_id,
            total = %total,
            lines = lines.len(),
            "Purchase created"
        );

        self.get_detail(id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", id))
    }

    /// Updates a purchase in one transaction.
    ///
    /// `input.lines == None` keeps the current lines and total. Otherwise
    /// the lines are replaced by freshly priced ones and the total follows.
    pub async fn update(&self, id: i64, input: &PurchaseInput) -> DbResult<PurchaseDetail> {
        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut tx, id).await?;
        let (record, lines) = check_input(&mut tx, input, Some(id)).await?;
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE purchases SET
                user_id = ?2,
                status = ?3,
                payment_method = ?4,
                transaction_id = ?5,
                notes = ?6,
                search_text = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(record.user_id)
        .bind(record.status)
        .bind(record.payment_method)
        .bind(&record.transaction_id)
        .bind(&record.notes)
        .bind(record.search_text())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(store_rejected)?;

        if let Some(lines) = &lines {
            sqlx::query("DELETE FROM purchase_product WHERE purchase_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_lines(&mut tx, id, lines, now).await?;
            refresh_total(&mut tx, id, now).await?;
        }

        tx.commit().await?;

        info!(
            id,
            lines_replaced = lines.is_some(),
            "Purchase updated"
        );

        self.get_detail(id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", id))
    }

    /// Deletes a purchase; its lines go with it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM purchases WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase", id));
        }

        info!(id, "Purchase deleted");
        Ok(())
    }

    /// Adds one line to an existing purchase and refreshes its total.
    ///
    /// `price` defaults to the product's current price.
    pub async fn attach(
        &self,
        purchase_id: i64,
        product_id: i64,
        quantity: i64,
        price: Option<Money>,
    ) -> DbResult<PurchaseLine> {
        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut tx, purchase_id).await?;
        validate_quantity("quantity", quantity)?;

        let price = match price {
            Some(price) if price.is_negative() => {
                return Err(ValidationError::OutOfRange {
                    field: "price".to_string(),
                    min: 0,
                    max: i64::MAX,
                }
                .into());
            }
            Some(price) => price,
            None => ProductRepository::prices_for(&mut tx, &[product_id])
                .await?
                .remove(&product_id)
                .ok_or_else(|| ValidationError::UnknownReference {
                    field: "product_id".to_string(),
                    value: product_id.to_string(),
                })?,
        };

        let already: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM purchase_product WHERE purchase_id = ?1 AND product_id = ?2",
        )
        .bind(purchase_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;
        if already.is_some() {
            return Err(ValidationError::Duplicate {
                field: "product_id".to_string(),
                value: product_id.to_string(),
            }
            .into());
        }

        let subtotal = price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: i64::MAX / price.cents().max(1),
            })?;

        let now = Utc::now();
        let line = PricedLine {
            product_id,
            quantity,
            price,
            subtotal,
        };
        insert_lines(&mut tx, purchase_id, &[line], now).await?;
        refresh_total(&mut tx, purchase_id, now).await?;

        tx.commit().await?;

        info!(purchase_id, product_id, quantity, subtotal = %subtotal, "Line attached");

        let line = sqlx::query_as::<_, PurchaseLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM purchase_product WHERE purchase_id = ?1 AND product_id = ?2"
        ))
        .bind(purchase_id)
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(line)
    }

    /// Removes a product's line from a purchase and refreshes its total.
    pub async fn detach(&self, purchase_id: i64, product_id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result =
            sqlx::query("DELETE FROM purchase_product WHERE purchase_id = ?1 AND product_id = ?2")
                .bind(purchase_id)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "PurchaseLine",
                format!("{purchase_id}/{product_id}"),
            ));
        }

        refresh_total(&mut tx, purchase_id, Utc::now()).await?;
        tx.commit().await?;

        info!(purchase_id, product_id, "Line detached");
        Ok(())
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

async fn ensure_exists(conn: &mut SqliteConnection, id: i64) -> DbResult<()> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM purchases WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    found
        .map(|_| ())
        .ok_or_else(|| DbError::not_found("Purchase", id))
}

/// Every check a purchase payload must pass, pure and store-backed, with
/// all failures collected. `exclude_id` is the purchase being updated.
async fn check_input(
    conn: &mut SqliteConnection,
    input: &PurchaseInput,
    exclude_id: Option<i64>,
) -> DbResult<(PurchaseRecord, Option<Vec<PricedLine>>)> {
    let mut check = input.validate();

    if let Some(user_id) = check.user_id() {
        if !UserRepository::exists(&mut *conn, user_id).await? {
            check.reject(ValidationError::UnknownReference {
                field: "user_id".to_string(),
                value: user_id.to_string(),
            });
        }
    }

    if let Some(transaction_id) = check.transaction_id().map(str::to_string) {
        let taken: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM purchases WHERE transaction_id = ?1 AND (?2 IS NULL OR id != ?2)",
        )
        .bind(&transaction_id)
        .bind(exclude_id)
        .fetch_optional(&mut *conn)
        .await?;

        if taken.is_some() {
            check.reject(ValidationError::Duplicate {
                field: "transaction_id".to_string(),
                value: transaction_id,
            });
        }
    }

    let priced = match &input.lines {
        None => None,
        Some(lines) => {
            let ids: Vec<i64> = lines.iter().map(|l| l.product_id).collect();
            let prices = ProductRepository::prices_for(&mut *conn, &ids).await?;
            match price_lines(lines, &prices) {
                Ok(priced) => match total_of(&priced) {
                    Ok(_) => Some(priced),
                    Err(e) => {
                        check.reject(e);
                        None
                    }
                },
                Err(errors) => {
                    check.merge(errors);
                    None
                }
            }
        }
    };

    let record = check.finish().map_err(|errors| {
        warn!(
            failures = errors.len(),
            error = %errors,
            "Purchase input rejected"
        );
        DbError::Validation(errors)
    })?;

    Ok((record, priced))
}

async fn insert_lines(
    conn: &mut SqliteConnection,
    purchase_id: i64,
    lines: &[PricedLine],
    now: DateTime<Utc>,
) -> DbResult<()> {
    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO purchase_product (
                purchase_id, product_id, quantity, price_cents,
                subtotal_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(purchase_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.price.cents())
        .bind(line.subtotal.cents())
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(store_rejected)?;
    }

    Ok(())
}

/// Sets the stored total to Σ subtotal of the stored lines.
async fn refresh_total(
    conn: &mut SqliteConnection,
    purchase_id: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE purchases SET
            total_amount_cents = (
                SELECT COALESCE(SUM(subtotal_cents), 0)
                FROM purchase_product
                WHERE purchase_id = ?1
            ),
            updated_at = ?2
        WHERE id = ?1
        "#,
    )
    .bind(purchase_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use backoffice_core::purchase::LineInput;
    use backoffice_core::{NewProduct, NewUser, PaymentMethod, PurchaseStatus};

    struct Fixture {
        db: Database,
        user_id: i64,
        /// Priced 10.00, 5.00 and 2.50.
        product_ids: [i64; 3],
    }

    async fn setup() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = db
            .users()
            .insert(&NewUser {
                name: "Test User".to_string(),
                email: "test@example.com".to_string(),
            })
            .await
            .unwrap();

        let mut product_ids = [0; 3];
        for (i, price) in [1000, 500, 250].into_iter().enumerate() {
            let product = db
                .products()
                .insert(&NewProduct {
                    name: format!("Product {i}"),
                    description: None,
                    price_cents: price,
                    category: "Electronics".to_string(),
                    stock: 10,
                    sku: format!("SKU-{i}"),
                    is_active: true,
                })
                .await
                .unwrap();
            product_ids[i] = product.id;
        }

        Fixture {
            db,
            user_id: user.id,
            product_ids,
        }
    }

    fn input(user_id: i64, transaction_id: &str, lines: Option<Vec<LineInput>>) -> PurchaseInput {
        PurchaseInput {
            user_id: Some(user_id),
            status: Some("completed".to_string()),
            payment_method: Some("credit_card".to_string()),
            transaction_id: Some(transaction_id.to_string()),
            notes: None,
            lines,
        }
    }

    fn line(product_id: i64, quantity: i64) -> LineInput {
        LineInput {
            product_id,
            quantity,
        }
    }

    fn validation_errors(err: DbError) -> backoffice_core::ValidationErrors {
        match err {
            DbError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_computes_total() {
        let f = setup().await;
        let [a, b, _] = f.product_ids;

        let detail = f
            .db
            .purchases()
            .create(&input(f.user_id, "tx1", Some(vec![line(a, 2), line(b, 1)])))
            .await
            .unwrap();

        assert_eq!(detail.purchase.total_amount(), Money::from_cents(2500));
        assert_eq!(detail.purchase.total_amount().to_string(), "25.00");
        assert_eq!(detail.purchase.status, PurchaseStatus::Completed);
        assert_eq!(detail.purchase.payment_method, PaymentMethod::CreditCard);
        assert_eq!(detail.user.id, f.user_id);
        assert_eq!(detail.lines.len(), 2);
        assert_eq!(detail.lines[0].subtotal_cents, 2000);
        assert_eq!(detail.lines[1].subtotal_cents, 500);
        assert_eq!(detail.lines_total(), detail.purchase.total_amount());
    }

    #[tokio::test]
    async fn test_create_without_lines_totals_zero() {
        let f = setup().await;

        let detail = f
            .db
            .purchases()
            .create(&input(f.user_id, "tx-empty", None))
            .await
            .unwrap();
        assert!(detail.lines.is_empty());
        assert_eq!(detail.purchase.total_amount_cents, 0);
    }

    #[tokio::test]
    async fn test_duplicate_transaction_id_rejected() {
        let f = setup().await;
        let repo = f.db.purchases();
        let [a, ..] = f.product_ids;

        repo.create(&input(f.user_id, "tx1", Some(vec![line(a, 1)])))
            .await
            .unwrap();

        let err = repo
            .create(&input(f.user_id, "tx1", Some(vec![line(a, 3)])))
            .await
            .unwrap_err();
        let errors = validation_errors(err);
        assert!(errors.has_field("transaction_id"));

        assert_eq!(repo.count().await.unwrap(), 1);
        let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchase_product")
            .fetch_one(f.db.pool())
            .await
            .unwrap();
        assert_eq!(lines, 1);
    }

    #[tokio::test]
    async fn test_unique_index_surfaces_as_constraint_violation() {
        let f = setup().await;
        f.db.purchases()
            .create(&input(f.user_id, "tx1", None))
            .await
            .unwrap();

        // Bypasses the pre-check, as a racing writer would
        let err = sqlx::query(
            "INSERT INTO purchases (user_id, status, payment_method, transaction_id)
             VALUES (?1, 'pending', 'cash', 'tx1')",
        )
        .bind(f.user_id)
        .execute(f.db.pool())
        .await
        .unwrap_err();

        let err = store_rejected(err);
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "purchases.transaction_id"));
    }

    #[tokio::test]
    async fn test_all_failures_reported_together() {
        let f = setup().await;
        let [a, ..] = f.product_ids;
        let bad = PurchaseInput {
            user_id: Some(999),
            status: Some("invalid_status".to_string()),
            payment_method: Some("invalid_method".to_string()),
            transaction_id: Some("  ".to_string()),
            notes: None,
            lines: Some(vec![line(a, 0), line(4242, 1), line(a, 1)]),
        };

        let errors = validation_errors(f.db.purchases().create(&bad).await.unwrap_err());
        for field in [
            "user_id",
            "status",
            "payment_method",
            "transaction_id",
            "lines.0.quantity",
            "lines.1.product_id",
            "lines.2.product_id",
        ] {
            assert!(errors.has_field(field), "missing {field}");
        }
        assert_eq!(f.db.purchases().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_price_is_snapshotted() {
        let f = setup().await;
        let [a, ..] = f.product_ids;
        let detail = f
            .db
            .purchases()
            .create(&input(f.user_id, "tx1", Some(vec![line(a, 1)])))
            .await
            .unwrap();

        f.db.products().update_price(a, 9999).await.unwrap();

        let lines = f.db.purchases().lines_of(detail.purchase.id).await.unwrap();
        assert_eq!(lines[0].price_cents, 1000);
        let purchase = f.db.purchases().get_by_id(detail.purchase.id).await.unwrap().unwrap();
        assert_eq!(purchase.total_amount_cents, 1000);
    }

    #[tokio::test]
    async fn test_update_replaces_lines() {
        let f = setup().await;
        let repo = f.db.purchases();
        let [a, b, c] = f.product_ids;
        let created = repo
            .create(&input(f.user_id, "tx1", Some(vec![line(a, 1)])))
            .await
            .unwrap();

        let mut change = input(f.user_id, "tx1", Some(vec![line(b, 2), line(c, 4)]));
        change.status = Some("refunded".to_string());
        change.notes = Some("customer returned".to_string());

        let updated = repo.update(created.purchase.id, &change).await.unwrap();
        assert_eq!(updated.purchase.status, PurchaseStatus::Refunded);
        assert_eq!(updated.purchase.notes.as_deref(), Some("customer returned"));
        assert_eq!(updated.lines.len(), 2);
        assert_eq!(updated.purchase.total_amount_cents, 2000);
        assert_eq!(updated.lines_total(), updated.purchase.total_amount());
    }

    #[tokio::test]
    async fn test_update_without_lines_keeps_them() {
        let f = setup().await;
        let repo = f.db.purchases();
        let [a, b, _] = f.product_ids;
        let created = repo
            .create(&input(f.user_id, "tx1", Some(vec![line(a, 2), line(b, 1)])))
            .await
            .unwrap();

        let mut change = input(f.user_id, "tx1-renamed", None);
        change.payment_method = Some("paypal".to_string());

        let updated = repo.update(created.purchase.id, &change).await.unwrap();
        assert_eq!(updated.purchase.transaction_id, "tx1-renamed");
        assert_eq!(updated.purchase.payment_method, PaymentMethod::Paypal);
        assert_eq!(updated.lines, created.lines);
        assert_eq!(updated.purchase.total_amount_cents, 2500);
    }

    #[tokio::test]
    async fn test_update_transaction_id_conflict_and_missing() {
        let f = setup().await;
        let repo = f.db.purchases();
        repo.create(&input(f.user_id, "tx1", None)).await.unwrap();
        let second = repo.create(&input(f.user_id, "tx2", None)).await.unwrap();

        let err = repo
            .update(second.purchase.id, &input(f.user_id, "tx1", None))
            .await
            .unwrap_err();
        assert!(validation_errors(err).has_field("transaction_id"));

        assert!(matches!(
            repo.update(999, &input(f.user_id, "tx9", None)).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_lines() {
        let f = setup().await;
        let repo = f.db.purchases();
        let [a, b, c] = f.product_ids;
        let created = repo
            .create(&input(
                f.user_id,
                "tx1",
                Some(vec![line(a, 1), line(b, 1), line(c, 1)]),
            ))
            .await
            .unwrap();
        assert_eq!(created.lines.len(), 3);

        repo.delete(created.purchase.id).await.unwrap();

        assert!(repo.get_by_id(created.purchase.id).await.unwrap().is_none());
        assert!(repo.lines_of(created.purchase.id).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete(created.purchase.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_attach_and_detach_refresh_total() {
        let f = setup().await;
        let repo = f.db.purchases();
        let [a, b, c] = f.product_ids;
        let created = repo
            .create(&input(f.user_id, "tx1", Some(vec![line(a, 1)])))
            .await
            .unwrap();
        let id = created.purchase.id;

        let attached = repo.attach(id, b, 3, None).await.unwrap();
        assert_eq!(attached.price_cents, 500);
        assert_eq!(attached.subtotal_cents, 1500);
        assert_eq!(repo.get_by_id(id).await.unwrap().unwrap().total_amount_cents, 2500);

        let custom = repo.attach(id, c, 2, Some(Money::from_cents(100))).await.unwrap();
        assert_eq!(custom.subtotal_cents, 200);
        assert_eq!(repo.get_by_id(id).await.unwrap().unwrap().total_amount_cents, 2700);

        let dup = repo.attach(id, b, 1, None).await.unwrap_err();
        assert!(validation_errors(dup).has_field("product_id"));

        repo.detach(id, a).await.unwrap();
        let detail = repo.get_detail(id).await.unwrap().unwrap();
        assert_eq!(detail.purchase.total_amount_cents, 1700);
        assert_eq!(detail.lines_total(), detail.purchase.total_amount());

        assert!(matches!(repo.detach(id, a).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_attach_rejections() {
        let f = setup().await;
        let repo = f.db.purchases();
        let [a, ..] = f.product_ids;
        let id = repo.create(&input(f.user_id, "tx1", None)).await.unwrap().purchase.id;

        assert!(matches!(
            repo.attach(999, a, 1, None).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(validation_errors(repo.attach(id, a, 0, None).await.unwrap_err())
            .has_field("quantity"));
        assert!(validation_errors(repo.attach(id, 4242, 1, None).await.unwrap_err())
            .has_field("product_id"));
        assert_eq!(repo.get_by_id(id).await.unwrap().unwrap().total_amount_cents, 0);
    }

    #[tokio::test]
    async fn test_navigation_over_five() {
        let f = setup().await;
        let repo = f.db.purchases();
        let mut ids = Vec::new();
        for i in 1..=5 {
            ids.push(repo.create(&input(f.user_id, &format!("tx{i}"), None)).await.unwrap().purchase.id);
        }

        let middle = repo.navigation(ids[2]).await.unwrap();
        assert_eq!(middle.index, 3);
        assert_eq!(middle.total, 5);
        assert_eq!(middle.previous_id, Some(ids[1]));
        assert_eq!(middle.next_id, Some(ids[3]));

        let first = repo.navigation(ids[0]).await.unwrap();
        assert_eq!(first.previous_id, None);
        let last = repo.navigation(ids[4]).await.unwrap();
        assert_eq!(last.next_id, None);

        let shown = repo.show(ids[4]).await.unwrap();
        assert_eq!(shown.position.index, 5);
        assert_eq!(shown.purchase.purchase.id, ids[4]);

        assert!(matches!(repo.navigation(999).await, Err(DbError::NotFound { .. })));
        assert!(matches!(repo.show(999).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_search_newest_first_with_relations() {
        let f = setup().await;
        let repo = f.db.purchases();
        let [a, ..] = f.product_ids;
        for i in 1..=12 {
            repo.create(&input(f.user_id, &format!("TX-{i:03}"), Some(vec![line(a, 1)])))
                .await
                .unwrap();
        }

        let request = PageRequest::first(PURCHASE_SEARCH.per_page).unwrap();
        let page = repo.search(&SearchTerm::none(), &request).await.unwrap();
        assert_eq!(page.total, 12);
        assert_eq!(page.data.len(), 10);
        assert_eq!(page.last_page, 2);
        assert_eq!(page.data[0].purchase.transaction_id, "TX-012");
        assert!(page.data.iter().all(|d| d.user.id == f.user_id && d.lines.len() == 1));

        let term = SearchTerm::parse(Some("tx-00")).unwrap();
        let page = repo.search(&term, &request).await.unwrap();
        assert_eq!(page.total, 9);
        assert_eq!(page.next_page_query, None);

        let by_status = SearchTerm::parse(Some("completed")).unwrap();
        assert_eq!(repo.search(&by_status, &request).await.unwrap().total, 12);
    }
}
