//! # User Repository
//!
//! Database operations for users.

use std::collections::HashMap;

use backoffice_core::search::{search_text, USER_SEARCH};
use backoffice_core::validation::{validate_email, validate_user_name};
use backoffice_core::{NewUser, Page, PageRequest, SearchTerm, User, ValidationErrors};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::search::fetch_page;

const USER_COLUMNS: &str = "id, name, email, created_at, updated_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// One page of users whose name or email contains `term`,
    /// ordered by name then id.
    pub async fn search(&self, term: &SearchTerm, request: &PageRequest) -> DbResult<Page<User>> {
        fetch_page(&self.pool, &USER_SEARCH, USER_COLUMNS, term, request).await
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Inserts a new user.
    ///
    /// The email is stored lowercased. A taken email surfaces as
    /// [`DbError::UniqueViolation`].
    pub async fn insert(&self, user: &NewUser) -> DbResult<User> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_user_name(&user.name) {
            errors.push(e);
        }
        let email = validate_email(&user.email).map_err(|e| errors.push(e)).ok();
        let email = errors.into_result(email)?.unwrap_or_default();

        let now = Utc::now();
        let name = user.name.trim().to_string();

        debug!(email = %email, "Inserting user");

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, search_text, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
        )
        .bind(&name)
        .bind(&email)
        .bind(search_text([Some(name.as_str()), Some(email.as_str())]))
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(id, "User created");

        Ok(User {
            id,
            name,
            email,
            created_at: now,
            updated_at: now,
        })
    }

    /// Deletes a user. Fails with a foreign key violation while the user
    /// still owns purchases.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id, "User deleted");
        Ok(())
    }

    /// Counts all users.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Whether a user with `id` exists, on the caller's connection.
    pub(crate) async fn exists(conn: &mut SqliteConnection, id: i64) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(found.is_some())
    }

    /// Loads the users with the given ids, keyed by id.
    pub(crate) async fn by_ids(pool: &SqlitePool, ids: &[i64]) -> DbResult<HashMap<i64, User>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE id IN ("));
        let mut list = query.separated(", ");
        for id in ids {
            list.push_bind(*id);
        }
        query.push(")");

        let users: Vec<User> = query.build_query_as::<User>().fetch_all(pool).await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
