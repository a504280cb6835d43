//! # Role Repository
//!
//! Roles and the `role_user` assignment table.
//!
//! ```text
//!   users ──< role_user >── roles
//!              (user_id, role_id) primary key: assigning twice is a no-op
//! ```

use backoffice_core::{NewRole, Role, User, ValidationError, ValidationErrors};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

const ROLE_COLUMNS: &str = "id, name, slug, description, is_active, created_at, updated_at";

/// The roles every installation starts with: `(name, slug, description)`.
pub const STANDARD_ROLES: [(&str, &str, &str); 4] = [
    (
        "Administrator",
        "administrator",
        "Full system access with all permissions",
    ),
    ("Manager", "manager", "Can manage users and view reports"),
    ("Editor", "editor", "Can create and edit content"),
    ("Viewer", "viewer", "Read-only access to content"),
];

/// Repository for role database operations.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    /// Creates a new RoleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RoleRepository { pool }
    }

    /// Inserts a role. A taken slug surfaces as [`DbError::UniqueViolation`].
    pub async fn insert(&self, role: &NewRole) -> DbResult<Role> {
        let mut errors = ValidationErrors::new();
        let name = role.name.trim().to_string();
        let slug = role.slug.trim().to_lowercase();
        if name.is_empty() {
            errors.push(ValidationError::Required {
                field: "name".to_string(),
            });
        }
        if slug.is_empty() {
            errors.push(ValidationError::Required {
                field: "slug".to_string(),
            });
        } else if !slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            errors.push(ValidationError::InvalidFormat {
                field: "slug".to_string(),
                reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
            });
        }
        errors.into_result(())?;

        let now = Utc::now();
        debug!(slug = %slug, "Inserting role");

        let result = sqlx::query(
            r#"
            INSERT INTO roles (name, slug, description, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(&name)
        .bind(&slug)
        .bind(&role.description)
        .bind(role.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(id, slug = %slug, "Role created");

        Ok(Role {
            id,
            name,
            slug,
            description: role.description.clone(),
            is_active: role.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Inserts any of [`STANDARD_ROLES`] that are missing and returns the
    /// full catalogue.
    pub async fn ensure_standard_roles(&self) -> DbResult<Vec<Role>> {
        let now = Utc::now();
        for (name, slug, description) in STANDARD_ROLES {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO roles (name, slug, description, is_active, created_at, updated_at)
                VALUES (?1, ?2, ?3, 1, ?4, ?4)
                "#,
            )
            .bind(name)
            .bind(slug)
            .bind(description)
            .bind(now)
            .execute(&self.pool)
            .await?;
        }

        self.list().await
    }

    /// All roles, by id.
    pub async fn list(&self) -> DbResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE slug = ?1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    /// Grants `role_id` to `user_id`. Idempotent.
    ///
    /// Unknown ids surface as [`DbError::ForeignKeyViolation`].
    pub async fn attach_user(&self, role_id: i64, user_id: i64) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO role_user (user_id, role_id, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (user_id, role_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(role_id, user_id, "Role granted");
        Ok(())
    }

    /// Revokes `role_id` from `user_id`.
    pub async fn detach_user(&self, role_id: i64, user_id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM role_user WHERE user_id = ?1 AND role_id = ?2")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "Role assignment",
                format!("{role_id}/{user_id}"),
            ));
        }

        info!(role_id, user_id, "Role revoked");
        Ok(())
    }

    /// Roles held by a user, by role id.
    pub async fn roles_for_user(&self, user_id: i64) -> DbResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.name, r.slug, r.description, r.is_active, r.created_at, r.updated_at
            FROM roles r
            INNER JOIN role_user ru ON ru.role_id = r.id
            WHERE ru.user_id = ?1
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    /// Users holding a role, by name.
    pub async fn users_for_role(&self, role_id: i64) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.email, u.created_at, u.updated_at
            FROM users u
            INNER JOIN role_user ru ON ru.user_id = u.id
            WHERE ru.role_id = ?1
            ORDER BY u.name, u.id
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Whether the user holds the active role `slug`.
    pub async fn has_role(&self, user_id: i64, slug: &str) -> DbResult<bool> {
        self.has_any_role(user_id, &[slug]).await
    }

    /// Whether the user holds at least one of the active roles in `slugs`.
    pub async fn has_any_role(&self, user_id: i64, slugs: &[&str]) -> DbResult<bool> {
        if slugs.is_empty() {
            return Ok(false);
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM role_user ru
                INNER JOIN roles r ON r.id = ru.role_id
                WHERE r.is_active = 1 AND ru.user_id = "#,
        );
        query.push_bind(user_id);
        query.push(" AND r.slug IN (");
        let mut list = query.separated(", ");
        for slug in slugs {
            list.push_bind(slug.to_string());
        }
        query.push("))");

        let found: bool = query.build_query_scalar::<bool>().fetch_one(&self.pool).await?;
        Ok(found)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use backoffice_core::NewUser;

    async fn setup() -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = db
            .users()
            .insert(&NewUser {
                name: "Test User".to_string(),
                email: "test@example.com".to_string(),
            })
            .await
            .unwrap();
        (db, user.id)
    }

    #[tokio::test]
    async fn test_standard_roles_idempotent() {
        let (db, _) = setup().await;

        let first = db.roles().ensure_standard_roles().await.unwrap();
        let second = db.roles().ensure_standard_roles().await.unwrap();
        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
        assert!(db.roles().get_by_slug("administrator").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_attach_and_query() {
        let (db, user_id) = setup().await;
        let roles = db.roles();
        roles.ensure_standard_roles().await.unwrap();
        let admin = roles.get_by_slug("administrator").await.unwrap().unwrap();

        roles.attach_user(admin.id, user_id).await.unwrap();
        roles.attach_user(admin.id, user_id).await.unwrap();

        let held = roles.roles_for_user(user_id).await.unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].slug, "administrator");

        let holders = roles.users_for_role(admin.id).await.unwrap();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].id, user_id);

        assert!(roles.has_role(user_id, "administrator").await.unwrap());
        assert!(!roles.has_role(user_id, "viewer").await.unwrap());
        assert!(roles.has_any_role(user_id, &["viewer", "administrator"]).await.unwrap());
        assert!(!roles.has_any_role(user_id, &[]).await.unwrap());

        roles.detach_user(admin.id, user_id).await.unwrap();
        assert!(!roles.has_role(user_id, "administrator").await.unwrap());
        assert!(roles.detach_user(admin.id, user_id).await.is_err());
    }

    #[tokio::test]
    async fn test_inactive_role_does_not_count() {
        let (db, user_id) = setup().await;
        let role = db
            .roles()
            .insert(&NewRole {
                name: "Auditor".to_string(),
                slug: "Auditor".to_string(),
                description: None,
                is_active: false,
            })
            .await
            .unwrap();
        assert_eq!(role.slug, "auditor");

        db.roles().attach_user(role.id, user_id).await.unwrap();
        assert!(!db.roles().has_role(user_id, "auditor").await.unwrap());
    }

    #[tokio::test]
    async fn test_attach_unknown_user_rejected() {
        let (db, _) = setup().await;
        let roles = db.roles().ensure_standard_roles().await.unwrap();

        let err = db.roles().attach_user(roles[0].id, 999).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let (db, _) = setup().await;
        db.roles().ensure_standard_roles().await.unwrap();

        let err = db
            .roles()
            .insert(&NewRole {
                name: "Admin again".to_string(),
                slug: "administrator".to_string(),
                description: None,
                is_active: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
