//! # Listing Queries
//!
//! Turns a [`SearchSpec`], [`SearchTerm`] and [`PageRequest`] into the two
//! queries every listing needs: a COUNT over the filtered set and one
//! ordered page of rows.
//!
//! ```text
//! SELECT COUNT(*) FROM products
//!  WHERE search_text LIKE ?1 ESCAPE '\'
//!
//! SELECT <columns> FROM products
//!  WHERE (…same filter…)
//!  ORDER BY name COLLATE UNICASE ASC, id ASC
//!  LIMIT ?n OFFSET ?m
//! ```
//!
//! `search_text` holds every searchable field case-folded, separated by a
//! character no term may contain, so one LIKE matches any single field.
//! Identifiers come from `'static` specs; user input is only ever bound.

use backoffice_core::search::{SearchSpec, SEARCH_TEXT_COLUMN};
use backoffice_core::{Page, PageRequest, SearchTerm};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, pattern: Option<&str>) {
    let Some(pattern) = pattern else {
        return;
    };

    builder.push(format!(" WHERE {SEARCH_TEXT_COLUMN} LIKE "));
    builder.push_bind(pattern.to_string());
    builder.push(" ESCAPE '\\'");
}

/// Counts the filtered set and fetches one page of it.
///
/// A page past the end yields empty `data` with the real `total`.
pub(crate) async fn fetch_page<T>(
    pool: &SqlitePool,
    spec: &SearchSpec,
    columns: &str,
    term: &SearchTerm,
    request: &PageRequest,
) -> DbResult<Page<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let table = spec.entity.table_name();
    let pattern = term.like_pattern();

    debug!(
        table,
        search = ?term.as_str(),
        page = request.page(),
        per_page = request.per_page(),
        "Searching"
    );

    let mut count_query = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {table}"));
    push_filter(&mut count_query, pattern.as_deref());
    let total: i64 = count_query.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {columns} FROM {table}"));
    push_filter(&mut select, pattern.as_deref());
    select.push(" ORDER BY ");
    select.push(spec.order_by_clause());
    select.push(" LIMIT ");
    select.push_bind(request.limit());
    select.push(" OFFSET ");
    select.push_bind(request.offset());

    let rows: Vec<T> = select.build_query_as::<T>().fetch_all(pool).await?;

    debug!(table, total, returned = rows.len(), "Search complete");

    Ok(Page::new(rows, request, total.max(0) as u64, term))
}
