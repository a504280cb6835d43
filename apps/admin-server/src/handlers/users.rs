use axum::extract::{Query, State};
use axum::Json;
use backoffice_core::{Page, PageRequest, SearchTerm, User, DEFAULT_PAGE_SIZE};
use tracing::debug;

use crate::error::ApiResult;
use crate::handlers::ListQuery;
use crate::state::AppState;

/// `GET /dashboard/users`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<User>>> {
    let term = SearchTerm::parse(query.search.as_deref())?;
    let request = PageRequest::parse(query.page.as_deref(), DEFAULT_PAGE_SIZE)?;

    let page = state.db.users().search(&term, &request).await?;
    debug!(total = page.total, page = page.current_page, "Listed users");

    Ok(Json(page))
}
