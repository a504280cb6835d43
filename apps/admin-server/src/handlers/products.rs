use axum::extract::{Query, State};
use axum::Json;
use backoffice_core::{Page, PageRequest, Product, SearchTerm, DEFAULT_PAGE_SIZE};
use tracing::debug;

use crate::error::ApiResult;
use crate::handlers::ListQuery;
use crate::state::AppState;

/// `GET /dashboard/products`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<Product>>> {
    let term = SearchTerm::parse(query.search.as_deref())?;
    let request = PageRequest::parse(query.page.as_deref(), DEFAULT_PAGE_SIZE)?;

    let page = state.db.products().search(&term, &request).await?;
    debug!(
        search = ?term.as_str(),
        total = page.total,
        page = page.current_page,
        "Listed products"
    );

    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support;
    use backoffice_core::NewProduct;

    async fn insert(state: &AppState, name: &str, sku: &str) {
        state
            .db
            .products()
            .insert(&NewProduct {
                name: name.to_string(),
                description: None,
                price_cents: 1000,
                category: "Electronics".to_string(),
                stock: 5,
                sku: sku.to_string(),
                is_active: true,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_search_keeps_filter_in_continuation() {
        let state = test_support::state().await;
        insert(&state, "Laptop Pro", "LAP-1").await;
        insert(&state, "Mouse", "MOU-1").await;

        let Json(page) = list(
            State(state),
            Query(test_support::query(Some("Laptop"), None)),
        )
        .await
        .unwrap();

        let names: Vec<_> = page.data.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Laptop Pro"]);
        assert_eq!(page.filters.search.as_deref(), Some("Laptop"));
        assert_eq!(page.next_page_query, None);
    }

    #[tokio::test]
    async fn test_blank_search_lists_everything() {
        let state = test_support::state().await;
        insert(&state, "Laptop Pro", "LAP-1").await;
        insert(&state, "Mouse", "MOU-1").await;

        let Json(page) = list(State(state), Query(test_support::query(Some("   "), None)))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.filters.search, None);
    }
}
