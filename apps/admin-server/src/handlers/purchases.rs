//! Purchase listing, detail and writes.
//!
//! ```text
//!   GET    /dashboard/purchases          page of 10, newest first
//!   POST   /dashboard/purchases          ──303──► /dashboard/purchases/{id}
//!   GET    /dashboard/purchases/{id}     detail + prev/next navigation
//!   PUT    /dashboard/purchases/{id}     ──303──► /dashboard/purchases/{id}
//!   DELETE /dashboard/purchases/{id}     ──303──► /dashboard/purchases
//! ```
//!
//! Writes take a JSON or form-encoded [`PurchaseInput`].

use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::Json;
use backoffice_core::purchase::PurchaseInput;
use backoffice_core::{Page, PageRequest, PurchaseDetail, SearchTerm, PURCHASE_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::extract::Payload;
use crate::handlers::ListQuery;
use crate::state::AppState;

const INDEX_PATH: &str = "/dashboard/purchases";

fn detail_path(id: i64) -> String {
    format!("{}/{}", INDEX_PATH, id)
}

/// `?page=` of the listing the detail was opened from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailQuery {
    pub page: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationView {
    /// 1-based position in ascending id order.
    pub current: usize,
    pub total: usize,
    pub previous_id: Option<i64>,
    pub next_id: Option<i64>,
    /// Listing page to return to.
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseView {
    pub purchase: PurchaseDetail,
    pub navigation: NavigationView,
}

/// `GET /dashboard/purchases`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<PurchaseDetail>>> {
    let term = SearchTerm::parse(query.search.as_deref())?;
    let request = PageRequest::parse(query.page.as_deref(), PURCHASE_PAGE_SIZE)?;

    let page = state.db.purchases().search(&term, &request).await?;
    debug!(total = page.total, page = page.current_page, "Listed purchases");

    Ok(Json(page))
}

/// `GET /dashboard/purchases/{id}`
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<DetailQuery>,
) -> ApiResult<Json<PurchaseView>> {
    let listing = PageRequest::parse(query.page.as_deref(), PURCHASE_PAGE_SIZE)?;
    let shown = state.db.purchases().show(id).await?;

    Ok(Json(PurchaseView {
        purchase: shown.purchase,
        navigation: NavigationView {
            current: shown.position.index,
            total: shown.position.total,
            previous_id: shown.position.previous_id,
            next_id: shown.position.next_id,
            page: listing.page(),
        },
    }))
}

/// `POST /dashboard/purchases`
pub async fn create(
    State(state): State<AppState>,
    Payload(input): Payload<PurchaseInput>,
) -> ApiResult<Redirect> {
    let created = state.db.purchases().create(&input).await?;
    info!(id = created.purchase.id, "Purchase created via dashboard");

    Ok(Redirect::to(&detail_path(created.purchase.id)))
}

/// `PUT /dashboard/purchases/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Payload(input): Payload<PurchaseInput>,
) -> ApiResult<Redirect> {
    state.db.purchases().update(id, &input).await?;
    info!(id, "Purchase updated via dashboard");

    Ok(Redirect::to(&detail_path(id)))
}

/// `DELETE /dashboard/purchases/{id}`
pub async fn destroy(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Redirect> {
    state.db.purchases().delete(id).await?;
    info!(id, "Purchase deleted via dashboard");

    Ok(Redirect::to(INDEX_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::handlers::test_support;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use backoffice_core::purchase::LineInput;
    use backoffice_core::{NewProduct, NewUser};

    struct Fixture {
        state: AppState,
        user_id: i64,
        product_ids: Vec<i64>,
    }

    /// One user and two products priced 10.00 and 5.00.
    async fn fixture() -> Fixture {
        let state = test_support::state().await;
        let user = state
            .db
            .users()
            .insert(&NewUser {
                name: "Buyer".to_string(),
                email: "buyer@example.com".to_string(),
            })
            .await
            .unwrap();

        let mut product_ids = Vec::new();
        for (sku, price_cents) in [("P-1", 1000), ("P-2", 500)] {
            let product = state
                .db
                .products()
                .insert(&NewProduct {
                    name: format!("Product {}", sku),
                    description: None,
                    price_cents,
                    category: "Books".to_string(),
                    stock: 10,
                    sku: sku.to_string(),
                    is_active: true,
                })
                .await
                .unwrap();
            product_ids.push(product.id);
        }

        Fixture {
            state,
            user_id: user.id,
            product_ids,
        }
    }

    fn input(fx: &Fixture, transaction_id: &str) -> PurchaseInput {
        PurchaseInput {
            user_id: Some(fx.user_id),
            status: Some("completed".to_string()),
            payment_method: Some("cash".to_string()),
            transaction_id: Some(transaction_id.to_string()),
            notes: None,
            lines: Some(vec![
                LineInput {
                    product_id: fx.product_ids[0],
                    quantity: 2,
                },
                LineInput {
                    product_id: fx.product_ids[1],
                    quantity: 1,
                },
            ]),
        }
    }

    fn location(redirect: Redirect) -> String {
        let response = redirect.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        response.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_create_redirects_to_detail() {
        let fx = fixture().await;

        let redirect = create(State(fx.state.clone()), Payload(input(&fx, "tx1")))
            .await
            .unwrap();
        let target = location(redirect);
        let id: i64 = target.rsplit('/').next().unwrap().parse().unwrap();
        assert_eq!(target, format!("/dashboard/purchases/{}", id));

        let Json(view) = show(
            State(fx.state),
            Path(id),
            Query(DetailQuery {
                page: Some("3".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(view.purchase.purchase.total_amount_cents, 2500);
        assert_eq!(view.purchase.lines.len(), 2);
        assert_eq!(view.navigation.current, 1);
        assert_eq!(view.navigation.total, 1);
        assert_eq!(view.navigation.page, 3);
    }

    #[tokio::test]
    async fn test_create_invalid_reports_every_field() {
        let fx = fixture().await;
        let mut bad = input(&fx, "tx1");
        bad.status = Some("shipped".to_string());
        bad.payment_method = None;
        bad.lines = Some(vec![LineInput {
            product_id: fx.product_ids[0],
            quantity: 0,
        }]);

        let err = create(State(fx.state.clone()), Payload(bad)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let fields = err.errors.unwrap();
        assert!(fields.contains_key("status"));
        assert!(fields.contains_key("payment_method"));
        assert!(fields.contains_key("lines.0.quantity"));

        let Json(page) = list(State(fx.state), Query(ListQuery::default()))
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_duplicate_transaction_id_is_422() {
        let fx = fixture().await;
        create(State(fx.state.clone()), Payload(input(&fx, "tx1")))
            .await
            .unwrap();

        let err = create(State(fx.state.clone()), Payload(input(&fx, "tx1")))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(err.errors.unwrap().contains_key("transaction_id"));
        assert_eq!(fx.state.db.purchases().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_navigation_between_purchases() {
        let fx = fixture().await;
        let mut ids = Vec::new();
        for n in 0..3 {
            let target = location(
                create(State(fx.state.clone()), Payload(input(&fx, &format!("tx{}", n))))
                    .await
                    .unwrap(),
            );
            ids.push(target.rsplit('/').next().unwrap().parse::<i64>().unwrap());
        }

        let Json(view) = show(State(fx.state.clone()), Path(ids[1]), Query(DetailQuery::default()))
            .await
            .unwrap();
        assert_eq!(
            view.navigation,
            NavigationView {
                current: 2,
                total: 3,
                previous_id: Some(ids[0]),
                next_id: Some(ids[2]),
                page: 1,
            }
        );

        let Json(page) = list(State(fx.state), Query(ListQuery::default()))
            .await
            .unwrap();
        let listed: Vec<i64> = page.data.iter().map(|d| d.purchase.id).collect();
        assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let fx = fixture().await;
        let target = location(
            create(State(fx.state.clone()), Payload(input(&fx, "tx1")))
                .await
                .unwrap(),
        );
        let id: i64 = target.rsplit('/').next().unwrap().parse().unwrap();

        let mut changed = input(&fx, "tx1");
        changed.lines = Some(vec![LineInput {
            product_id: fx.product_ids[1],
            quantity: 3,
        }]);
        let redirect = update(State(fx.state.clone()), Path(id), Payload(changed))
            .await
            .unwrap();
        assert_eq!(location(redirect), target);

        let detail = fx.state.db.purchases().get_detail(id).await.unwrap().unwrap();
        assert_eq!(detail.purchase.total_amount_cents, 1500);

        let redirect = destroy(State(fx.state.clone()), Path(id)).await.unwrap();
        assert_eq!(location(redirect), "/dashboard/purchases");

        let err = show(State(fx.state), Path(id), Query(DetailQuery::default()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_missing_purchase_is_not_found() {
        let fx = fixture().await;
        let err = destroy(State(fx.state), Path(404)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
