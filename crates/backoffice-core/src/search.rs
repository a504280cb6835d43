//! # Search and Pagination
//!
//! Describes a listing request completely before it reaches the store:
//! which entity, which fields a term is matched against, the fixed order,
//! the page size, the normalised term and the requested page.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET /dashboard/products?search=Laptop&page=2                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SearchTerm::parse("Laptop")      PageRequest::parse("2", 15)          │
//! │       │                                  │                              │
//! │       └──────────────┬───────────────────┘                              │
//! │                      ▼                                                  │
//! │  PRODUCT_SEARCH ── fields: name, description, category, sku            │
//! │                    order:  name ASC, id ASC                            │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  backoffice-db: COUNT(*) + SELECT … LIMIT 15 OFFSET 15                 │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  Page::new(rows, request, total, term)                                 │
//! │    next_page_query = "search=Laptop&page=3"                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The page carries its filter explicitly, so continuation links never
//! depend on ambient request state.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::EntityKind;
use crate::validation::validate_search_query;
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PURCHASE_PAGE_SIZE};

// =============================================================================
// Search Specification
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Collation comparing text by its Unicode lowercase form. Registered on
/// every connection by `backoffice-db`.
pub const CASE_FOLDED_COLLATION: &str = "UNICASE";

/// Column holding the case-folded searchable fields of a row.
pub const SEARCH_TEXT_COLUMN: &str = "search_text";

/// Joins the fields inside [`SEARCH_TEXT_COLUMN`]. Search terms never
/// contain it, so a match cannot straddle two fields.
pub const FIELD_SEPARATOR: char = '\u{1f}';

/// One column of an ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: &'static str,
    pub direction: SortDirection,
    pub collation: Option<&'static str>,
}

impl SortKey {
    pub const fn asc(column: &'static str) -> Self {
        SortKey {
            column,
            direction: SortDirection::Asc,
            collation: None,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        SortKey {
            column,
            direction: SortDirection::Desc,
            collation: None,
        }
    }

    /// Ascending, ignoring case (`bob` before `Zed`).
    pub const fn asc_folded(column: &'static str) -> Self {
        SortKey {
            column,
            direction: SortDirection::Asc,
            collation: Some(CASE_FOLDED_COLLATION),
        }
    }

    fn to_sql(self) -> String {
        match self.collation {
            Some(collation) => format!(
                "{} COLLATE {} {}",
                self.column,
                collation,
                self.direction.as_sql()
            ),
            None => format!("{} {}", self.column, self.direction.as_sql()),
        }
    }
}

/// Case folding shared by stored search text and search terms.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Builds the [`SEARCH_TEXT_COLUMN`] value from a row's searchable fields,
/// in [`SearchSpec::fields`] order. Missing values count as empty.
///
/// ```rust
/// use backoffice_core::search::search_text;
///
/// assert_eq!(search_text([Some("Émile Zola"), Some("EZ@example.com")]), "émile zola\u{1f}ez@example.com");
/// ```
pub fn search_text<'a>(fields: impl IntoIterator<Item = Option<&'a str>>) -> String {
    let mut text = String::new();
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            text.push(FIELD_SEPARATOR);
        }
        text.push_str(&fold_case(field.unwrap_or_default()));
    }
    text
}

/// Static description of how one entity is listed.
///
/// Column names are compile-time constants and are the only identifiers
/// ever spliced into SQL. Search terms are always bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSpec {
    pub entity: EntityKind,
    /// Fields a term is matched against (OR across fields), folded into
    /// [`SEARCH_TEXT_COLUMN`] on every write.
    pub fields: &'static [&'static str],
    /// Total order; the last key is always the unique `id`.
    pub order: &'static [SortKey],
    pub per_page: u32,
}

impl SearchSpec {
    /// Renders the ORDER BY list, e.g. `name COLLATE UNICASE ASC, id ASC`.
    pub fn order_by_clause(&self) -> String {
        self.order
            .iter()
            .map(|key| key.to_sql())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub const USER_SEARCH: SearchSpec = SearchSpec {
    entity: EntityKind::User,
    fields: &["name", "email"],
    order: &[SortKey::asc_folded("name"), SortKey::asc("id")],
    per_page: DEFAULT_PAGE_SIZE,
};

pub const PRODUCT_SEARCH: SearchSpec = SearchSpec {
    entity: EntityKind::Product,
    fields: &["name", "description", "category", "sku"],
    order: &[SortKey::asc_folded("name"), SortKey::asc("id")],
    per_page: DEFAULT_PAGE_SIZE,
};

pub const PURCHASE_SEARCH: SearchSpec = SearchSpec {
    entity: EntityKind::Purchase,
    fields: &["transaction_id", "status", "payment_method", "notes"],
    order: &[SortKey::desc("created_at"), SortKey::desc("id")],
    per_page: PURCHASE_PAGE_SIZE,
};

// =============================================================================
// Search Term
// =============================================================================

/// A normalised free-text filter. Absent, empty and whitespace-only input
/// all mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerm(Option<String>);

impl SearchTerm {
    /// No filter.
    pub fn none() -> Self {
        SearchTerm(None)
    }

    /// Trims the raw query and rejects terms longer than the maximum.
    ///
    /// ```rust
    /// use backoffice_core::SearchTerm;
    ///
    /// assert_eq!(SearchTerm::parse(Some("  Laptop ")).unwrap().as_str(), Some("Laptop"));
    /// assert_eq!(SearchTerm::parse(Some("   ")).unwrap(), SearchTerm::none());
    /// ```
    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationError> {
        let Some(raw) = raw else {
            return Ok(SearchTerm::none());
        };

        let term = validate_search_query(raw)?;
        if term.is_empty() {
            Ok(SearchTerm::none())
        } else {
            Ok(SearchTerm(Some(term)))
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// Case-folded `%term%` for `search_text LIKE … ESCAPE '\'`, with `%`,
    /// `_` and `\` matched literally.
    ///
    /// ```rust
    /// use backoffice_core::SearchTerm;
    ///
    /// let term = SearchTerm::parse(Some("50%_OFF")).unwrap();
    /// assert_eq!(term.like_pattern().as_deref(), Some(r"%50\%\_off%"));
    /// ```
    pub fn like_pattern(&self) -> Option<String> {
        let term = fold_case(self.0.as_deref()?);
        let mut pattern = String::with_capacity(term.len() + 2);
        pattern.push('%');
        for c in term.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        Some(pattern)
    }
}

// =============================================================================
// Page Request
// =============================================================================

/// A validated 1-based page number with its page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> CoreResult<Self> {
        if page == 0 {
            return Err(CoreError::invalid_argument("page", "must be at least 1"));
        }
        if per_page == 0 || per_page > MAX_PAGE_SIZE {
            return Err(CoreError::invalid_argument(
                "per_page",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }
        Ok(PageRequest { page, per_page })
    }

    /// First page of the given size.
    pub fn first(per_page: u32) -> CoreResult<Self> {
        PageRequest::new(1, per_page)
    }

    /// Parses the `page` query parameter. Absent or empty means page 1.
    ///
    /// ```rust
    /// use backoffice_core::PageRequest;
    ///
    /// assert_eq!(PageRequest::parse(Some("3"), 15).unwrap().page(), 3);
    /// assert_eq!(PageRequest::parse(None, 15).unwrap().page(), 1);
    /// assert!(PageRequest::parse(Some("abc"), 15).is_err());
    /// assert!(PageRequest::parse(Some("0"), 15).is_err());
    /// assert!(PageRequest::parse(Some("-1"), 15).is_err());
    /// ```
    pub fn parse(raw: Option<&str>, per_page: u32) -> CoreResult<Self> {
        let raw = raw.map(str::trim).unwrap_or("");
        if raw.is_empty() {
            return PageRequest::first(per_page);
        }

        let page = raw
            .parse::<u32>()
            .map_err(|_| CoreError::invalid_argument("page", format!("'{raw}' is not a positive integer")))?;
        PageRequest::new(page, per_page)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Rows skipped before this page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

// =============================================================================
// Page
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PageFilters {
    pub search: Option<String>,
}

/// One page of an ordered listing plus everything a UI needs to link to
/// its neighbours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    /// Never below 1, even for an empty listing.
    pub last_page: u32,
    /// 1-based ordinal of the first row, `None` when `data` is empty.
    pub from: Option<u64>,
    pub to: Option<u64>,
    pub filters: PageFilters,
    pub next_page_query: Option<String>,
    pub prev_page_query: Option<String>,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: &PageRequest, total: u64, term: &SearchTerm) -> Self {
        let per_page = u64::from(request.per_page());
        let last_page = u32::try_from(total.div_ceil(per_page).max(1)).unwrap_or(u32::MAX);
        let current_page = request.page();

        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let first = request.offset() as u64 + 1;
            (Some(first), Some(first + data.len() as u64 - 1))
        };

        let next_page_query =
            (current_page < last_page).then(|| Self::query_for(term, current_page + 1));
        let prev_page_query =
            (current_page > 1).then(|| Self::query_for(term, current_page - 1));

        Page {
            data,
            current_page,
            per_page: request.per_page(),
            total,
            last_page,
            from,
            to,
            filters: PageFilters {
                search: term.as_str().map(str::to_string),
            },
            next_page_query,
            prev_page_query,
        }
    }

    /// Query string addressing `page` of the same filtered listing.
    ///
    /// ```rust
    /// use backoffice_core::{Page, SearchTerm};
    ///
    /// let term = SearchTerm::parse(Some("Gaming Mouse")).unwrap();
    /// assert_eq!(Page::<()>::query_for(&term, 2), "search=Gaming+Mouse&page=2");
    /// assert_eq!(Page::<()>::query_for(&SearchTerm::none(), 2), "page=2");
    /// ```
    pub fn query_for(term: &SearchTerm, page: u32) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(search) = term.as_str() {
            query.append_pair("search", search);
        }
        query.append_pair("page", &page.to_string());
        query.finish()
    }

    /// Replaces the rows, keeping the page metadata.
    pub fn with_data<U>(self, data: Vec<U>) -> Page<U> {
        Page {
            data,
            current_page: self.current_page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
            from: self.from,
            to: self.to,
            filters: self.filters,
            next_page_query: self.next_page_query,
            prev_page_query: self.prev_page_query,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn request(page: u32, per_page: u32) -> PageRequest {
        PageRequest::new(page, per_page).unwrap()
    }

    #[test]
    fn test_order_by_clause() {
        assert_eq!(
            PRODUCT_SEARCH.order_by_clause(),
            "name COLLATE UNICASE ASC, id ASC"
        );
        assert_eq!(PURCHASE_SEARCH.order_by_clause(), "created_at DESC, id DESC");
        assert_eq!(USER_SEARCH.per_page, 15);
        assert_eq!(PURCHASE_SEARCH.per_page, 10);
    }

    #[test]
    fn test_search_term_normalisation() {
        assert_eq!(SearchTerm::parse(None).unwrap(), SearchTerm::none());
        assert_eq!(SearchTerm::parse(Some("")).unwrap(), SearchTerm::none());
        assert_eq!(SearchTerm::parse(Some(" \t ")).unwrap(), SearchTerm::none());
        assert!(SearchTerm::none().like_pattern().is_none());

        let long = "a".repeat(101);
        let err = SearchTerm::parse(Some(&long)).unwrap_err();
        assert_eq!(err.field(), "search");
    }

    #[test]
    fn test_like_pattern_escapes_backslash() {
        let term = SearchTerm::parse(Some(r"C:\tmp")).unwrap();
        assert_eq!(term.like_pattern().as_deref(), Some(r"%c:\\tmp%"));
    }

    #[test]
    fn test_like_pattern_folds_unicode_case() {
        let term = SearchTerm::parse(Some("ÉMILE")).unwrap();
        assert_eq!(term.as_str(), Some("ÉMILE"));
        assert_eq!(term.like_pattern().as_deref(), Some("%émile%"));
    }

    #[test]
    fn test_search_text_keeps_fields_apart() {
        let text = search_text([Some("Gaming Mouse"), None, Some("ELECTRONICS")]);
        assert_eq!(text, "gaming mouse\u{1f}\u{1f}electronics");
        assert!(!text.contains("mouse electronics"));
    }

    #[test]
    fn test_search_term_rejects_separator() {
        let err = SearchTerm::parse(Some("a\u{1f}b")).unwrap_err();
        assert_eq!(err.field(), "search");
    }

    #[test]
    fn test_page_request_offsets() {
        let req = request(3, 15);
        assert_eq!(req.offset(), 30);
        assert_eq!(req.limit(), 15);

        assert!(matches!(
            PageRequest::new(0, 15),
            Err(CoreError::InvalidArgument { .. })
        ));
        assert!(PageRequest::new(1, MAX_PAGE_SIZE + 1).is_err());
        assert!(PageRequest::parse(Some("1.5"), 15).is_err());
        assert_eq!(PageRequest::parse(Some(" "), 10).unwrap(), request(1, 10));
    }

    #[test]
    fn test_page_metadata() {
        let term = SearchTerm::parse(Some("Laptop")).unwrap();
        let page = Page::new(vec![16, 17, 18], &request(2, 15), 33, &term);

        assert_eq!(page.last_page, 3);
        assert_eq!(page.from, Some(16));
        assert_eq!(page.to, Some(18));
        assert_eq!(page.filters.search.as_deref(), Some("Laptop"));
        assert_eq!(page.next_page_query.as_deref(), Some("search=Laptop&page=3"));
        assert_eq!(page.prev_page_query.as_deref(), Some("search=Laptop&page=1"));
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let page: Page<i32> = Page::new(vec![], &request(1, 15), 0, &SearchTerm::none());
        assert_eq!(page.last_page, 1);
        assert_eq!(page.from, None);
        assert!(page.next_page_query.is_none());
        assert!(page.prev_page_query.is_none());
    }

    #[test]
    fn test_beyond_last_page_is_empty_not_error() {
        let page: Page<i32> = Page::new(vec![], &request(9, 10), 20, &SearchTerm::none());
        assert!(page.is_empty());
        assert_eq!(page.current_page, 9);
        assert_eq!(page.last_page, 2);
        assert!(page.next_page_query.is_none());
        assert_eq!(page.prev_page_query.as_deref(), Some("page=8"));
    }

    #[test]
    fn test_exact_multiple_of_page_size() {
        let page = Page::new(vec![(); 15], &request(2, 15), 30, &SearchTerm::none());
        assert_eq!(page.last_page, 2);
        assert!(page.next_page_query.is_none());
    }

    #[test]
    fn test_with_data_keeps_metadata() {
        let page = Page::new(vec![1, 2], &request(1, 10), 2, &SearchTerm::none());
        let mapped = page.clone().with_data(vec!["a", "b"]);
        assert_eq!(mapped.total, page.total);
        assert_eq!(mapped.to, Some(2));
        assert_eq!(mapped.data, vec!["a", "b"]);
    }
}
