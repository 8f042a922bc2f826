//! Derived sort/filter views
//!
//! `project` is a pure function of (tokens, sort, filters). `DerivedView`
//! memoizes the last projection per category and only recomputes when the
//! collection revision, the sort or the filters changed. Revision stamps are
//! unique across store instances, so one view can serve several stores.

use std::cmp::Ordering;

use types::sort::{SortDirection, SortField, TableFilters, TableSort};
use types::token::{Category, Token};

use crate::store::CategoryStore;

/// Filter then stable-sort a token collection. The input is not modified.
///
/// Every present threshold in `filters` must hold. Ties on the sort field
/// keep their input order, for both directions.
pub fn project(
    tokens: &[Token],
    field: SortField,
    direction: SortDirection,
    filters: &TableFilters,
) -> Vec<Token> {
    let mut rows: Vec<Token> = tokens
        .iter()
        .filter(|token| filters.matches(token))
        .cloned()
        .collect();

    // slice::sort_by is stable
    rows.sort_by(|a, b| {
        let ord = compare(field.value(a), field.value(b));
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });

    rows
}

/// `project` with a [`TableSort`].
pub fn project_sorted(tokens: &[Token], sort: TableSort, filters: &TableFilters) -> Vec<Token> {
    project(tokens, sort.field, sort.direction, filters)
}

/// Total numeric order. NaN sorts above +inf (below -inf when negative).
fn compare(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

#[derive(Debug, Clone, PartialEq)]
struct ViewKey {
    revision: u64,
    sort: TableSort,
    filters: TableFilters,
}

#[derive(Debug, Default)]
struct CachedView {
    key: Option<ViewKey>,
    rows: Vec<Token>,
}

/// Per-category memo of the last projection.
#[derive(Debug, Default)]
pub struct DerivedView {
    cache: [CachedView; 3],
    recomputations: u64,
}

impl DerivedView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projection of `category` under the store's current sort and filters.
    pub fn rows(&mut self, store: &CategoryStore, category: Category) -> &[Token] {
        self.rows_with(store, category, store.sort(), store.filters())
    }

    /// Projection of `category` under an explicit sort and filters.
    pub fn rows_with(
        &mut self,
        store: &CategoryStore,
        category: Category,
        sort: TableSort,
        filters: &TableFilters,
    ) -> &[Token] {
        let key = ViewKey {
            revision: store.revision(category),
            sort,
            filters: filters.clone(),
        };

        let cached = &mut self.cache[category.index()];
        if cached.key.as_ref() != Some(&key) {
            cached.rows = project_sorted(store.tokens(category), sort, filters);
            cached.key = Some(key);
            self.recomputations += 1;
        }

        &cached.rows
    }

    /// Number of times any projection was recomputed.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}
