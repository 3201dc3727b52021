//! # Paginated Query Engine
//!
//! The generic CRUD/query contract every persistence boundary implements,
//! plus the count-then-fetch paging algorithm built on it.
//!
//! Count and page are two separate round-trips; under concurrent writes
//! they may disagree. That is an accepted trade-off of this design, not a
//! bug — within one call the same predicate is applied to both.

use async_trait::async_trait;
use rf_core::{Persisted, Result};
use uuid::Uuid;

use crate::filter::{Predicate, Queryable};
use crate::page::{Page, PageRequest};
use crate::sort::SortSpec;

/// Persistence boundary for one aggregate type.
///
/// `delete` reports absence as `Ok(false)` rather than an error; callers
/// decide whether absence matters. `update` fails with `Conflict` when the
/// stored row's version moved on, distinct from `NotFound` for an absent
/// row.
#[async_trait]
pub trait EntityStore<T: Queryable + Persisted>: Send + Sync {
    async fn create(&self, entity: T) -> Result<T>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>>;

    async fn find_by_predicate(
        &self,
        predicate: &Predicate<T>,
        sort: &SortSpec<T>,
        skip: u64,
        take: u64,
    ) -> Result<Vec<T>>;

    async fn count(&self, predicate: &Predicate<T>) -> Result<u64>;

    async fn update(&self, entity: T) -> Result<T>;

    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Runs one paged query: count matches, fetch the requested slice, derive
/// page arithmetic. A page number past the end returns empty items with
/// correct metadata.
pub async fn fetch_page<T>(
    store: &dyn EntityStore<T>,
    predicate: &Predicate<T>,
    sort: &SortSpec<T>,
    request: PageRequest,
) -> Result<Page<T>>
where
    T: Queryable + Persisted,
{
    let total_count = store.count(predicate).await?;
    let items = store
        .find_by_predicate(predicate, sort, request.skip(), request.size())
        .await?;
    Ok(Page::assemble(items, request, total_count))
}
