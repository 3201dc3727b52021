//! # rf-store-memory
//!
//! DashMap-backed implementation of the persistence boundary. One generic
//! collection serves all three entity types; filter clauses and sort keys
//! are interpreted directly over the in-memory rows.
//!
//! Rows carry a version; `update` with a stale version fails `Conflict`,
//! so a lost concurrent write is distinguishable from an absent row.
//! Every write is a single critical section on the row map, so a caller
//! cancelling (dropping) an operation never observes a partial mutation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rf_core::{AppError, Comment, Persisted, Post, Result, Topic};
use rf_query::{EntityStore, Predicate, Queryable, SortSpec};
use uuid::Uuid;

/// In-memory row collection for one entity type.
pub struct MemoryCollection<T> {
    rows: DashMap<Uuid, T>,
}

impl<T: Queryable + Persisted> MemoryCollection<T> {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Consistent snapshot of all rows, ordered by id. UUID v7 ids are
    /// time-ordered, so this is insertion order — the implicit final
    /// tie-break for sorting, and what makes repeated reads deterministic
    /// (DashMap iteration order is not).
    fn snapshot(&self) -> Vec<T> {
        let mut rows: Vec<T> = self.rows.iter().map(|entry| entry.value().clone()).collect();
        rows.sort_by_key(|row| row.id());
        rows
    }
}

impl<T: Queryable + Persisted> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Queryable + Persisted> EntityStore<T> for MemoryCollection<T> {
    async fn create(&self, mut entity: T) -> Result<T> {
        entity.detach_children();
        entity.stamp_created(Utc::now());
        entity.set_version(0);
        match self.rows.entry(entity.id()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "{} {} already exists",
                T::ENTITY,
                entity.id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(entity.clone());
                Ok(entity)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>> {
        Ok(self.rows.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_predicate(
        &self,
        predicate: &Predicate<T>,
        sort: &SortSpec<T>,
        skip: u64,
        take: u64,
    ) -> Result<Vec<T>> {
        let mut matched: Vec<T> = self
            .snapshot()
            .into_iter()
            .filter(|row| predicate.matches(row))
            .collect();
        // stable sort keeps id order on ties
        matched.sort_by(|a, b| sort.compare(a, b));
        Ok(matched
            .into_iter()
            .skip(skip as usize)
            .take(take as usize)
            .collect())
    }

    async fn count(&self, predicate: &Predicate<T>) -> Result<u64> {
        Ok(self
            .snapshot()
            .iter()
            .filter(|row| predicate.matches(row))
            .count() as u64)
    }

    async fn update(&self, mut entity: T) -> Result<T> {
        entity.detach_children();
        match self.rows.entry(entity.id()) {
            Entry::Vacant(_) => Err(AppError::NotFound {
                entity: T::ENTITY,
                id: entity.id(),
            }),
            Entry::Occupied(mut slot) => {
                let stored = slot.get();
                if stored.version() != entity.version() {
                    return Err(AppError::Conflict(format!(
                        "{} {} was modified concurrently (stored version {}, caller had {})",
                        T::ENTITY,
                        entity.id(),
                        stored.version(),
                        entity.version()
                    )));
                }
                entity.set_version(entity.version() + 1);
                entity.stamp_updated(Utc::now());
                slot.insert(entity.clone());
                Ok(entity)
            }
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.rows.remove(&id).is_some())
    }
}

/// The full in-memory persistence boundary: one collection per entity type.
/// Collections are shared via `Arc` so repositories can hold the subset
/// they need.
pub struct MemoryForumStore {
    pub topics: Arc<MemoryCollection<Topic>>,
    pub posts: Arc<MemoryCollection<Post>>,
    pub comments: Arc<MemoryCollection<Comment>>,
}

impl MemoryForumStore {
    pub fn new() -> Self {
        Self {
            topics: Arc::new(MemoryCollection::new()),
            posts: Arc::new(MemoryCollection::new()),
            comments: Arc::new(MemoryCollection::new()),
        }
    }
}

impl Default for MemoryForumStore {
    fn default() -> Self {
        Self::new()
    }
}
