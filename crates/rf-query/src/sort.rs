//! # Sort Combinators
//!
//! An ordered list of (field, direction) keys: the first is primary, each
//! subsequent key breaks ties of the previous ones. An empty spec means the
//! repository substitutes its documented default — never implicit natural
//! order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::filter::Queryable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey<F> {
    pub field: F,
    pub direction: SortDirection,
}

pub struct SortSpec<T: Queryable> {
    keys: Vec<SortKey<T::Field>>,
}

impl<T: Queryable> SortSpec<T> {
    /// No keys supplied: the consuming repository substitutes its default.
    pub fn unsorted() -> Self {
        Self { keys: Vec::new() }
    }

    pub fn by(field: T::Field, direction: SortDirection) -> Self {
        Self {
            keys: vec![SortKey { field, direction }],
        }
    }

    pub fn asc(field: T::Field) -> Self {
        Self::by(field, SortDirection::Asc)
    }

    pub fn desc(field: T::Field) -> Self {
        Self::by(field, SortDirection::Desc)
    }

    pub fn then(mut self, field: T::Field, direction: SortDirection) -> Self {
        self.keys.push(SortKey { field, direction });
        self
    }

    pub fn then_asc(self, field: T::Field) -> Self {
        self.then(field, SortDirection::Asc)
    }

    pub fn then_desc(self, field: T::Field) -> Self {
        self.then(field, SortDirection::Desc)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[SortKey<T::Field>] {
        &self.keys
    }

    /// Compares two entities key by key. Equal under every key yields
    /// `Equal`; the interpreter's stable sort then preserves identifier
    /// order as the implicit final tie-break.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        for key in &self.keys {
            let ord = a.project(key.field).compare(&b.project(key.field));
            let ord = match key.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl<T: Queryable> Clone for SortSpec<T> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
        }
    }
}

impl<T: Queryable> Default for SortSpec<T> {
    fn default() -> Self {
        Self::unsorted()
    }
}

impl<T: Queryable> std::fmt::Debug for SortSpec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortSpec").field("keys", &self.keys).finish()
    }
}
