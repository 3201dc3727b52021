//! rusty-forum/crates/rf-query/src/lib.rs
//!
//! Composable filter/sort descriptors, page types, and the paginated query
//! engine over the generic persistence port. Every repository in
//! Rusty-Forum builds on this crate.

pub mod engine;
pub mod fields;
pub mod filter;
pub mod page;
pub mod sort;

pub use engine::{fetch_page, EntityStore};
pub use fields::{CommentField, PostField, TopicField};
pub use filter::{FieldValue, FilterClause, FilterOp, Predicate, Queryable};
pub use page::{Page, PageRequest};
pub use sort::{SortDirection, SortKey, SortSpec};
