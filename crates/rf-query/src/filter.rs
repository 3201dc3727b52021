//! # Filter Combinators
//!
//! Filters are a tagged list of clauses (field, operator, value) rather than
//! opaque closures, so a persistence boundary can interpret them natively
//! (SQL WHERE, document query, in-memory scan) without reflection or
//! expression compilation.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A projected field value, comparable across entities of the same type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Uuid(Uuid),
    OptUuid(Option<Uuid>),
    Time(DateTime<Utc>),
}

impl FieldValue {
    fn rank(&self) -> u8 {
        match self {
            FieldValue::Str(_) => 0,
            FieldValue::Int(_) => 1,
            FieldValue::Bool(_) => 2,
            FieldValue::Uuid(_) => 3,
            FieldValue::OptUuid(_) => 4,
            FieldValue::Time(_) => 5,
        }
    }

    /// Total order. Mixed variants cannot arise from a correct `Queryable`
    /// projection; they still compare deterministically by variant.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Str(a), FieldValue::Str(b)) => a.cmp(b),
            (FieldValue::Int(a), FieldValue::Int(b)) => a.cmp(b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => a.cmp(b),
            (FieldValue::OptUuid(a), FieldValue::OptUuid(b)) => a.cmp(b),
            (FieldValue::Time(a), FieldValue::Time(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<Uuid> for FieldValue {
    fn from(v: Uuid) -> Self {
        FieldValue::Uuid(v)
    }
}

impl From<Option<Uuid>> for FieldValue {
    fn from(v: Option<Uuid>) -> Self {
        FieldValue::OptUuid(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Time(v)
    }
}

/// An entity whose fields can be projected for filtering and sorting.
pub trait Queryable: Send + Sync {
    type Field: Copy + Eq + std::fmt::Debug + Send + Sync + 'static;

    fn project(&self, field: Self::Field) -> FieldValue;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    Eq,
    Ne,
    /// Case-insensitive substring match on string fields
    Contains,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// One filter condition: field ⊕ value.
#[derive(Debug, Clone)]
pub struct FilterClause<F> {
    field: F,
    op: FilterOp,
    value: FieldValue,
}

impl<F: Copy> FilterClause<F> {
    pub fn new(field: F, op: FilterOp, value: impl Into<FieldValue>) -> Self {
        Self {
            field,
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: F, value: impl Into<FieldValue>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    /// Case-insensitive substring search. The term is trimmed and
    /// lower-cased here, once, at construction.
    pub fn contains(field: F, term: &str) -> Self {
        Self::new(field, FilterOp::Contains, term.trim().to_lowercase())
    }

    pub fn field(&self) -> F {
        self.field
    }

    pub fn op(&self) -> FilterOp {
        self.op
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn matches<T>(&self, entity: &T) -> bool
    where
        T: Queryable<Field = F>,
    {
        let actual = entity.project(self.field);
        match self.op {
            FilterOp::Eq => actual == self.value,
            FilterOp::Ne => actual != self.value,
            FilterOp::Contains => match (&actual, &self.value) {
                (FieldValue::Str(hay), FieldValue::Str(needle)) => {
                    hay.to_lowercase().contains(needle.as_str())
                }
                _ => false,
            },
            FilterOp::Gt => actual.compare(&self.value) == Ordering::Greater,
            FilterOp::Gte => actual.compare(&self.value) != Ordering::Less,
            FilterOp::Lt => actual.compare(&self.value) == Ordering::Less,
            FilterOp::Lte => actual.compare(&self.value) != Ordering::Greater,
        }
    }
}

/// A conjunction of filter clauses. The empty predicate matches everything.
///
/// `and` appends to the clause list, so composition is associative and
/// evaluation short-circuits on the first failing clause.
pub struct Predicate<T: Queryable> {
    clauses: Vec<FilterClause<T::Field>>,
}

impl<T: Queryable> Predicate<T> {
    pub fn all() -> Self {
        Self { clauses: Vec::new() }
    }

    pub fn of(clause: FilterClause<T::Field>) -> Self {
        Self { clauses: vec![clause] }
    }

    pub fn and(mut self, clause: FilterClause<T::Field>) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn and_all(mut self, mut other: Predicate<T>) -> Self {
        self.clauses.append(&mut other.clauses);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[FilterClause<T::Field>] {
        &self.clauses
    }

    pub fn matches(&self, entity: &T) -> bool {
        self.clauses.iter().all(|clause| clause.matches(entity))
    }
}

impl<T: Queryable> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            clauses: self.clauses.clone(),
        }
    }
}

impl<T: Queryable> Default for Predicate<T> {
    fn default() -> Self {
        Self::all()
    }
}

impl<T: Queryable> std::fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predicate").field("clauses", &self.clauses).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_core::Topic;
    use crate::fields::TopicField;

    fn topic(name: &str) -> Topic {
        Topic::create(name, Uuid::now_v7()).unwrap()
    }

    #[test]
    fn empty_predicate_matches_everything() {
        assert!(Predicate::<Topic>::all().matches(&topic("General")));
    }

    #[test]
    fn contains_is_case_insensitive_and_trimmed() {
        let t = topic("Rust Help Desk");
        let clause = FilterClause::contains(TopicField::Name, "  HELP ");
        assert!(clause.matches(&t));
        assert!(!FilterClause::contains(TopicField::Name, "python").matches(&t));
    }

    #[test]
    fn and_composition_is_associative() {
        let t = topic("Rust Help Desk");
        let c1 = || FilterClause::contains(TopicField::Name, "rust");
        let c2 = || FilterClause::contains(TopicField::Name, "help");
        let c3 = || FilterClause::contains(TopicField::Name, "desk");

        let left = Predicate::<Topic>::of(c1()).and_all(Predicate::of(c2())).and_all(Predicate::of(c3()));
        let right = Predicate::<Topic>::of(c1()).and_all(Predicate::of(c2()).and_all(Predicate::of(c3())));
        assert_eq!(left.matches(&t), right.matches(&t));
        assert_eq!(left.clauses().len(), right.clauses().len());

        let miss = Predicate::<Topic>::of(c1()).and(FilterClause::contains(TopicField::Name, "absent"));
        assert!(!miss.matches(&t));
    }

    #[test]
    fn range_operators_compare_projected_values() {
        let mut t = topic("General");
        let author = Uuid::now_v7();
        t.add_post("Valid title", "some post text", author).unwrap();
        t.add_post("Other title", "more post text", author).unwrap();

        assert!(FilterClause::new(TopicField::PostCount, FilterOp::Gte, 2u64).matches(&t));
        assert!(!FilterClause::new(TopicField::PostCount, FilterOp::Gt, 2u64).matches(&t));
        assert!(FilterClause::new(TopicField::PostCount, FilterOp::Lte, 2u64).matches(&t));
        assert!(FilterClause::new(TopicField::PostCount, FilterOp::Ne, 0u64).matches(&t));
    }

    #[test]
    fn eq_on_parent_id_distinguishes_roots() {
        let mut parent = topic("General topics");
        let child = parent.add_sub_topic("Help desk", Uuid::now_v7()).unwrap();

        let roots = FilterClause::eq(TopicField::ParentId, None::<Uuid>);
        assert!(roots.matches(&parent));
        assert!(!roots.matches(&child));

        let children = FilterClause::eq(TopicField::ParentId, Some(parent.id()));
        assert!(children.matches(&child));
    }
}
