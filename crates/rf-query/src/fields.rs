//! # Field Projections
//!
//! `Queryable` implementations for the core entities. Keeping these here
//! keeps rf-core free of query vocabulary while letting every store and
//! repository share one field enum per entity.

use rf_core::{Comment, Post, Topic};

use crate::filter::{FieldValue, Queryable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicField {
    Name,
    OwnerId,
    ParentId,
    PostCount,
    CreatedAt,
    UpdatedAt,
}

impl Queryable for Topic {
    type Field = TopicField;

    fn project(&self, field: TopicField) -> FieldValue {
        match field {
            TopicField::Name => FieldValue::Str(self.name().to_string()),
            TopicField::OwnerId => FieldValue::Uuid(self.owner_id()),
            TopicField::ParentId => FieldValue::OptUuid(self.parent_id()),
            TopicField::PostCount => FieldValue::Int(self.post_count() as i64),
            TopicField::CreatedAt => FieldValue::Time(self.created_at()),
            TopicField::UpdatedAt => FieldValue::Time(self.updated_at()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostField {
    TopicId,
    AuthorId,
    Title,
    Text,
    CreatedAt,
    UpdatedAt,
}

impl Queryable for Post {
    type Field = PostField;

    fn project(&self, field: PostField) -> FieldValue {
        match field {
            PostField::TopicId => FieldValue::Uuid(self.topic_id()),
            PostField::AuthorId => FieldValue::Uuid(self.author_id()),
            PostField::Title => FieldValue::Str(self.title().to_string()),
            PostField::Text => FieldValue::Str(self.text().to_string()),
            PostField::CreatedAt => FieldValue::Time(self.created_at()),
            PostField::UpdatedAt => FieldValue::Time(self.updated_at()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentField {
    PostId,
    AuthorId,
    Text,
    CreatedAt,
    UpdatedAt,
}

impl Queryable for Comment {
    type Field = CommentField;

    fn project(&self, field: CommentField) -> FieldValue {
        match field {
            CommentField::PostId => FieldValue::Uuid(self.post_id()),
            CommentField::AuthorId => FieldValue::Uuid(self.author_id()),
            CommentField::Text => FieldValue::Str(self.text().to_string()),
            CommentField::CreatedAt => FieldValue::Time(self.created_at()),
            CommentField::UpdatedAt => FieldValue::Time(self.updated_at()),
        }
    }
}
