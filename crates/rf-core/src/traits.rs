//! # Core Traits (Ports)
//!
//! External collaborators the core consumes, plus the contract every
//! persisted aggregate fulfills toward the storage boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Contract between an aggregate and the persistence boundary.
///
/// Timestamps and row versions are stamped by the boundary, never by domain
/// logic; child collections are a hydration workspace and are detached
/// before a row is written.
pub trait Persisted: Clone + Send + Sync + 'static {
    /// Entity name used in NotFound errors and log lines.
    const ENTITY: &'static str;

    fn id(&self) -> Uuid;
    fn version(&self) -> u64;
    fn set_version(&mut self, version: u64);
    fn stamp_created(&mut self, at: DateTime<Utc>);
    fn stamp_updated(&mut self, at: DateTime<Utc>);
    fn detach_children(&mut self);
}

/// Relationship kinds resolvable for a (user, topic) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    Owner,
    Moderator,
    Banned,
    Subscribed,
}

/// Inter-service identity and relationship resolution.
///
/// A failure of any of these calls must propagate to the caller as an
/// authorization failure, never as a silent allow.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Maps an external identity token to a user id.
    async fn resolve_user_id(&self, token: &str) -> Result<Uuid>;

    /// Checks a single relationship between a user and a topic.
    async fn has_relationship(&self, user_id: Uuid, topic_id: Uuid, kind: RelationKind) -> Result<bool>;

    /// Lists every topic the user is banned from.
    async fn list_banned_topics(&self, user_id: Uuid) -> Result<Vec<Uuid>>;
}

/// What a notification-intent message is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    NewPost { topic_id: Uuid, post_id: Uuid },
    NewComment { post_id: Uuid, comment_id: Uuid },
}

/// A fire-and-forget message addressed to one affected user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub recipient: Uuid,
    pub kind: NotificationKind,
}

/// Outbound notification fan-out. Delivery, retry and read-state tracking
/// live in the external notification subsystem; publishing is infallible
/// from the core's point of view.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, intent: NotificationIntent);
}
