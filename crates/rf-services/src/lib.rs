//! rusty-forum/crates/rf-services/src/lib.rs
//!
//! Application services: every operation authenticates the sender through
//! the gate, loads the affected aggregate, applies the domain mutation, and
//! persists the outcome. NotFound/Forbidden occurrences are logged here —
//! the layers below raise them but never log or swallow them.

use std::sync::Arc;

use rf_core::{
    AppError, AuthGate, Comment, IdentityResolver, Interaction, NotificationIntent,
    NotificationKind, NotificationSink, Post, Rating, Result, Topic,
};
use rf_query::{
    CommentField, EntityStore, FilterClause, Page, PageRequest, PostField, Predicate, SortSpec,
    TopicField,
};
use rf_repo::{CommentRepository, FetchShape, PostRepository, TopicRepository};
use uuid::Uuid;

/// Logs denied requests on the way out; everything else passes through
/// untouched.
fn observed<T>(op: &'static str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        match err {
            AppError::NotFound { .. } | AppError::Forbidden(_) | AppError::Unauthorized(_) => {
                tracing::warn!(%err, op, "request denied");
            }
            _ => {}
        }
    }
    result
}

pub struct ForumService {
    gate: AuthGate,
    topics: TopicRepository,
    posts: PostRepository,
    comments: CommentRepository,
    notifier: Arc<dyn NotificationSink>,
}

impl ForumService {
    pub fn new(
        resolver: Arc<dyn IdentityResolver>,
        topic_store: Arc<dyn EntityStore<Topic>>,
        post_store: Arc<dyn EntityStore<Post>>,
        comment_store: Arc<dyn EntityStore<Comment>>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            gate: AuthGate::new(resolver),
            topics: TopicRepository::new(topic_store.clone(), post_store.clone(), comment_store.clone()),
            posts: PostRepository::new(post_store, comment_store.clone()),
            comments: CommentRepository::new(comment_store),
            notifier,
        }
    }

    // ── Topics ───────────────────────────────────────────────────────────

    pub async fn create_topic(&self, token: &str, name: &str) -> Result<Topic> {
        let result = async {
            let user = self.gate.authenticate(token).await?;
            let topic = Topic::create(name, user)?;
            self.topics.create(topic).await
        }
        .await;
        observed("create_topic", result)
    }

    pub async fn add_sub_topic(&self, token: &str, parent_id: Uuid, name: &str) -> Result<Topic> {
        let result = async {
            let user = self.gate.authenticate(token).await?;
            let mut parent = self.require_topic(parent_id).await?;
            let child = parent.add_sub_topic(name, user)?;
            self.topics.create(child).await
        }
        .await;
        observed("add_sub_topic", result)
    }

    /// Removes a sub-topic and cascades its subtree. Permitted for the
    /// parent's owner, the sub-topic's owner, or a moderator of the parent.
    pub async fn remove_sub_topic(&self, token: &str, parent_id: Uuid, sub_id: Uuid) -> Result<()> {
        let result = async {
            let user = self.gate.authenticate(token).await?;
            let is_moderator = self.gate.moderator_status(user, parent_id).await?;
            let mut parent = self
                .topics
                .find_with_children(parent_id, FetchShape::SubTopics)
                .await?
                .ok_or(AppError::NotFound {
                    entity: "topic",
                    id: parent_id,
                })?;
            parent.remove_sub_topic(sub_id, user, is_moderator)?;
            self.topics.delete(sub_id).await?;
            Ok(())
        }
        .await;
        observed("remove_sub_topic", result)
    }

    pub async fn get_topic(&self, id: Uuid, shape: FetchShape) -> Result<Topic> {
        let result = async {
            self.topics
                .find_with_children(id, shape)
                .await?
                .ok_or(AppError::NotFound { entity: "topic", id })
        }
        .await;
        observed("get_topic", result)
    }

    /// Paged topic listing. An optional search term matches topic names
    /// case-insensitively; empty sort keys fall back to name ascending.
    pub async fn list_topics(
        &self,
        search: Option<&str>,
        sort: &SortSpec<Topic>,
        page: PageRequest,
    ) -> Result<Page<Topic>> {
        let mut predicate = Predicate::all();
        if let Some(term) = search {
            predicate = predicate.and(FilterClause::contains(TopicField::Name, term));
        }
        self.topics.find_page(&predicate, sort, page).await
    }

    pub async fn is_topic_owner(&self, topic_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.topics.is_owner(topic_id, user_id).await
    }

    // ── Posts ────────────────────────────────────────────────────────────

    pub async fn add_post(&self, token: &str, topic_id: Uuid, title: &str, text: &str) -> Result<Post> {
        let result = async {
            let user = self.gate.authenticate(token).await?;
            self.gate.ensure_not_banned(user, topic_id).await?;
            let mut topic = self.require_topic(topic_id).await?;
            let post = topic.add_post(title, text, user)?;
            let post = self.posts.create(post).await?;
            // post_count moved; persist the parent row
            self.topics.update(topic.clone()).await?;
            if topic.owner_id() != user {
                self.notifier
                    .publish(NotificationIntent {
                        recipient: topic.owner_id(),
                        kind: NotificationKind::NewPost {
                            topic_id,
                            post_id: post.id(),
                        },
                    })
                    .await;
            }
            Ok(post)
        }
        .await;
        observed("add_post", result)
    }

    /// Removes a post and cascades its comments. Permitted for the topic
    /// owner, the post's author, or a moderator of the topic.
    pub async fn remove_post(&self, token: &str, topic_id: Uuid, post_id: Uuid) -> Result<()> {
        let result = async {
            let user = self.gate.authenticate(token).await?;
            let is_moderator = self.gate.moderator_status(user, topic_id).await?;
            let mut topic = self
                .topics
                .find_with_children(topic_id, FetchShape::Posts)
                .await?
                .ok_or(AppError::NotFound {
                    entity: "topic",
                    id: topic_id,
                })?;
            topic.remove_post(post_id, user, is_moderator)?;
            self.posts.delete(post_id).await?;
            self.topics.update(topic).await?;
            Ok(())
        }
        .await;
        observed("remove_post", result)
    }

    /// Post text is mutable by its author only.
    pub async fn update_post_text(&self, token: &str, post_id: Uuid, text: &str) -> Result<Post> {
        let result = async {
            let user = self.gate.authenticate(token).await?;
            let mut post = self.require_post(post_id).await?;
            if post.author_id() != user {
                return Err(AppError::Forbidden(format!(
                    "user {user} is not the author of post {post_id}"
                )));
            }
            post.update_text(text)?;
            self.posts.update(post).await
        }
        .await;
        observed("update_post_text", result)
    }

    pub async fn get_post_with_comments(&self, id: Uuid) -> Result<Post> {
        let result = async {
            self.posts
                .find_with_comments(id)
                .await?
                .ok_or(AppError::NotFound { entity: "post", id })
        }
        .await;
        observed("get_post_with_comments", result)
    }

    /// Paged posts of one topic. The search term matches titles; empty sort
    /// keys fall back to creation time ascending.
    pub async fn list_posts(
        &self,
        topic_id: Uuid,
        search: Option<&str>,
        sort: &SortSpec<Post>,
        page: PageRequest,
    ) -> Result<Page<Post>> {
        let mut predicate = Predicate::of(FilterClause::eq(PostField::TopicId, topic_id));
        if let Some(term) = search {
            predicate = predicate.and(FilterClause::contains(PostField::Title, term));
        }
        self.posts.find_page(&predicate, sort, page).await
    }

    // ── Comments ─────────────────────────────────────────────────────────

    pub async fn add_comment(&self, token: &str, post_id: Uuid, text: &str) -> Result<Comment> {
        let result = async {
            let user = self.gate.authenticate(token).await?;
            let mut post = self.require_post(post_id).await?;
            self.gate.ensure_not_banned(user, post.topic_id()).await?;
            let comment = post.add_comment(text, user)?;
            let comment = self.comments.create(comment).await?;
            if post.author_id() != user {
                self.notifier
                    .publish(NotificationIntent {
                        recipient: post.author_id(),
                        kind: NotificationKind::NewComment {
                            post_id,
                            comment_id: comment.id(),
                        },
                    })
                    .await;
            }
            Ok(comment)
        }
        .await;
        observed("add_comment", result)
    }

    /// Removes a comment. Permitted for the post author, the comment's own
    /// author, or a moderator of the post's topic.
    pub async fn remove_comment(&self, token: &str, post_id: Uuid, comment_id: Uuid) -> Result<()> {
        let result = async {
            let user = self.gate.authenticate(token).await?;
            let mut post = self
                .posts
                .find_with_comments(post_id)
                .await?
                .ok_or(AppError::NotFound {
                    entity: "post",
                    id: post_id,
                })?;
            let is_moderator = self.gate.moderator_status(user, post.topic_id()).await?;
            post.remove_comment(comment_id, user, is_moderator)?;
            self.comments.delete(comment_id).await?;
            Ok(())
        }
        .await;
        observed("remove_comment", result)
    }

    /// Comment text is mutable by its author only.
    pub async fn update_comment_text(&self, token: &str, comment_id: Uuid, text: &str) -> Result<Comment> {
        let result = async {
            let user = self.gate.authenticate(token).await?;
            let mut comment =
                self.comments
                    .find_by_id(comment_id)
                    .await?
                    .ok_or(AppError::NotFound {
                        entity: "comment",
                        id: comment_id,
                    })?;
            if comment.author_id() != user {
                return Err(AppError::Forbidden(format!(
                    "user {user} is not the author of comment {comment_id}"
                )));
            }
            comment.update_text(text)?;
            self.comments.update(comment).await
        }
        .await;
        observed("update_comment_text", result)
    }

    /// Paged comments of one post. The search term matches comment text.
    pub async fn list_comments(
        &self,
        post_id: Uuid,
        search: Option<&str>,
        sort: &SortSpec<Comment>,
        page: PageRequest,
    ) -> Result<Page<Comment>> {
        let mut predicate = Predicate::of(FilterClause::eq(CommentField::PostId, post_id));
        if let Some(term) = search {
            predicate = predicate.and(FilterClause::contains(CommentField::Text, term));
        }
        self.comments.find_page(&predicate, sort, page).await
    }

    // ── Interactions ─────────────────────────────────────────────────────

    /// Adds or updates the sender's own reaction on a post.
    pub async fn rate_post(&self, token: &str, post_id: Uuid, rating: Rating) -> Result<Interaction> {
        let result = async {
            let user = self.gate.authenticate(token).await?;
            let mut post = self.require_post(post_id).await?;
            let interaction = post.add_interaction(user, rating);
            self.posts.update(post).await?;
            Ok(interaction)
        }
        .await;
        observed("rate_post", result)
    }

    /// Changes an existing post interaction. Only the interaction's own
    /// user may do this; anyone else is Forbidden.
    pub async fn change_post_rating(
        &self,
        token: &str,
        post_id: Uuid,
        interaction_id: Uuid,
        rating: Rating,
    ) -> Result<()> {
        let result = async {
            let user = self.gate.authenticate(token).await?;
            let mut post = self.require_post(post_id).await?;
            post.set_interaction_rating(interaction_id, rating, user)?;
            self.posts.update(post).await?;
            Ok(())
        }
        .await;
        observed("change_post_rating", result)
    }

    /// Adds or updates the sender's own reaction on a comment.
    pub async fn rate_comment(&self, token: &str, comment_id: Uuid, rating: Rating) -> Result<Interaction> {
        let result = async {
            let user = self.gate.authenticate(token).await?;
            let mut comment =
                self.comments
                    .find_by_id(comment_id)
                    .await?
                    .ok_or(AppError::NotFound {
                        entity: "comment",
                        id: comment_id,
                    })?;
            let interaction = comment.add_interaction(user, rating);
            self.comments.update(comment).await?;
            Ok(interaction)
        }
        .await;
        observed("rate_comment", result)
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    async fn require_topic(&self, id: Uuid) -> Result<Topic> {
        self.topics
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound { entity: "topic", id })
    }

    async fn require_post(&self, id: Uuid) -> Result<Post> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound { entity: "post", id })
    }
}
