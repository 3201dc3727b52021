//! # Domain Models
//!
//! The content aggregate of Rusty-Forum: topics form a tree (root topics have
//! no parent), topics own posts, posts own comments, and posts/comments own
//! interactions. Every state change goes through a validated factory or
//! mutator; fields stay private so bounds and parent linkage cannot be
//! bypassed from outside this module.
//!
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

pub const TOPIC_NAME_MIN: usize = 5;
pub const TOPIC_NAME_MAX: usize = 25;
pub const POST_TITLE_MIN: usize = 5;
pub const POST_TITLE_MAX: usize = 30;
pub const POST_TEXT_MIN: usize = 5;
pub const POST_TEXT_MAX: usize = 1500;
pub const COMMENT_TEXT_MIN: usize = 5;
pub const COMMENT_TEXT_MAX: usize = 500;

fn check_len(field: &'static str, value: &str, min: usize, max: usize) -> Result<()> {
    let actual = value.chars().count();
    if actual < min || actual > max {
        return Err(AppError::InvalidLength {
            field,
            actual,
            min,
            max,
        });
    }
    Ok(())
}

/// Like/dislike rating carried by an [`Interaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Like,
    Dislike,
}

/// A single user's reaction to a post or comment.
///
/// The only mutable field is the rating, and only the interaction's own user
/// may change it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    id: Uuid,
    /// The post or comment this interaction belongs to
    subject_id: Uuid,
    user_id: Uuid,
    rating: Rating,
}

impl Interaction {
    fn new(subject_id: Uuid, user_id: Uuid, rating: Rating) -> Self {
        Self {
            id: Uuid::now_v7(),
            subject_id,
            user_id,
            rating,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subject_id(&self) -> Uuid {
        self.subject_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn rating(&self) -> Rating {
        self.rating
    }

    /// Changes the rating. The sender must be the interaction's own user;
    /// anyone else gets `Forbidden`.
    pub fn set_rating(&mut self, rating: Rating, sender_id: Uuid) -> Result<()> {
        if sender_id != self.user_id {
            return Err(AppError::Forbidden(format!(
                "user {sender_id} may not change interaction {} owned by user {}",
                self.id, self.user_id
            )));
        }
        self.rating = rating;
        Ok(())
    }
}

/// Upserts a user's interaction on a subject. A user holds at most one
/// interaction per subject; a repeated reaction updates the rating in place.
fn react(interactions: &mut Vec<Interaction>, subject_id: Uuid, user_id: Uuid, rating: Rating) -> Interaction {
    if let Some(existing) = interactions.iter_mut().find(|i| i.user_id == user_id) {
        existing.rating = rating;
        return existing.clone();
    }
    let interaction = Interaction::new(subject_id, user_id, rating);
    interactions.push(interaction.clone());
    interaction
}

fn set_rating_in(
    interactions: &mut [Interaction],
    interaction_id: Uuid,
    rating: Rating,
    sender_id: Uuid,
) -> Result<()> {
    let interaction = interactions
        .iter_mut()
        .find(|i| i.id == interaction_id)
        .ok_or(AppError::NotFound {
            entity: "interaction",
            id: interaction_id,
        })?;
    interaction.set_rating(rating, sender_id)
}

/// A reply within a post. Created only through [`Post::add_comment`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    id: Uuid,
    post_id: Uuid,
    author_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
    interactions: Vec<Interaction>,
}

impl Comment {
    fn new(post_id: Uuid, author_id: Uuid, text: &str) -> Result<Self> {
        check_len("comment text", text, COMMENT_TEXT_MIN, COMMENT_TEXT_MAX)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            post_id,
            author_id,
            text: text.to_string(),
            created_at: now,
            updated_at: now,
            version: 0,
            interactions: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn post_id(&self) -> Uuid {
        self.post_id
    }

    pub fn author_id(&self) -> Uuid {
        self.author_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn update_text(&mut self, text: &str) -> Result<()> {
        check_len("comment text", text, COMMENT_TEXT_MIN, COMMENT_TEXT_MAX)?;
        self.text = text.to_string();
        Ok(())
    }

    pub fn add_interaction(&mut self, user_id: Uuid, rating: Rating) -> Interaction {
        react(&mut self.interactions, self.id, user_id, rating)
    }

    pub fn set_interaction_rating(
        &mut self,
        interaction_id: Uuid,
        rating: Rating,
        sender_id: Uuid,
    ) -> Result<()> {
        set_rating_in(&mut self.interactions, interaction_id, rating, sender_id)
    }
}

/// The fundamental unit of conversation. Created only through
/// [`Topic::add_post`]; its topic reference is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    id: Uuid,
    topic_id: Uuid,
    author_id: Uuid,
    title: String,
    text: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
    comments: Vec<Comment>,
    interactions: Vec<Interaction>,
}

impl Post {
    fn new(topic_id: Uuid, author_id: Uuid, title: &str, text: &str) -> Result<Self> {
        check_len("post title", title, POST_TITLE_MIN, POST_TITLE_MAX)?;
        check_len("post text", text, POST_TEXT_MIN, POST_TEXT_MAX)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            topic_id,
            author_id,
            title: title.to_string(),
            text: text.to_string(),
            created_at: now,
            updated_at: now,
            version: 0,
            comments: Vec::new(),
            interactions: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic_id(&self) -> Uuid {
        self.topic_id
    }

    pub fn author_id(&self) -> Uuid {
        self.author_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn update_text(&mut self, text: &str) -> Result<()> {
        check_len("post text", text, POST_TEXT_MIN, POST_TEXT_MAX)?;
        self.text = text.to_string();
        Ok(())
    }

    /// Creates a comment in this post and returns a detached copy for
    /// persistence.
    pub fn add_comment(&mut self, text: &str, author_id: Uuid) -> Result<Comment> {
        let comment = Comment::new(self.id, author_id, text)?;
        self.comments.push(comment.clone());
        Ok(comment)
    }

    /// Removes a comment. Permitted for the post author, the comment's own
    /// author, or a moderator. Absence is `NotFound` regardless of sender.
    pub fn remove_comment(&mut self, comment_id: Uuid, sender_id: Uuid, is_moderator: bool) -> Result<()> {
        let pos = self
            .comments
            .iter()
            .position(|c| c.id == comment_id)
            .ok_or(AppError::NotFound {
                entity: "comment",
                id: comment_id,
            })?;
        let comment = &self.comments[pos];
        if sender_id != self.author_id && sender_id != comment.author_id && !is_moderator {
            return Err(AppError::Forbidden(format!(
                "user {sender_id} may not remove comment {comment_id}"
            )));
        }
        self.comments.remove(pos);
        Ok(())
    }

    pub fn add_interaction(&mut self, user_id: Uuid, rating: Rating) -> Interaction {
        react(&mut self.interactions, self.id, user_id, rating)
    }

    pub fn set_interaction_rating(
        &mut self,
        interaction_id: Uuid,
        rating: Rating,
        sender_id: Uuid,
    ) -> Result<()> {
        set_rating_in(&mut self.interactions, interaction_id, rating, sender_id)
    }

    /// Replaces the in-memory comment collection with the given rows.
    /// Hydration helper for the persistence boundary; comments that do not
    /// reference this post are discarded.
    pub fn attach_comments(&mut self, comments: Vec<Comment>) {
        self.comments = comments.into_iter().filter(|c| c.post_id == self.id).collect();
    }
}

/// A forum topic. Root topics have no parent; sub-topics are created only
/// through [`Topic::add_sub_topic`], which fixes their parent linkage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    id: Uuid,
    name: String,
    parent_id: Option<Uuid>,
    owner_id: Uuid,
    /// Denormalized count of live posts, maintained by add/remove
    post_count: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
    sub_topics: Vec<Topic>,
    posts: Vec<Post>,
}

impl Topic {
    fn new(name: &str, owner_id: Uuid, parent_id: Option<Uuid>) -> Result<Self> {
        check_len("topic name", name, TOPIC_NAME_MIN, TOPIC_NAME_MAX)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            name: name.to_string(),
            parent_id,
            owner_id,
            post_count: 0,
            created_at: now,
            updated_at: now,
            version: 0,
            sub_topics: Vec::new(),
            posts: Vec::new(),
        })
    }

    /// Creates a root topic. Sub-topics go through [`Topic::add_sub_topic`]
    /// so their parent reference is never settable externally.
    pub fn create(name: &str, owner_id: Uuid) -> Result<Self> {
        Self::new(name, owner_id, None)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn post_count(&self) -> u64 {
        self.post_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn sub_topics(&self) -> &[Topic] {
        &self.sub_topics
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn rename(&mut self, name: &str) -> Result<()> {
        check_len("topic name", name, TOPIC_NAME_MIN, TOPIC_NAME_MAX)?;
        self.name = name.to_string();
        Ok(())
    }

    /// Creates a sub-topic under this topic and returns a detached copy for
    /// persistence. The child's parent id is always this topic's id.
    pub fn add_sub_topic(&mut self, name: &str, creator_id: Uuid) -> Result<Topic> {
        let child = Topic::new(name, creator_id, Some(self.id))?;
        self.sub_topics.push(child.clone());
        Ok(child)
    }

    /// Removes a sub-topic from the loaded collection. Permitted for this
    /// topic's owner, the sub-topic's own owner, or a moderator. A missing
    /// id is `NotFound` regardless of sender or moderator flag.
    pub fn remove_sub_topic(&mut self, sub_id: Uuid, sender_id: Uuid, is_moderator: bool) -> Result<()> {
        let pos = self
            .sub_topics
            .iter()
            .position(|t| t.id == sub_id)
            .ok_or(AppError::NotFound {
                entity: "sub-topic",
                id: sub_id,
            })?;
        let sub = &self.sub_topics[pos];
        if sender_id != self.owner_id && sender_id != sub.owner_id && !is_moderator {
            return Err(AppError::Forbidden(format!(
                "user {sender_id} may not remove sub-topic {sub_id}"
            )));
        }
        self.sub_topics.remove(pos);
        Ok(())
    }

    /// Creates a post in this topic and returns a detached copy for
    /// persistence. Bumps the denormalized post count.
    pub fn add_post(&mut self, title: &str, text: &str, author_id: Uuid) -> Result<Post> {
        let post = Post::new(self.id, author_id, title, text)?;
        self.posts.push(post.clone());
        self.post_count += 1;
        Ok(post)
    }

    /// Removes a post. Permitted for the topic owner, the post's author, or
    /// a moderator. Decrements the post count.
    pub fn remove_post(&mut self, post_id: Uuid, sender_id: Uuid, is_moderator: bool) -> Result<()> {
        let pos = self
            .posts
            .iter()
            .position(|p| p.id == post_id)
            .ok_or(AppError::NotFound {
                entity: "post",
                id: post_id,
            })?;
        let post = &self.posts[pos];
        if sender_id != self.owner_id && sender_id != post.author_id && !is_moderator {
            return Err(AppError::Forbidden(format!(
                "user {sender_id} may not remove post {post_id}"
            )));
        }
        self.posts.remove(pos);
        self.post_count = self.post_count.saturating_sub(1);
        Ok(())
    }

    /// Hydration helper: replaces the sub-topic collection with the given
    /// rows, discarding any that do not point back at this topic.
    pub fn attach_sub_topics(&mut self, children: Vec<Topic>) {
        self.sub_topics = children
            .into_iter()
            .filter(|c| c.parent_id == Some(self.id))
            .collect();
    }

    /// Hydration helper: replaces the post collection with the given rows.
    pub fn attach_posts(&mut self, posts: Vec<Post>) {
        self.posts = posts.into_iter().filter(|p| p.topic_id == self.id).collect();
    }
}

impl crate::traits::Persisted for Topic {
    const ENTITY: &'static str = "topic";

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
        self.updated_at = at;
    }

    fn stamp_updated(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn detach_children(&mut self) {
        self.sub_topics.clear();
        self.posts.clear();
    }
}

impl crate::traits::Persisted for Post {
    const ENTITY: &'static str = "post";

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
        self.updated_at = at;
    }

    fn stamp_updated(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    // Interactions stay embedded in the post row; only comments are
    // persisted separately.
    fn detach_children(&mut self) {
        self.comments.clear();
    }
}

impl crate::traits::Persisted for Comment {
    const ENTITY: &'static str = "comment";

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
        self.updated_at = at;
    }

    fn stamp_updated(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn detach_children(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Uuid {
        Uuid::now_v7()
    }

    #[test]
    fn topic_name_bounds() {
        let owner = user();
        assert!(Topic::create("General", owner).is_ok());
        // exactly at the bounds
        assert!(Topic::create("abcde", owner).is_ok());
        assert!(Topic::create(&"x".repeat(25), owner).is_ok());
        // outside
        let err = Topic::create("abcd", owner).unwrap_err();
        assert!(matches!(err, AppError::InvalidLength { field: "topic name", actual: 4, .. }));
        assert!(Topic::create(&"x".repeat(26), owner).is_err());
    }

    #[test]
    fn sub_topic_links_back_to_parent() {
        let mut general = Topic::create("General", user()).unwrap();
        let help = general.add_sub_topic("Help desk", user()).unwrap();
        assert_eq!(help.parent_id(), Some(general.id()));
        assert!(general.sub_topics().iter().any(|t| t.id() == help.id()));
    }

    #[test]
    fn post_count_tracks_collection() {
        let author = user();
        let mut topic = Topic::create("General", author).unwrap();
        let a = topic.add_post("First post", "hello world", author).unwrap();
        let b = topic.add_post("Second post", "hello again", author).unwrap();
        assert_eq!(topic.post_count(), 2);
        assert_eq!(topic.post_count() as usize, topic.posts().len());

        topic.remove_post(a.id(), author, false).unwrap();
        assert_eq!(topic.post_count(), 1);
        assert_eq!(topic.post_count() as usize, topic.posts().len());

        topic.remove_post(b.id(), author, false).unwrap();
        assert_eq!(topic.post_count(), 0);
    }

    #[test]
    fn remove_sub_topic_authorization_matrix() {
        let parent_owner = user();
        let sub_owner = user();
        let stranger = user();
        let mut topic = Topic::create("General", parent_owner).unwrap();
        let sub = topic.add_sub_topic("Help desk", sub_owner).unwrap();

        // stranger without moderator flag is rejected, sub-topic survives
        let err = topic.remove_sub_topic(sub.id(), stranger, false).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(topic.sub_topics().len(), 1);

        // sub-topic's own owner may remove it
        let sub2 = topic.add_sub_topic("Off topic", sub_owner).unwrap();
        topic.remove_sub_topic(sub2.id(), sub_owner, false).unwrap();

        // parent owner may remove it
        topic.remove_sub_topic(sub.id(), parent_owner, false).unwrap();
        assert!(topic.sub_topics().is_empty());

        // moderator flag overrides, but absence is still NotFound
        let err = topic.remove_sub_topic(sub.id(), stranger, true).unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: "sub-topic", .. }));
    }

    #[test]
    fn moderator_may_remove_any_sub_topic() {
        let mut topic = Topic::create("General", user()).unwrap();
        let sub = topic.add_sub_topic("Help desk", user()).unwrap();
        topic.remove_sub_topic(sub.id(), user(), true).unwrap();
        assert!(topic.sub_topics().is_empty());
    }

    #[test]
    fn post_bounds() {
        let author = user();
        let mut topic = Topic::create("General", author).unwrap();
        assert!(matches!(
            topic.add_post("hi", "long enough text", author),
            Err(AppError::InvalidLength { field: "post title", .. })
        ));
        assert!(matches!(
            topic.add_post("Valid title", "tiny", author),
            Err(AppError::InvalidLength { field: "post text", .. })
        ));
        assert!(topic.add_post("Valid title", &"y".repeat(1500), author).is_ok());
        assert!(topic.add_post("Valid title", &"y".repeat(1501), author).is_err());
        // failed factories must not bump the count
        assert_eq!(topic.post_count(), 1);
    }

    #[test]
    fn comment_lifecycle_and_authorization() {
        let post_author = user();
        let commenter = user();
        let stranger = user();
        let mut topic = Topic::create("General", post_author).unwrap();
        let mut post = topic.add_post("Valid title", "some post text", post_author).unwrap();

        let comment = post.add_comment("nice post!", commenter).unwrap();
        assert_eq!(comment.post_id(), post.id());

        let err = post.remove_comment(comment.id(), stranger, false).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // comment author removes their own comment
        post.remove_comment(comment.id(), commenter, false).unwrap();
        assert!(post.comments().is_empty());

        assert!(post.add_comment("meh", commenter).is_err());
        assert!(post.add_comment(&"z".repeat(501), commenter).is_err());
    }

    #[test]
    fn interaction_rating_is_self_owned() {
        let author = user();
        let reader = user();
        let mut topic = Topic::create("General", author).unwrap();
        let mut post = topic.add_post("Valid title", "some post text", author).unwrap();

        let interaction = post.add_interaction(reader, Rating::Like);
        assert_eq!(interaction.rating(), Rating::Like);

        // another user may not flip someone else's rating
        let err = post
            .set_interaction_rating(interaction.id(), Rating::Dislike, author)
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        post.set_interaction_rating(interaction.id(), Rating::Dislike, reader)
            .unwrap();
        assert_eq!(post.interactions()[0].rating(), Rating::Dislike);
    }

    #[test]
    fn repeated_reaction_upserts() {
        let reader = user();
        let mut topic = Topic::create("General", user()).unwrap();
        let mut post = topic.add_post("Valid title", "some post text", user()).unwrap();
        post.add_interaction(reader, Rating::Like);
        post.add_interaction(reader, Rating::Dislike);
        assert_eq!(post.interactions().len(), 1);
        assert_eq!(post.interactions()[0].rating(), Rating::Dislike);
    }

    #[test]
    fn attach_discards_foreign_children() {
        let mut a = Topic::create("Topic one", user()).unwrap();
        let mut b = Topic::create("Topic two", user()).unwrap();
        let sub = a.add_sub_topic("Help desk", user()).unwrap();
        let foreign = b.add_sub_topic("Elsewhere", user()).unwrap();

        a.attach_sub_topics(vec![sub.clone(), foreign]);
        assert_eq!(a.sub_topics().len(), 1);
        assert_eq!(a.sub_topics()[0].id(), sub.id());
    }
}
