//! rusty-forum/crates/rf-repo/src/lib.rs
//!
//! Hierarchical repositories over the generic persistence port: one per
//! aggregate type, each wrapping the paginated query engine and adding the
//! structural fetches of its aggregate. Callers pick exactly the subtree
//! they need — nothing is eager-loaded wholesale.
//!
//! Delete contract, uniform across every repository: `Ok(true)` removed,
//! `Ok(false)` absent. Callers decide whether absence is an error.

use std::sync::Arc;

use rf_core::{Comment, Persisted, Post, Result, Topic};
use rf_query::{
    fetch_page, CommentField, EntityStore, FilterClause, Page, PageRequest, PostField, Predicate,
    Queryable, SortSpec, TopicField,
};
use uuid::Uuid;

/// Which subtree of a topic to load alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchShape {
    /// The topic and its direct sub-topics
    SubTopics,
    /// The topic and its posts
    Posts,
    /// Two levels: posts and each post's comments
    PostsWithComments,
}

/// Generic CRUD delegation shared by every repository. Holds the
/// repository's documented default sort, substituted whenever a caller
/// supplies no sort keys.
pub struct Crud<T: Queryable + Persisted> {
    store: Arc<dyn EntityStore<T>>,
    default_sort: SortSpec<T>,
}

impl<T: Queryable + Persisted> Crud<T> {
    pub fn new(store: Arc<dyn EntityStore<T>>, default_sort: SortSpec<T>) -> Self {
        Self {
            store,
            default_sort,
        }
    }

    pub async fn create(&self, entity: T) -> Result<T> {
        self.store.create(entity).await
    }

    pub async fn update(&self, entity: T) -> Result<T> {
        self.store.update(entity).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<T>> {
        self.store.find_by_id(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        self.store.delete(id).await
    }

    pub async fn find_page(
        &self,
        predicate: &Predicate<T>,
        sort: &SortSpec<T>,
        request: PageRequest,
    ) -> Result<Page<T>> {
        let sort = if sort.is_empty() { &self.default_sort } else { sort };
        fetch_page(self.store.as_ref(), predicate, sort, request).await
    }

    /// Every match, in default order. Internal plumbing for cascades and
    /// hydration.
    async fn find_all(&self, predicate: &Predicate<T>) -> Result<Vec<T>> {
        self.store
            .find_by_predicate(predicate, &self.default_sort, 0, u64::MAX)
            .await
    }
}

fn comments_of(post_id: Uuid) -> Predicate<Comment> {
    Predicate::of(FilterClause::eq(CommentField::PostId, post_id))
}

/// Topic tree repository. Default listing order: name ascending.
pub struct TopicRepository {
    topics: Crud<Topic>,
    posts: Crud<Post>,
    comments: Crud<Comment>,
}

impl TopicRepository {
    pub fn new(
        topics: Arc<dyn EntityStore<Topic>>,
        posts: Arc<dyn EntityStore<Post>>,
        comments: Arc<dyn EntityStore<Comment>>,
    ) -> Self {
        Self {
            topics: Crud::new(topics, SortSpec::asc(TopicField::Name)),
            posts: Crud::new(posts, SortSpec::asc(PostField::CreatedAt)),
            comments: Crud::new(comments, SortSpec::asc(CommentField::CreatedAt)),
        }
    }

    pub async fn create(&self, topic: Topic) -> Result<Topic> {
        self.topics.create(topic).await
    }

    pub async fn update(&self, topic: Topic) -> Result<Topic> {
        self.topics.update(topic).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Topic>> {
        self.topics.find_by_id(id).await
    }

    pub async fn find_page(
        &self,
        predicate: &Predicate<Topic>,
        sort: &SortSpec<Topic>,
        request: PageRequest,
    ) -> Result<Page<Topic>> {
        self.topics.find_page(predicate, sort, request).await
    }

    pub async fn is_owner(&self, topic_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self
            .topics
            .find_by_id(topic_id)
            .await?
            .is_some_and(|topic| topic.owner_id() == user_id))
    }

    /// Loads a topic together with the requested subtree. Sub-topics come
    /// back name-ascending, posts and comments creation-ascending.
    pub async fn find_with_children(&self, id: Uuid, shape: FetchShape) -> Result<Option<Topic>> {
        let Some(mut topic) = self.topics.find_by_id(id).await? else {
            return Ok(None);
        };
        match shape {
            FetchShape::SubTopics => {
                let children = self.sub_topics_of(id).await?;
                topic.attach_sub_topics(children);
            }
            FetchShape::Posts => {
                let posts = self.posts_of(id).await?;
                topic.attach_posts(posts);
            }
            FetchShape::PostsWithComments => {
                let mut posts = self.posts_of(id).await?;
                for post in &mut posts {
                    let comments = self.comments.find_all(&comments_of(post.id())).await?;
                    post.attach_comments(comments);
                }
                topic.attach_posts(posts);
            }
        }
        Ok(Some(topic))
    }

    /// Deletes a topic and, transitively, every owned child: descendant
    /// sub-topics, their posts, and those posts' comments.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        if self.topics.find_by_id(id).await?.is_none() {
            return Ok(false);
        }

        // collect the whole subtree first, then remove leaves upward
        let mut stack = vec![id];
        let mut order = Vec::new();
        while let Some(topic_id) = stack.pop() {
            order.push(topic_id);
            for child in self.sub_topics_of(topic_id).await? {
                stack.push(child.id());
            }
        }
        for topic_id in order.into_iter().rev() {
            for post in self.posts_of(topic_id).await? {
                for comment in self.comments.find_all(&comments_of(post.id())).await? {
                    self.comments.delete(comment.id()).await?;
                }
                self.posts.delete(post.id()).await?;
            }
            self.topics.delete(topic_id).await?;
        }
        Ok(true)
    }

    async fn sub_topics_of(&self, parent_id: Uuid) -> Result<Vec<Topic>> {
        self.topics
            .find_all(&Predicate::of(FilterClause::eq(
                TopicField::ParentId,
                Some(parent_id),
            )))
            .await
    }

    async fn posts_of(&self, topic_id: Uuid) -> Result<Vec<Post>> {
        self.posts
            .find_all(&Predicate::of(FilterClause::eq(PostField::TopicId, topic_id)))
            .await
    }
}

/// Post repository. Default listing order: creation time ascending.
pub struct PostRepository {
    posts: Crud<Post>,
    comments: Crud<Comment>,
}

impl PostRepository {
    pub fn new(posts: Arc<dyn EntityStore<Post>>, comments: Arc<dyn EntityStore<Comment>>) -> Self {
        Self {
            posts: Crud::new(posts, SortSpec::asc(PostField::CreatedAt)),
            comments: Crud::new(comments, SortSpec::asc(CommentField::CreatedAt)),
        }
    }

    pub async fn create(&self, post: Post) -> Result<Post> {
        self.posts.create(post).await
    }

    pub async fn update(&self, post: Post) -> Result<Post> {
        self.posts.update(post).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        self.posts.find_by_id(id).await
    }

    pub async fn find_page(
        &self,
        predicate: &Predicate<Post>,
        sort: &SortSpec<Post>,
        request: PageRequest,
    ) -> Result<Page<Post>> {
        self.posts.find_page(predicate, sort, request).await
    }

    /// Loads a post with its comments attached, creation-ascending.
    pub async fn find_with_comments(&self, id: Uuid) -> Result<Option<Post>> {
        let Some(mut post) = self.posts.find_by_id(id).await? else {
            return Ok(None);
        };
        let comments = self.comments.find_all(&comments_of(id)).await?;
        post.attach_comments(comments);
        Ok(Some(post))
    }

    /// Deletes a post and cascades to its comments.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        if self.posts.find_by_id(id).await?.is_none() {
            return Ok(false);
        }
        for comment in self.comments.find_all(&comments_of(id)).await? {
            self.comments.delete(comment.id()).await?;
        }
        self.posts.delete(id).await
    }
}

/// Comment repository. Default listing order: creation time ascending.
pub struct CommentRepository {
    comments: Crud<Comment>,
}

impl CommentRepository {
    pub fn new(comments: Arc<dyn EntityStore<Comment>>) -> Self {
        Self {
            comments: Crud::new(comments, SortSpec::asc(CommentField::CreatedAt)),
        }
    }

    pub async fn create(&self, comment: Comment) -> Result<Comment> {
        self.comments.create(comment).await
    }

    pub async fn update(&self, comment: Comment) -> Result<Comment> {
        self.comments.update(comment).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        self.comments.find_by_id(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        self.comments.delete(id).await
    }

    pub async fn find_page(
        &self,
        predicate: &Predicate<Comment>,
        sort: &SortSpec<Comment>,
        request: PageRequest,
    ) -> Result<Page<Comment>> {
        self.comments.find_page(predicate, sort, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_store_memory::MemoryForumStore;

    fn repos(store: &MemoryForumStore) -> (TopicRepository, PostRepository, CommentRepository) {
        (
            TopicRepository::new(store.topics.clone(), store.posts.clone(), store.comments.clone()),
            PostRepository::new(store.posts.clone(), store.comments.clone()),
            CommentRepository::new(store.comments.clone()),
        )
    }

    #[tokio::test]
    async fn fetch_shapes_load_exactly_the_requested_subtree() {
        let store = MemoryForumStore::new();
        let (topics, posts, _) = repos(&store);
        let owner = Uuid::now_v7();

        let mut general = topics.create(Topic::create("General", owner).unwrap()).await.unwrap();
        let help = general.add_sub_topic("Help desk", owner).unwrap();
        topics.create(help).await.unwrap();
        let post = general.add_post("Valid title", "some post text", owner).unwrap();
        let post = posts.create(post).await.unwrap();
        let general = topics.update(general).await.unwrap();

        let with_subs = topics
            .find_with_children(general.id(), FetchShape::SubTopics)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(with_subs.sub_topics().len(), 1);
        assert!(with_subs.posts().is_empty());

        let with_posts = topics
            .find_with_children(general.id(), FetchShape::Posts)
            .await
            .unwrap()
            .unwrap();
        assert!(with_posts.sub_topics().is_empty());
        assert_eq!(with_posts.posts().len(), 1);
        assert_eq!(with_posts.posts()[0].id(), post.id());
    }

    #[tokio::test]
    async fn delete_cascades_through_the_whole_subtree() {
        let store = MemoryForumStore::new();
        let (topics, posts, comments) = repos(&store);
        let owner = Uuid::now_v7();

        let mut general = topics.create(Topic::create("General", owner).unwrap()).await.unwrap();
        let mut help = general.add_sub_topic("Help desk", owner).unwrap();
        let post = help.add_post("Valid title", "some post text", owner).unwrap();
        let mut post = posts.create(post).await.unwrap();
        let comment = post.add_comment("first reply here", owner).unwrap();
        comments.create(comment).await.unwrap();
        topics.create(help).await.unwrap();
        topics.update(general.clone()).await.unwrap();

        assert!(topics.delete(general.id()).await.unwrap());

        assert!(topics.find_by_id(general.id()).await.unwrap().is_none());
        assert!(store.topics.is_empty());
        assert!(store.posts.is_empty());
        assert!(store.comments.is_empty());

        // second delete reports absence
        assert!(!topics.delete(general.id()).await.unwrap());
    }

    #[tokio::test]
    async fn is_owner_checks_the_stored_row() {
        let store = MemoryForumStore::new();
        let (topics, _, _) = repos(&store);
        let owner = Uuid::now_v7();
        let topic = topics.create(Topic::create("General", owner).unwrap()).await.unwrap();

        assert!(topics.is_owner(topic.id(), owner).await.unwrap());
        assert!(!topics.is_owner(topic.id(), Uuid::now_v7()).await.unwrap());
        assert!(!topics.is_owner(Uuid::now_v7(), owner).await.unwrap());
    }

    #[tokio::test]
    async fn empty_sort_spec_uses_the_documented_default() {
        let store = MemoryForumStore::new();
        let (topics, _, _) = repos(&store);
        let owner = Uuid::now_v7();
        for name in ["Charlie topic", "Alpha topic", "Bravo topic"] {
            topics.create(Topic::create(name, owner).unwrap()).await.unwrap();
        }

        let page = topics
            .find_page(
                &Predicate::all(),
                &SortSpec::unsorted(),
                PageRequest::new(1, 10).unwrap(),
            )
            .await
            .unwrap();
        let names: Vec<_> = page.items.iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, ["Alpha topic", "Bravo topic", "Charlie topic"]);
    }

    #[tokio::test]
    async fn find_with_comments_hydrates_in_creation_order() {
        let store = MemoryForumStore::new();
        let (_, posts, comments) = repos(&store);
        let owner = Uuid::now_v7();
        let mut topic = Topic::create("General", owner).unwrap();
        let mut post = topic.add_post("Valid title", "some post text", owner).unwrap();
        let first = post.add_comment("earliest reply", owner).unwrap();
        let second = post.add_comment("later reply too", owner).unwrap();
        let post = posts.create(post).await.unwrap();
        comments.create(first.clone()).await.unwrap();
        comments.create(second).await.unwrap();

        let loaded = posts.find_with_comments(post.id()).await.unwrap().unwrap();
        assert_eq!(loaded.comments().len(), 2);
        assert_eq!(loaded.comments()[0].id(), first.id());
    }
}
