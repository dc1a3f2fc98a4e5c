//! PostRepository - Repository per la gestione degli annunci

use super::{Create, DocumentStore, Read, StoreError, Update};
use crate::dtos::{CreatePostDTO, PostCursor, UpdatePostDTO};
use crate::entities::Post;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

// POST REPOSITORY
#[derive(Clone)]
pub struct PostRepository {
    store: Arc<DocumentStore>,
}

impl PostRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    fn newest_first<F>(&self, keep: F) -> Vec<Post>
    where
        F: Fn(&Post) -> bool,
    {
        let mut posts: Vec<Post> = self
            .store
            .posts
            .iter()
            .filter(|p| keep(p.value()))
            .map(|p| p.value().clone())
            .collect();
        posts.sort_by(|a, b| PostCursor::from(b).cmp(&PostCursor::from(a)));
        posts
    }

    /// Posts of one category, newest first, strictly after `after` when given
    #[instrument(skip(self, after))]
    pub async fn find_by_category(
        &self,
        category: &str,
        after: Option<&PostCursor>,
        limit: usize,
    ) -> Result<Vec<Post>, StoreError> {
        self.store.ensure_online()?;
        let posts: Vec<Post> = self
            .newest_first(|p| p.category == category)
            .into_iter()
            .filter(|p| after.is_none_or(|cursor| PostCursor::from(p) < *cursor))
            .take(limit)
            .collect();
        debug!(count = posts.len(), "Category page loaded");
        Ok(posts)
    }

    /// Every post, newest first
    pub async fn find_all(&self) -> Result<Vec<Post>, StoreError> {
        self.store.ensure_online()?;
        Ok(self.newest_first(|_| true))
    }

    #[instrument(skip(self))]
    pub async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Post>, StoreError> {
        self.store.ensure_online()?;
        Ok(self.newest_first(|p| p.owner_id == owner_id))
    }

    /// Up to `limit` posts whose category is one of `categories`, excluding `exclude_id`
    #[instrument(skip(self, categories))]
    pub async fn find_in_categories(
        &self,
        categories: &[String],
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<Post>, StoreError> {
        self.store.ensure_online()?;
        Ok(self
            .newest_first(|p| p.post_id != exclude_id && categories.contains(&p.category))
            .into_iter()
            .take(limit)
            .collect())
    }

    /// Adds `viewer_id` to the viewers set, bumping `views` only on first visit
    #[instrument(skip(self))]
    pub async fn record_view(&self, post_id: &str, viewer_id: &str) -> Result<Post, StoreError> {
        self.store.ensure_online()?;
        let mut post = self
            .store
            .posts
            .get_mut(post_id)
            .ok_or(StoreError::NotFound)?;
        if post.viewers.insert(viewer_id.to_string()) {
            post.views += 1;
            debug!(views = post.views, "New viewer recorded");
        }
        Ok(post.value().clone())
    }

    /// Sets whether `user_id` likes the post, keeping `like_count` equal to `likes.len()`
    #[instrument(skip(self))]
    pub async fn set_like(
        &self,
        post_id: &str,
        user_id: &str,
        liked: bool,
    ) -> Result<Post, StoreError> {
        self.store.ensure_online()?;
        let mut post = self
            .store
            .posts
            .get_mut(post_id)
            .ok_or(StoreError::NotFound)?;
        if liked {
            post.likes.insert(user_id.to_string());
        } else {
            post.likes.remove(user_id);
        }
        post.like_count = post.likes.len() as u64;
        Ok(post.value().clone())
    }
}

impl Create<Post, CreatePostDTO> for PostRepository {
    #[instrument(skip(self, data), fields(owner_id = %data.owner_id))]
    async fn create(&self, data: &CreatePostDTO) -> Result<Post, StoreError> {
        self.store.ensure_online()?;
        let post = Post {
            post_id: DocumentStore::new_document_id(),
            owner_id: data.owner_id.clone(),
            kind: data.kind,
            title: data.title.clone(),
            description: data.description.clone(),
            category: data.category.clone(),
            images: data.images.clone(),
            location: data.location,
            address: data.address.clone(),
            exchange_options: data.exchange_options.clone(),
            views: 0,
            viewers: BTreeSet::new(),
            likes: BTreeSet::new(),
            like_count: 0,
            model_url: String::new(),
            created_at: self.store.server_timestamp(),
        };
        self.store.posts.insert(post.post_id.clone(), post.clone());
        info!(post_id = %post.post_id, "Post created");
        Ok(post)
    }
}

impl Read<Post, String> for PostRepository {
    async fn read(&self, id: &String) -> Result<Option<Post>, StoreError> {
        self.store.ensure_online()?;
        Ok(self.store.posts.get(id).map(|p| p.value().clone()))
    }
}

impl Update<Post, UpdatePostDTO, String> for PostRepository {
    #[instrument(skip(self, data), fields(post_id = %id))]
    async fn update(&self, id: &String, data: &UpdatePostDTO) -> Result<Post, StoreError> {
        self.store.ensure_online()?;
        let mut post = self.store.posts.get_mut(id).ok_or(StoreError::NotFound)?;
        if let Some(model_url) = &data.model_url {
            post.model_url = model_url.clone();
        }
        Ok(post.value().clone())
    }
}
