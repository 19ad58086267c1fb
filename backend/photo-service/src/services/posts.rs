/// Post service - handles post creation, rendering, updates and likes
use crate::app_state::AppState;
use crate::config::MediaConfig;
use crate::db::PhotoRepository;
use crate::error::{AppError, Result};
use crate::geocoding::ReverseGeocoder;
use crate::middleware::{check_post_ownership, AuthUser};
use crate::models::Post;
use crate::serialization::{
    clean_text, parse_location, CommentResponse, ImageResponse, LocationResponse, PostForm,
    PostResponse,
};
use crate::storage::MediaStorage;
use futures_util::future::try_join_all;
use std::sync::Arc;
use uuid::Uuid;

pub struct PostService {
    repo: Arc<dyn PhotoRepository>,
    storage: Arc<dyn MediaStorage>,
    geocoder: Arc<dyn ReverseGeocoder>,
    media: MediaConfig,
}

impl PostService {
    pub fn new(state: &AppState) -> Self {
        Self {
            repo: state.repo.clone(),
            storage: state.storage.clone(),
            geocoder: state.geocoder.clone(),
            media: state.media.clone(),
        }
    }

    /// Posts newest first, rendered
    pub async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<PostResponse>> {
        let posts = self.repo.list_posts(limit, offset).await?;
        try_join_all(posts.into_iter().map(|post| self.render(post))).await
    }

    /// Get a post by ID
    pub async fn get_post(&self, post_id: Uuid) -> Result<PostResponse> {
        let post = self.find_post(post_id).await?;
        self.render(post).await
    }

    /// Create a post from a submitted form.
    ///
    /// The post row is written first, then one image row per uploaded file,
    /// then the location. These writes are independent: if the location is
    /// malformed the request fails but the post and its images remain.
    pub async fn create_post(&self, author: &AuthUser, form: PostForm) -> Result<PostResponse> {
        let text = clean_text(form.text.as_deref(), true)
            .map_err(|message| AppError::field("text", message))?
            .unwrap_or_default();

        self.repo.upsert_user(author.id, &author.username).await?;
        let post = self.repo.create_post(author.id, &text).await?;

        let image_count = form.images.len();
        for upload in &form.images {
            let reference = self.storage.save(&upload.file_name, &upload.bytes).await?;
            if let Err(e) = self.repo.add_image(post.id, &reference).await {
                if let Err(cleanup) = self.storage.delete(&reference).await {
                    tracing::warn!(
                        reference = %reference,
                        error = %cleanup,
                        "failed to remove orphaned media file"
                    );
                }
                return Err(e);
            }
            tracing::debug!(
                post_id = %post.id,
                reference = %reference,
                content_type = upload.content_type.as_deref().unwrap_or("unknown"),
                size = upload.bytes.len(),
                "image stored"
            );
        }

        match parse_location(form.location.as_deref()) {
            Ok(Some(location)) => {
                self.repo.set_location(post.id, &location).await?;
            }
            Ok(None) => {}
            Err(errors) => {
                tracing::warn!(
                    post_id = %post.id,
                    "rejected location after post was stored"
                );
                return Err(AppError::Validation(errors));
            }
        }

        tracing::info!(
            post_id = %post.id,
            author_id = %author.id,
            images = image_count,
            "post created"
        );

        self.render(post).await
    }

    /// Replace the text of a post. Only the author may do this.
    ///
    /// With `partial` set (PATCH) a missing `text` leaves the post unchanged.
    pub async fn update_post(
        &self,
        caller: Uuid,
        post_id: Uuid,
        text: Option<&str>,
        partial: bool,
    ) -> Result<PostResponse> {
        let post = self.find_post(post_id).await?;
        check_post_ownership(caller, &post)?;

        let text = clean_text(text, !partial).map_err(|message| AppError::field("text", message))?;

        let post = match text {
            Some(text) => self
                .repo
                .update_post_text(post_id, &text)
                .await?
                .ok_or_else(|| post_not_found(post_id))?,
            None => post,
        };

        tracing::info!(post_id = %post_id, "post updated");
        self.render(post).await
    }

    /// Delete a post and everything attached to it. Only the author may do this.
    pub async fn delete_post(&self, caller: Uuid, post_id: Uuid) -> Result<()> {
        let post = self.find_post(post_id).await?;
        check_post_ownership(caller, &post)?;

        if !self.repo.delete_post(post_id).await? {
            return Err(post_not_found(post_id));
        }

        tracing::info!(post_id = %post_id, author_id = %caller, "post deleted");
        Ok(())
    }

    /// Like a post. Liking twice keeps a single like.
    pub async fn like_post(&self, caller: &AuthUser, post_id: Uuid) -> Result<()> {
        self.find_post(post_id).await?;
        self.repo.upsert_user(caller.id, &caller.username).await?;

        let (like, created) = self.repo.like_post(post_id, caller.id).await?;
        tracing::debug!(
            post_id = %post_id,
            like_id = %like.id,
            user_id = %caller.id,
            created,
            "post liked"
        );
        Ok(())
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Post> {
        self.repo
            .find_post(post_id)
            .await?
            .ok_or_else(|| post_not_found(post_id))
    }

    /// Render a post with images, comments, like count and location.
    /// The location's address is geocoded here.
    pub async fn render(&self, post: Post) -> Result<PostResponse> {
        let (images, comments, likes_count, location) = tokio::try_join!(
            self.repo.images_for_post(post.id),
            self.repo.comments_for_post(post.id),
            self.repo.count_likes(post.id),
            self.repo.location_for_post(post.id),
        )?;

        let location_data = match location {
            Some(location) => {
                let reverse_name = self
                    .geocoder
                    .reverse(location.latitude, location.longitude)
                    .await;
                Some(LocationResponse::new(location, reverse_name))
            }
            None => None,
        };

        Ok(PostResponse {
            id: post.id,
            text: post.text,
            created_at: post.created_at,
            author: post.author_id,
            image_list: images
                .iter()
                .map(|image| ImageResponse::new(image, &self.media.url))
                .collect(),
            comments: comments.into_iter().map(CommentResponse::from).collect(),
            likes_count,
            location_data,
        })
    }
}

pub(crate) fn post_not_found(post_id: Uuid) -> AppError {
    AppError::NotFound(format!("Post {} not found", post_id))
}
