/// Database access layer
///
/// The `*_repo` modules hold free functions over `&PgPool`, one per query.
/// [`PhotoRepository`] is the seam services depend on; [`PgPhotoRepository`]
/// implements it by delegating to those functions.
pub mod comment_repo;
pub mod image_repo;
pub mod like_repo;
pub mod location_repo;
pub mod post_repo;
pub mod user_repo;

use crate::error::Result;
use crate::models::{Comment, Image, Like, Location, NewLocation, Post};
use sqlx::migrate::Migrator;
use sqlx::PgPool;
use uuid::Uuid;

/// Embedded schema migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Storage operations for posts and everything attached to them.
///
/// Deleting a post removes its images, comments, likes and location;
/// deleting a user removes that user's posts, comments and likes.
#[async_trait::async_trait]
pub trait PhotoRepository: Send + Sync {
    /// Round-trip to the backing store, used by readiness checks
    async fn ping(&self) -> Result<()>;

    /// Make sure a `users` row exists for an authenticated caller
    async fn upsert_user(&self, user_id: Uuid, username: &str) -> Result<()>;

    async fn delete_user(&self, user_id: Uuid) -> Result<bool>;

    /// Posts newest first
    async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>>;

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>>;

    async fn create_post(&self, author_id: Uuid, text: &str) -> Result<Post>;

    async fn update_post_text(&self, post_id: Uuid, text: &str) -> Result<Option<Post>>;

    async fn delete_post(&self, post_id: Uuid) -> Result<bool>;

    async fn add_image(&self, post_id: Uuid, image: &str) -> Result<Image>;

    async fn images_for_post(&self, post_id: Uuid) -> Result<Vec<Image>>;

    async fn set_location(&self, post_id: Uuid, location: &NewLocation) -> Result<Location>;

    async fn location_for_post(&self, post_id: Uuid) -> Result<Option<Location>>;

    /// Get-or-create; the flag reports whether a new like was stored
    async fn like_post(&self, post_id: Uuid, user_id: Uuid) -> Result<(Like, bool)>;

    async fn count_likes(&self, post_id: Uuid) -> Result<i64>;

    /// Comments of a post, oldest first
    async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>>;

    async fn create_comment(&self, post_id: Uuid, author_id: Uuid, text: &str) -> Result<Comment>;

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>>;

    async fn update_comment_text(&self, comment_id: Uuid, text: &str) -> Result<Option<Comment>>;

    async fn delete_comment(&self, comment_id: Uuid) -> Result<bool>;
}

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgPhotoRepository {
    pool: PgPool,
}

impl PgPhotoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PhotoRepository for PgPhotoRepository {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn upsert_user(&self, user_id: Uuid, username: &str) -> Result<()> {
        Ok(user_repo::upsert_user(&self.pool, user_id, username).await?)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
        Ok(user_repo::delete_user(&self.pool, user_id).await?)
    }

    async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>> {
        Ok(post_repo::list_posts(&self.pool, limit, offset).await?)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        Ok(post_repo::find_post_by_id(&self.pool, post_id).await?)
    }

    async fn create_post(&self, author_id: Uuid, text: &str) -> Result<Post> {
        Ok(post_repo::create_post(&self.pool, author_id, text).await?)
    }

    async fn update_post_text(&self, post_id: Uuid, text: &str) -> Result<Option<Post>> {
        Ok(post_repo::update_post_text(&self.pool, post_id, text).await?)
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        Ok(post_repo::delete_post(&self.pool, post_id).await?)
    }

    async fn add_image(&self, post_id: Uuid, image: &str) -> Result<Image> {
        Ok(image_repo::create_image(&self.pool, post_id, image).await?)
    }

    async fn images_for_post(&self, post_id: Uuid) -> Result<Vec<Image>> {
        Ok(image_repo::get_images_by_post(&self.pool, post_id).await?)
    }

    async fn set_location(&self, post_id: Uuid, location: &NewLocation) -> Result<Location> {
        Ok(location_repo::upsert_location(&self.pool, post_id, location).await?)
    }

    async fn location_for_post(&self, post_id: Uuid) -> Result<Option<Location>> {
        Ok(location_repo::find_location_by_post(&self.pool, post_id).await?)
    }

    async fn like_post(&self, post_id: Uuid, user_id: Uuid) -> Result<(Like, bool)> {
        Ok(like_repo::get_or_create_like(&self.pool, post_id, user_id).await?)
    }

    async fn count_likes(&self, post_id: Uuid) -> Result<i64> {
        Ok(like_repo::count_likes_by_post(&self.pool, post_id).await?)
    }

    async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        Ok(comment_repo::get_comments_by_post(&self.pool, post_id).await?)
    }

    async fn create_comment(&self, post_id: Uuid, author_id: Uuid, text: &str) -> Result<Comment> {
        Ok(comment_repo::create_comment(&self.pool, post_id, author_id, text).await?)
    }

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        Ok(comment_repo::get_comment_by_id(&self.pool, comment_id).await?)
    }

    async fn update_comment_text(&self, comment_id: Uuid, text: &str) -> Result<Option<Comment>> {
        Ok(comment_repo::update_comment(&self.pool, comment_id, text).await?)
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<bool> {
        Ok(comment_repo::delete_comment(&self.pool, comment_id).await?)
    }
}
