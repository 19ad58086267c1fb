/// HTTP handlers for photo-service endpoints
///
/// - Posts: list, retrieve, create (multipart), update text, delete, like
/// - Comments: CRUD scoped under a post
/// - Health: liveness and readiness probes
pub mod comments;
pub mod health;
pub mod posts;

pub use comments::{create_comment, delete_comment, get_comment, list_comments, update_comment};
pub use health::{health_check, liveness_check, readiness_check};
pub use posts::{create_post, delete_post, get_post, like_post, list_posts, update_post};
