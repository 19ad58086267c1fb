/// Business logic layer for photo-service
///
/// - Post service: creation with images and location, rendering, updates, likes
/// - Comment service: comments scoped under a post
pub mod comments;
pub mod posts;

pub use comments::CommentService;
pub use posts::PostService;
