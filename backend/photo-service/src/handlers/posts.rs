/// Post handlers - HTTP endpoints for post operations
use crate::app_state::AppState;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::serialization::{PostForm, PostTextInput};
use crate::services::PostService;
use actix_multipart::Multipart;
use actix_web::http::Method;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl PaginationParams {
    /// Limit clamped to `1..=MAX_PAGE_SIZE`, offset to zero or more
    pub fn bounds(&self) -> (i64, i64) {
        (self.limit.clamp(1, MAX_PAGE_SIZE), self.offset.max(0))
    }
}

/// List posts, newest first
pub async fn list_posts(
    state: web::Data<AppState>,
    _user: AuthUser,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let (limit, offset) = query.bounds();
    let posts = PostService::new(&state).list_posts(limit, offset).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Get a post by ID
pub async fn get_post(
    state: web::Data<AppState>,
    _user: AuthUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = PostService::new(&state).get_post(*post_id).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Create a post from `text`, `images` and `location` multipart fields
pub async fn create_post(
    state: web::Data<AppState>,
    user: AuthUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = PostForm::from_multipart(payload, &state.media).await?;
    let post = PostService::new(&state).create_post(&user, form).await?;
    Ok(HttpResponse::Created().json(post))
}

/// Replace post text (PUT) or patch it (PATCH); form-encoded or multipart
pub async fn update_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: AuthUser,
    post_id: web::Path<Uuid>,
    body: web::Either<web::Form<PostTextInput>, Multipart>,
) -> Result<HttpResponse> {
    let text = match body {
        web::Either::Left(form) => form.into_inner().text,
        web::Either::Right(payload) => {
            let form = PostForm::from_multipart(payload, &state.media).await?;
            if !form.images.is_empty() || form.location.is_some() {
                tracing::debug!(post_id = %post_id, "images and location are fixed at creation; ignoring");
            }
            form.text
        }
    };

    let partial = *req.method() == Method::PATCH;
    let post = PostService::new(&state)
        .update_post(user.id, *post_id, text.as_deref(), partial)
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Delete a post (author only)
pub async fn delete_post(
    state: web::Data<AppState>,
    user: AuthUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    PostService::new(&state).delete_post(user.id, *post_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Like a post; repeated likes are a no-op
pub async fn like_post(
    state: web::Data<AppState>,
    user: AuthUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    PostService::new(&state).like_post(&user, *post_id).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "status": "liked" })))
}
