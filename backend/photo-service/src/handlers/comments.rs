/// Comment handlers - comments nested under `/posts/{post_id}/comments`
use crate::app_state::AppState;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::serialization::CommentInput;
use crate::services::CommentService;
use actix_web::http::Method;
use actix_web::{web, HttpRequest, HttpResponse};
use uuid::Uuid;

type CommentBody = web::Either<web::Json<CommentInput>, web::Form<CommentInput>>;

fn into_input(body: CommentBody) -> CommentInput {
    match body {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    }
}

/// List comments of a post, oldest first
pub async fn list_comments(
    state: web::Data<AppState>,
    _user: AuthUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comments = CommentService::new(&state).list_comments(*post_id).await?;
    Ok(HttpResponse::Ok().json(comments))
}

/// Comment on a post as the authenticated user
pub async fn create_comment(
    state: web::Data<AppState>,
    user: AuthUser,
    post_id: web::Path<Uuid>,
    body: CommentBody,
) -> Result<HttpResponse> {
    let input = into_input(body);
    let comment = CommentService::new(&state)
        .create_comment(&user, *post_id, input.text.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

pub async fn get_comment(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = CommentService::new(&state)
        .get_comment(post_id, comment_id)
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

/// Edit a comment (author only); PATCH may omit `text`
pub async fn update_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    body: CommentBody,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let input = into_input(body);
    let partial = *req.method() == Method::PATCH;

    let comment = CommentService::new(&state)
        .update_comment(user.id, post_id, comment_id, input.text.as_deref(), partial)
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn delete_comment(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    CommentService::new(&state)
        .delete_comment(user.id, post_id, comment_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
