/// Comment service - comments scoped to their parent post
use crate::app_state::AppState;
use crate::db::PhotoRepository;
use crate::error::{AppError, Result};
use crate::middleware::{check_comment_ownership, AuthUser};
use crate::models::Comment;
use crate::serialization::{clean_text, CommentResponse};
use crate::services::posts::post_not_found;
use std::sync::Arc;
use uuid::Uuid;

pub struct CommentService {
    repo: Arc<dyn PhotoRepository>,
}

impl CommentService {
    pub fn new(state: &AppState) -> Self {
        Self {
            repo: state.repo.clone(),
        }
    }

    /// Comments of a post, oldest first. An unknown post has no comments.
    pub async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentResponse>> {
        let comments = self.repo.comments_for_post(post_id).await?;
        Ok(comments.into_iter().map(CommentResponse::from).collect())
    }

    /// Add a comment by `author` to the post
    pub async fn create_comment(
        &self,
        author: &AuthUser,
        post_id: Uuid,
        text: Option<&str>,
    ) -> Result<CommentResponse> {
        self.ensure_post(post_id).await?;
        let text = clean_text(text, true)
            .map_err(|message| AppError::field("text", message))?
            .unwrap_or_default();

        self.repo.upsert_user(author.id, &author.username).await?;
        let comment = self.repo.create_comment(post_id, author.id, &text).await?;

        tracing::info!(
            post_id = %post_id,
            comment_id = %comment.id,
            author_id = %author.id,
            "comment created"
        );
        Ok(comment.into())
    }

    pub async fn get_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<CommentResponse> {
        Ok(self.find_comment(post_id, comment_id).await?.into())
    }

    /// Replace comment text. Only the comment's author may do this.
    pub async fn update_comment(
        &self,
        caller: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
        text: Option<&str>,
        partial: bool,
    ) -> Result<CommentResponse> {
        let comment = self.find_comment(post_id, comment_id).await?;
        check_comment_ownership(caller, &comment)?;

        let text = clean_text(text, !partial).map_err(|message| AppError::field("text", message))?;
        let comment = match text {
            Some(text) => self
                .repo
                .update_comment_text(comment_id, &text)
                .await?
                .ok_or_else(|| comment_not_found(comment_id))?,
            None => comment,
        };

        tracing::info!(post_id = %post_id, comment_id = %comment_id, "comment updated");
        Ok(comment.into())
    }

    /// Delete a comment. Only the comment's author may do this.
    pub async fn delete_comment(&self, caller: Uuid, post_id: Uuid, comment_id: Uuid) -> Result<()> {
        let comment = self.find_comment(post_id, comment_id).await?;
        check_comment_ownership(caller, &comment)?;

        if !self.repo.delete_comment(comment_id).await? {
            return Err(comment_not_found(comment_id));
        }

        tracing::info!(post_id = %post_id, comment_id = %comment_id, "comment deleted");
        Ok(())
    }

    async fn ensure_post(&self, post_id: Uuid) -> Result<()> {
        match self.repo.find_post(post_id).await? {
            Some(_) => Ok(()),
            None => Err(post_not_found(post_id)),
        }
    }

    /// A comment that exists but belongs to another post is reported as missing.
    async fn find_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Comment> {
        self.repo
            .find_comment(comment_id)
            .await?
            .filter(|comment| comment.post_id == post_id)
            .ok_or_else(|| comment_not_found(comment_id))
    }
}

fn comment_not_found(comment_id: Uuid) -> AppError {
    AppError::NotFound(format!("Comment {} not found", comment_id))
}
