use crate::models::Like;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Get or create the like of `user_id` on `post_id`.
/// The flag is true when a new row was inserted.
pub async fn get_or_create_like(
    pool: &PgPool,
    post_id: Uuid,
    user_id: Uuid,
) -> Result<(Like, bool), sqlx::Error> {
    let inserted = sqlx::query_as::<_, Like>(
        r#"
        INSERT INTO likes (post_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (post_id, user_id) DO NOTHING
        RETURNING id, post_id, user_id, created_at
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    if let Some(like) = inserted {
        return Ok((like, true));
    }

    let existing = sqlx::query_as::<_, Like>(
        r#"
        SELECT id, post_id, user_id, created_at
        FROM likes
        WHERE post_id = $1 AND user_id = $2
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok((existing, false))
}

/// Count likes on a post
pub async fn count_likes_by_post(pool: &PgPool, post_id: Uuid) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM likes WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(pool)
        .await?;

    Ok(row.get::<i64, _>("count"))
}
