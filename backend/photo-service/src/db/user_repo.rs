use sqlx::PgPool;
use uuid::Uuid;

/// Insert the user if unknown; refresh the username when the token carries one.
pub async fn upsert_user(pool: &PgPool, user_id: Uuid, username: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE
            SET username = CASE WHEN EXCLUDED.username = '' THEN users.username
                                ELSE EXCLUDED.username END
        "#,
    )
    .bind(user_id)
    .bind(username)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a user; posts, comments and likes go with it.
/// Returns false if the user did not exist.
pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
