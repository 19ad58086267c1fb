use crate::models::Image;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_image(pool: &PgPool, post_id: Uuid, image: &str) -> Result<Image, sqlx::Error> {
    let image = sqlx::query_as::<_, Image>(
        r#"
        INSERT INTO images (post_id, image)
        VALUES ($1, $2)
        RETURNING id, post_id, image, created_at
        "#,
    )
    .bind(post_id)
    .bind(image)
    .fetch_one(pool)
    .await?;

    Ok(image)
}

/// Images of a post in upload order
pub async fn get_images_by_post(pool: &PgPool, post_id: Uuid) -> Result<Vec<Image>, sqlx::Error> {
    let images = sqlx::query_as::<_, Image>(
        r#"
        SELECT id, post_id, image, created_at
        FROM images
        WHERE post_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(images)
}
