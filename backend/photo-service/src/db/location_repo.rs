use crate::models::{Location, NewLocation};
use sqlx::PgPool;
use uuid::Uuid;

/// Attach a location to a post, replacing an existing one
pub async fn upsert_location(
    pool: &PgPool,
    post_id: Uuid,
    location: &NewLocation,
) -> Result<Location, sqlx::Error> {
    let location = sqlx::query_as::<_, Location>(
        r#"
        INSERT INTO locations (post_id, name, latitude, longitude)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (post_id) DO UPDATE
            SET name = EXCLUDED.name,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude
        RETURNING id, post_id, name, latitude, longitude
        "#,
    )
    .bind(post_id)
    .bind(&location.name)
    .bind(location.latitude)
    .bind(location.longitude)
    .fetch_one(pool)
    .await?;

    Ok(location)
}

pub async fn find_location_by_post(
    pool: &PgPool,
    post_id: Uuid,
) -> Result<Option<Location>, sqlx::Error> {
    let location = sqlx::query_as::<_, Location>(
        r#"
        SELECT id, post_id, name, latitude, longitude
        FROM locations
        WHERE post_id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(location)
}
