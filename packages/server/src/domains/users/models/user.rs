use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// User identity keyed by chat handle.
///
/// Created on first inbound message; never deleted, only deactivated.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub phone_number: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl User {
    /// Find user by ID
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Find user by chat handle
    pub async fn find_by_phone(phone_number: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE phone_number = $1")
            .bind(phone_number)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Get or create the user for a handle, refreshing `last_active` either way
    pub async fn get_or_create(
        phone_number: &str,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO users (phone_number, last_active)
            VALUES ($1, $2)
            ON CONFLICT (phone_number)
            DO UPDATE SET last_active = $2
            RETURNING *
            "#,
        )
        .bind(phone_number)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Deactivate a user (users are never deleted)
    pub async fn deactivate(id: Uuid, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("UPDATE users SET is_active = false WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    /// Total users, for the metrics endpoint
    pub async fn count_total(pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Users active since the cutoff, for the metrics endpoint
    pub async fn count_active_since(cutoff: DateTime<Utc>, pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_active AND last_active >= $1")
                .bind(cutoff)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
