/// Auth token model and database operations
///
/// Opaque bearer tokens, one row per user. Issuance is idempotent: logging
/// in returns the user's existing token, creating one only if absent.
/// Concurrent first logins are resolved by the unique constraint rather
/// than application-level locking.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE auth_tokens (
///     user_id UUID PRIMARY KEY REFERENCES users(id),
///     token VARCHAR(40) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::User;
use crate::auth::token::generate_token;

/// A user's bearer token
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthToken {
    /// Owning user (one token per user)
    pub user_id: Uuid,

    /// Opaque token value (40 hex chars)
    pub token: String,

    /// When the token was issued
    pub created_at: DateTime<Utc>,
}

impl AuthToken {
    /// Finds the token for a user
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            SELECT user_id, token, created_at
            FROM auth_tokens
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(token)
    }

    /// Returns the user's token, issuing one if absent
    ///
    /// The insert uses `ON CONFLICT DO NOTHING` followed by a re-read, so
    /// two concurrent first logins both observe the single surviving row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or the user row
    /// has vanished between insert and re-read.
    pub async fn get_or_create(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        if let Some(existing) = Self::find_by_user(pool, user_id).await? {
            return Ok(existing);
        }

        sqlx::query(
            r#"
            INSERT INTO auth_tokens (user_id, token)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(generate_token())
        .execute(pool)
        .await?;

        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            SELECT user_id, token, created_at
            FROM auth_tokens
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(token)
    }

    /// Resolves a token value to its user
    ///
    /// Returns None for unknown tokens.
    pub async fn find_user(pool: &PgPool, token: &str) -> Result<Option<User>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.first_name,
                   u.last_name, u.is_admin, u.created_at
            FROM users u
            JOIN auth_tokens t ON t.user_id = u.id
            WHERE t.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Deletes a user's token
    ///
    /// Returns true if a token was deleted, false if none existed.
    pub async fn delete_for_user(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
