use crate::domain::auth::{NewRefreshToken, RefreshToken, RefreshTokenRepository};
use crate::infrastructure::db::DbPool;
use crate::infrastructure::db::models::auth::RefreshTokenRow;
use crate::infrastructure::tx::with_write_scope;
use anyhow::Result;
use async_trait::async_trait;

pub struct PostgresRefreshTokenRepository {
    pool: DbPool,
}

impl PostgresRefreshTokenRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// True when the error is a Postgres unique-key violation. Callers creating
/// tokens regenerate on this, keeping key uniqueness absolute.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505")
    )
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn create(&self, token: NewRefreshToken) -> Result<RefreshToken> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING token_hash, user_id, expires_at, is_active, created_at
            "#,
        )
        .bind(&token.token_hash)
        .bind(token.user_id)
        .bind(token.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT token_hash, user_id, expires_at, is_active, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|t| t.into()))
    }

    async fn retire(&self, token_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET is_active = FALSE
            WHERE token_hash = $1 AND is_active = TRUE
            "#,
        )
        .bind(token_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn rotate(
        &self,
        presented_hash: &str,
        replacement: NewRefreshToken,
    ) -> Result<Option<RefreshToken>> {
        let presented = presented_hash.to_string();

        with_write_scope(&self.pool, move |tx| {
            Box::pin(async move {
                // The conditional retire is the linearization point: of two
                // concurrent rotations with the same token, exactly one sees
                // an active row here.
                let retired = sqlx::query(
                    r#"
                    UPDATE refresh_tokens
                    SET is_active = FALSE
                    WHERE token_hash = $1 AND is_active = TRUE AND expires_at > NOW()
                    "#,
                )
                .bind(&presented)
                .execute(&mut **tx)
                .await?;

                if retired.rows_affected() == 0 {
                    return Ok(None);
                }

                let row = sqlx::query_as::<_, RefreshTokenRow>(
                    r#"
                    INSERT INTO refresh_tokens (token_hash, user_id, expires_at)
                    VALUES ($1, $2, $3)
                    RETURNING token_hash, user_id, expires_at, is_active, created_at
                    "#,
                )
                .bind(&replacement.token_hash)
                .bind(replacement.user_id)
                .bind(replacement.expires_at)
                .fetch_one(&mut **tx)
                .await?;

                Ok(Some(row.into()))
            })
        })
        .await
    }

    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_purgeable(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM refresh_tokens
            WHERE expires_at <= NOW() OR is_active = FALSE
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn purge_expired_or_inactive(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE expires_at <= NOW() OR is_active = FALSE
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
