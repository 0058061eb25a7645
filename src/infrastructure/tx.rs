use crate::infrastructure::db::DbPool;
use anyhow::Result;
use futures::future::BoxFuture;
use sqlx::{Postgres, Transaction};

/// Run mutating logic inside one transaction: commit only when the closure
/// succeeds, roll back fully on any error. Read paths never open a scope.
///
/// This is the atomicity primitive the rotation state machine relies on: a
/// retire+create pair executed inside one scope is never observable
/// half-applied, even across a crash mid-request.
pub async fn with_write_scope<T, F>(pool: &DbPool, f: F) -> Result<T>
where
    F: for<'t> FnOnce(&'t mut Transaction<'static, Postgres>) -> BoxFuture<'t, Result<T>>,
{
    let mut tx = pool.begin().await?;

    match f(&mut tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            // Rollback failure is secondary; the original error is the one
            // the caller needs.
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Transaction rollback failed: {:?}", rollback_err);
            }
            Err(err)
        }
    }
}
