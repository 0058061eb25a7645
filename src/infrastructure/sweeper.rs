use crate::domain::auth::RefreshTokenRepository;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Background loop purging expired and retired refresh tokens.
///
/// Spawned once at startup with an explicit shutdown signal; one pass runs
/// immediately to catch up on downtime, then the loop repeats on a fixed
/// interval. Shutdown is only observed between passes, so a purge that has
/// started always runs to completion.
pub struct TokenSweeper {
    repo: Arc<dyn RefreshTokenRepository>,
    interval: Duration,
}

impl TokenSweeper {
    pub fn new(repo: Arc<dyn RefreshTokenRepository>, interval: Duration) -> Self {
        Self { repo, interval }
    }

    pub fn spawn(self, mut shutdown: watch::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // A failed pass is recoverable; the next tick retries.
                        if let Err(err) = self.sweep_once().await {
                            tracing::error!("Token sweep failed: {:?}", err);
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Token sweeper shutting down");
                        break;
                    }
                }
            }
        })
    }

    async fn sweep_once(&self) -> anyhow::Result<()> {
        let eligible = self.repo.count_purgeable().await?;
        if eligible == 0 {
            return Ok(());
        }

        tracing::info!("Starting cleanup of {} expired tokens", eligible);
        let removed = self.repo.purge_expired_or_inactive().await?;
        tracing::info!("Cleaned up {} expired tokens", removed);

        Ok(())
    }
}
