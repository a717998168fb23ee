/// Background reconciliation sweep
///
/// Book writes span the database and the remote media host without a
/// transaction. Every remote object that may be stranded — deletion intents,
/// replaced assets, uploads whose request died mid-flight — lands in the
/// orphaned-asset ledger, and this sweep retires the ledger:
///
/// 1. Claim a bounded batch of due ledger rows.
/// 2. Skip-and-resolve intents whose book still exists (an aborted delete).
/// 3. Call the media host's destroy for the rest; resolve on success, record
///    the attempt on failure. Destroy is idempotent, so retries are safe.
/// 4. Prune staged upload files older than an hour from the scratch dir.
///
/// The sweep runs as a tokio task spawned from `main` and stops on the
/// shutdown token.
///
/// # Example
///
/// ```no_run
/// use bookery_api::sweep::{Sweeper, SweeperConfig};
/// use bookery_api::media::Cloudinary;
/// use sqlx::PgPool;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(pool: PgPool, media: Arc<Cloudinary>) {
/// let sweeper = Sweeper::new(
///     pool,
///     media,
///     "/tmp/bookery-uploads".into(),
///     SweeperConfig::default(),
/// );
/// let shutdown = sweeper.shutdown_token();
/// tokio::spawn(async move { sweeper.run().await });
/// // ... later
/// shutdown.cancel();
/// # }
/// ```

use crate::media::MediaStore;
use crate::upload;
use bookery_shared::models::{book::Book, orphaned_asset::OrphanedAsset};
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Sweep configuration
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Seconds between sweep passes
    pub interval_secs: u64,

    /// Maximum ledger rows processed per pass
    pub batch_size: i64,

    /// Rows that failed this many times are left for operator inspection
    pub max_attempts: i32,

    /// Staged files older than this many seconds are pruned
    pub stale_upload_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        SweeperConfig {
            interval_secs: 60,
            batch_size: 50,
            max_attempts: 10,
            stale_upload_secs: 3600,
        }
    }
}

/// Background reconciler for orphaned remote assets and stale staged files
pub struct Sweeper {
    db: PgPool,
    media: Arc<dyn MediaStore>,
    upload_dir: PathBuf,
    config: SweeperConfig,
    shutdown_token: CancellationToken,
}

impl Sweeper {
    /// Creates a new sweeper
    pub fn new(
        db: PgPool,
        media: Arc<dyn MediaStore>,
        upload_dir: PathBuf,
        config: SweeperConfig,
    ) -> Self {
        Sweeper {
            db,
            media,
            upload_dir,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Token that stops the run loop when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs the sweep loop until the shutdown token is cancelled
    pub async fn run(&self) {
        info!(
            interval_secs = self.config.interval_secs,
            "Reconciliation sweep started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    info!("Reconciliation sweep shutting down");
                    return;
                }
                _ = sleep(Duration::from_secs(self.config.interval_secs)) => {}
            }

            if let Err(e) = self.run_once().await {
                warn!(error = %e, "Sweep pass failed");
            }
        }
    }

    /// Performs one sweep pass; exposed separately so tests can drive it
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read. Per-row failures are
    /// recorded on the row and do not abort the pass.
    pub async fn run_once(&self) -> anyhow::Result<()> {
        let due =
            OrphanedAsset::list_due(&self.db, self.config.batch_size, self.config.max_attempts)
                .await?;

        if !due.is_empty() {
            debug!(count = due.len(), "Processing orphaned assets");
        }

        for asset in due {
            // A deletion intent whose book still exists means the delete
            // never committed; the remote object is still referenced.
            if let Some(book_id) = asset.book_id {
                match Book::find_by_id(&self.db, book_id).await {
                    Ok(Some(_)) => {
                        debug!(
                            public_id = %asset.public_id,
                            book_id = %book_id,
                            "Dropping intent for live book"
                        );
                        let _ = OrphanedAsset::resolve(&self.db, asset.id).await;
                        continue;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(error = %e, "Failed to check book for intent; skipping row");
                        continue;
                    }
                }
            }

            match self.media.destroy(&asset.public_id, asset.kind).await {
                Ok(()) => {
                    debug!(public_id = %asset.public_id, "Orphaned asset destroyed");
                    let _ = OrphanedAsset::resolve(&self.db, asset.id).await;
                }
                Err(e) => {
                    warn!(
                        public_id = %asset.public_id,
                        attempts = asset.attempts + 1,
                        error = %e,
                        "Orphaned asset destroy failed"
                    );
                    let _ = OrphanedAsset::mark_attempt(&self.db, asset.id, &e.to_string()).await;
                }
            }
        }

        // A request that died between staging and cleanup leaves a file here
        match upload::prune_stale(
            &self.upload_dir,
            Duration::from_secs(self.config.stale_upload_secs),
        )
        .await
        {
            Ok(0) => {}
            Ok(pruned) => info!(pruned, "Pruned stale staged uploads"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, "Failed to prune staged uploads"),
        }

        Ok(())
    }
}
