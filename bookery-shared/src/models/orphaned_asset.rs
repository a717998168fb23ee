/// Orphaned-asset ledger
///
/// Book writes span two stores that cannot be updated atomically: the remote
/// media host and the database. Instead of compensating transactions, every
/// remote object that may be stranded is recorded here and retired by an
/// idempotent background sweep:
///
/// - **delete book**: both asset keys are recorded as deletion intents before
///   the database row goes away; a crash mid-delete leaves intents the sweep
///   retries.
/// - **create/update failure**: an asset uploaded before a later step failed
///   is recorded so it doesn't leak on the media host.
/// - **update replacing an asset**: the replaced key is recorded; the old
///   object is deleted out of band.
///
/// Rows whose `book_id` still resolves to a live book are intents from a
/// delete that never committed; the sweep drops them without touching the
/// remote store.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE asset_kind AS ENUM ('image', 'raw');
///
/// CREATE TABLE orphaned_assets (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     public_id VARCHAR(512) NOT NULL,
///     kind asset_kind NOT NULL,
///     book_id UUID,
///     recorded_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     attempts INTEGER NOT NULL DEFAULT 0,
///     last_error TEXT
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Remote resource type of an asset
///
/// Mirrors the media host's resource-type distinction: cover images are
/// `image` resources, content files are `raw` resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "asset_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Cover image (delivered with format conversion)
    Image,

    /// Content file (delivered verbatim)
    Raw,
}

impl AssetKind {
    /// Resource-type path segment used by the media host API
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Raw => "raw",
        }
    }
}

/// A remote object awaiting deletion
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrphanedAsset {
    /// Ledger row id
    pub id: Uuid,

    /// Folder-qualified remote object identifier
    pub public_id: String,

    /// Remote resource type
    pub kind: AssetKind,

    /// Book the asset belonged to, if it was recorded as a deletion intent
    pub book_id: Option<Uuid>,

    /// When the row was recorded
    pub recorded_at: DateTime<Utc>,

    /// Number of failed deletion attempts so far
    pub attempts: i32,

    /// Error from the most recent failed attempt
    pub last_error: Option<String>,
}

impl OrphanedAsset {
    /// Records a remote object for later deletion
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn record(
        pool: &PgPool,
        public_id: &str,
        kind: AssetKind,
        book_id: Option<Uuid>,
    ) -> Result<Self, sqlx::Error> {
        let asset = sqlx::query_as::<_, OrphanedAsset>(
            r#"
            INSERT INTO orphaned_assets (public_id, kind, book_id)
            VALUES ($1, $2, $3)
            RETURNING id, public_id, kind, book_id, recorded_at, attempts, last_error
            "#,
        )
        .bind(public_id)
        .bind(kind)
        .bind(book_id)
        .fetch_one(pool)
        .await?;

        Ok(asset)
    }

    /// Lists ledger rows due for a deletion attempt, oldest first
    ///
    /// Rows that have already failed `max_attempts` times are left for
    /// operator inspection rather than retried forever.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_due(
        pool: &PgPool,
        limit: i64,
        max_attempts: i32,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let assets = sqlx::query_as::<_, OrphanedAsset>(
            r#"
            SELECT id, public_id, kind, book_id, recorded_at, attempts, last_error
            FROM orphaned_assets
            WHERE attempts < $2
            ORDER BY recorded_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .bind(max_attempts)
        .fetch_all(pool)
        .await?;

        Ok(assets)
    }

    /// Retires a ledger row after the remote object is gone
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn resolve(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orphaned_assets WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records a failed deletion attempt
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn mark_attempt(pool: &PgPool, id: Uuid, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE orphaned_assets
            SET attempts = attempts + 1, last_error = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;

        Ok(())
    }
}
