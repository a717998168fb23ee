/// Database models for Bookery
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: Storefront and dashboard accounts
/// - `book`: Catalog entries with remote cover/content assets
/// - `orphaned_asset`: Ledger of remote objects awaiting deletion
///
/// # Example
///
/// ```no_run
/// use bookery_shared::models::user::{CreateUser, User};
/// use bookery_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(
///     &pool,
///     CreateUser {
///         email: "user@example.com".to_string(),
///         name: "John Doe".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod book;
pub mod orphaned_asset;
pub mod user;
