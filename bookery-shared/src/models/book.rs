/// Book model and database operations
///
/// Books are the catalog entries of the store. Each book references its
/// owning user (`author_id`) and carries two remote assets: a cover image and
/// a content file. For both assets the delivery URL *and* the remote object
/// identifier are persisted, so deletion works from stored state rather than
/// parsing URLs.
///
/// `author_id` is immutable after creation: no update path ever writes it,
/// and only the author may update or delete the book (enforced at the API
/// layer).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE books (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     genre VARCHAR(100) NOT NULL,
///     author_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     cover_image_url VARCHAR(512) NOT NULL,
///     cover_image_key VARCHAR(255) NOT NULL,
///     file_url VARCHAR(512) NOT NULL,
///     file_key VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Book model as stored, including remote object identifiers
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Unique book id (UUID v4)
    pub id: Uuid,

    /// Title shown in the storefront
    pub title: String,

    /// Long-form description
    pub description: String,

    /// Genre label
    pub genre: String,

    /// Owning user; immutable after creation
    pub author_id: Uuid,

    /// Delivery URL of the cover image
    pub cover_image_url: String,

    /// Remote object identifier of the cover image (folder-qualified)
    pub cover_image_key: String,

    /// Delivery URL of the content file
    pub file_url: String,

    /// Remote object identifier of the content file (folder-qualified)
    pub file_key: String,

    /// When the book was created
    pub created_at: DateTime<Utc>,

    /// When the book was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub description: String,
    pub genre: String,
    pub author_id: Uuid,
    pub cover_image_url: String,
    pub cover_image_key: String,
    pub file_url: String,
    pub file_key: String,
}

/// A freshly uploaded asset replacing one of a book's file slots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetUpdate {
    /// New delivery URL
    pub url: String,

    /// New remote object identifier
    pub key: String,
}

/// Input for updating an existing book
///
/// Only non-None fields are written. `author_id` is deliberately absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub cover_image: Option<AssetUpdate>,
    pub file: Option<AssetUpdate>,
}

/// Owning user of a book, reduced to what public responses expose
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
}

/// A book joined with its author's display name
///
/// This is the shape returned by the public list/read endpoints: the remote
/// object identifiers stay internal, and the author reference is expanded
/// into `{id, name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookWithAuthor {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub author: AuthorSummary,
    pub cover_image_url: String,
    pub file_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat row produced by the author-join queries
#[derive(Debug, sqlx::FromRow)]
struct BookAuthorRow {
    id: Uuid,
    title: String,
    description: String,
    genre: String,
    author_id: Uuid,
    author_name: String,
    cover_image_url: String,
    file_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookAuthorRow> for BookWithAuthor {
    fn from(row: BookAuthorRow) -> Self {
        BookWithAuthor {
            id: row.id,
            title: row.title,
            description: row.description,
            genre: row.genre,
            author: AuthorSummary {
                id: row.author_id,
                name: row.author_name,
            },
            cover_image_url: row.cover_image_url,
            file_url: row.file_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const BOOK_COLUMNS: &str = "id, title, description, genre, author_id, \
     cover_image_url, cover_image_key, file_url, file_key, created_at, updated_at";

impl Book {
    /// Creates a new book
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails (including a missing
    /// author, rejected by the foreign key).
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use bookery_shared::models::book::{Book, CreateBook};
    /// # use sqlx::PgPool;
    /// # use uuid::Uuid;
    /// # async fn example(pool: PgPool, author_id: Uuid) -> Result<(), sqlx::Error> {
    /// let book = Book::create(
    ///     &pool,
    ///     CreateBook {
    ///         title: "The Rust Book".to_string(),
    ///         description: "Learn Rust".to_string(),
    ///         genre: "programming".to_string(),
    ///         author_id,
    ///         cover_image_url: "https://media.example.com/book-covers/abc.png".to_string(),
    ///         cover_image_key: "book-covers/abc".to_string(),
    ///         file_url: "https://media.example.com/book-files/def".to_string(),
    ///         file_key: "book-files/def".to_string(),
    ///     },
    /// )
    /// .await?;
    /// println!("Created book: {}", book.id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(pool: &PgPool, data: CreateBook) -> Result<Self, sqlx::Error> {
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, description, genre, author_id,
                               cover_image_url, cover_image_key, file_url, file_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {BOOK_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.genre)
        .bind(data.author_id)
        .bind(data.cover_image_url)
        .bind(data.cover_image_key)
        .bind(data.file_url)
        .bind(data.file_key)
        .fetch_one(pool)
        .await?;

        Ok(book)
    }

    /// Finds a book by id, including its remote object identifiers
    ///
    /// Used for ownership checks and deletion; public reads go through
    /// [`Book::find_with_author`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(book)
    }

    /// Finds a book by id with the author's display name joined in
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn find_with_author(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<BookWithAuthor>, sqlx::Error> {
        let row = sqlx::query_as::<_, BookAuthorRow>(
            r#"
            SELECT b.id, b.title, b.description, b.genre, b.author_id,
                   u.name AS author_name,
                   b.cover_image_url, b.file_url, b.created_at, b.updated_at
            FROM books b
            JOIN users u ON u.id = b.author_id
            WHERE b.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(BookWithAuthor::from))
    }

    /// Lists all books with author display names, newest first
    ///
    /// No pagination: the catalog endpoint returns the full list.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_with_authors(pool: &PgPool) -> Result<Vec<BookWithAuthor>, sqlx::Error> {
        let rows = sqlx::query_as::<_, BookAuthorRow>(
            r#"
            SELECT b.id, b.title, b.description, b.genre, b.author_id,
                   u.name AS author_name,
                   b.cover_image_url, b.file_url, b.created_at, b.updated_at
            FROM books b
            JOIN users u ON u.id = b.author_id
            ORDER BY b.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(BookWithAuthor::from).collect())
    }

    /// Updates an existing book
    ///
    /// Only non-None fields in `data` are written; `updated_at` is always
    /// refreshed. The author reference cannot be changed through this path.
    ///
    /// # Returns
    ///
    /// The updated book if found, None if the book doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateBook,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE books SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.genre.is_some() {
            bind_count += 1;
            query.push_str(&format!(", genre = ${}", bind_count));
        }
        if data.cover_image.is_some() {
            query.push_str(&format!(
                ", cover_image_url = ${}, cover_image_key = ${}",
                bind_count + 1,
                bind_count + 2
            ));
            bind_count += 2;
        }
        if data.file.is_some() {
            query.push_str(&format!(
                ", file_url = ${}, file_key = ${}",
                bind_count + 1,
                bind_count + 2
            ));
            bind_count += 2;
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {BOOK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Book>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(genre) = data.genre {
            q = q.bind(genre);
        }
        if let Some(cover) = data.cover_image {
            q = q.bind(cover.url).bind(cover.key);
        }
        if let Some(file) = data.file {
            q = q.bind(file.url).bind(file.key);
        }

        let book = q.fetch_optional(pool).await?;

        Ok(book)
    }

    /// Deletes a book row by id
    ///
    /// Remote assets are not touched here; the caller records deletion
    /// intents in the orphaned-asset ledger and drives the remote deletes.
    ///
    /// # Returns
    ///
    /// True if the book was deleted, false if it didn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_book_default_is_empty() {
        let update = UpdateBook::default();
        assert!(update.title.is_none());
        assert!(update.description.is_none());
        assert!(update.genre.is_none());
        assert!(update.cover_image.is_none());
        assert!(update.file.is_none());
    }

    #[test]
    fn test_book_with_author_serializes_nested_author() {
        let row = BookAuthorRow {
            id: Uuid::new_v4(),
            title: "Title".to_string(),
            description: "Description".to_string(),
            genre: "fiction".to_string(),
            author_id: Uuid::new_v4(),
            author_name: "A".to_string(),
            cover_image_url: "https://media.example.com/book-covers/x.png".to_string(),
            file_url: "https://media.example.com/book-files/y".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let book = BookWithAuthor::from(row);
        let json = serde_json::to_value(&book).unwrap();

        assert_eq!(json["author"]["name"], "A");
        assert!(json.get("cover_image_key").is_none());
        assert!(json.get("file_key").is_none());
    }
}
