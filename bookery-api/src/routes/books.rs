/// Book endpoints
///
/// The write paths orchestrate a strictly sequential chain across three
/// stores: the request body is staged to local disk, staged files are pushed
/// to the remote media host, and the result is persisted to the database.
/// There is no cross-store transaction. Instead, any remote object that a
/// failure or replacement may strand is recorded in the orphaned-asset
/// ledger, and the background sweep retires it later.
///
/// Ownership rule: only the user recorded as a book's author may update or
/// delete it. The author reference itself is immutable.
///
/// # Endpoints
///
/// - `POST /api/books` - Create (auth, multipart: coverImage + file required)
/// - `PATCH /api/books/:book_id` - Update (auth + ownership, files optional)
/// - `GET /api/books` - List all books with author names
/// - `GET /api/books/:book_id` - Single book with author name
/// - `DELETE /api/books/:book_id` - Delete (auth + ownership)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    media::UploadRequest,
    upload::{stage_field, StagedFile},
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use bookery_shared::{
    auth::middleware::AuthContext,
    models::{
        book::{AssetUpdate, Book, BookWithAuthor, CreateBook, UpdateBook},
        orphaned_asset::{AssetKind, OrphanedAsset},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Remote folder for cover images
const COVER_FOLDER: &str = "book-covers";

/// Remote folder for content files
const FILE_FOLDER: &str = "book-files";

/// Fixed client-facing message for any failure in the upload chain
const UPLOAD_FAILED: &str = "Error while uploading the files";

/// Fixed client-facing message for any failure in the delete chain
const DELETE_FAILED: &str = "Error while deleting the book";

/// Create book response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBookResponse {
    /// Id of the newly created book
    pub id: Uuid,
}

/// Fields collected from a multipart book form
#[derive(Debug, Default)]
struct BookForm {
    title: Option<String>,
    description: Option<String>,
    genre: Option<String>,
    cover: Option<StagedFile>,
    file: Option<StagedFile>,
}

/// Removes whatever the form staged on disk
async fn discard(cover: &Option<StagedFile>, file: &Option<StagedFile>) {
    if let Some(c) = cover {
        c.remove().await;
    }
    if let Some(f) = file {
        f.remove().await;
    }
}

/// Reads a multipart book form, staging file fields to the scratch directory
///
/// On error, anything already staged is removed before returning.
async fn read_book_form(
    mut multipart: Multipart,
    dir: &std::path::Path,
) -> Result<BookForm, ApiError> {
    let mut form = BookForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                discard(&form.cover, &form.file).await;
                return Err(e.into());
            }
        };

        let name = field.name().map(String::from);
        match name.as_deref() {
            Some("title") | Some("description") | Some("genre") => {
                let value = match field.text().await {
                    Ok(value) => value,
                    Err(e) => {
                        discard(&form.cover, &form.file).await;
                        return Err(e.into());
                    }
                };
                match name.as_deref() {
                    Some("title") => form.title = Some(value),
                    Some("description") => form.description = Some(value),
                    _ => form.genre = Some(value),
                }
            }
            Some("coverImage") | Some("file") => {
                let staged = match stage_field(field, dir).await {
                    Ok(staged) => staged,
                    Err(e) => {
                        discard(&form.cover, &form.file).await;
                        return Err(e.into());
                    }
                };
                if name.as_deref() == Some("coverImage") {
                    if let Some(previous) = form.cover.replace(staged) {
                        previous.remove().await;
                    }
                } else if let Some(previous) = form.file.replace(staged) {
                    previous.remove().await;
                }
            }
            // Unknown fields are skipped
            _ => {}
        }
    }

    Ok(form)
}

fn cover_upload_request(staged: &StagedFile) -> UploadRequest {
    UploadRequest {
        path: staged.path.clone(),
        public_id: staged.file_name.clone(),
        folder: COVER_FOLDER.to_string(),
        kind: AssetKind::Image,
        format: staged.format().map(String::from),
    }
}

fn file_upload_request(staged: &StagedFile) -> UploadRequest {
    UploadRequest {
        path: staged.path.clone(),
        public_id: staged.file_name.clone(),
        folder: FILE_FOLDER.to_string(),
        kind: AssetKind::Raw,
        format: None,
    }
}

/// Records a remote object the current request stranded; failures here are
/// logged, not surfaced — the asset is already orphaned either way.
async fn record_orphan(state: &AppState, public_id: &str, kind: AssetKind) {
    if let Err(e) = OrphanedAsset::record(&state.db, public_id, kind, None).await {
        tracing::warn!(
            public_id = %public_id,
            error = %e,
            "Failed to record orphaned asset"
        );
    }
}

/// Create a new book
///
/// Sequence: stage both files → upload cover (image resource, format from
/// MIME subtype) → upload content file (raw resource) → insert row → remove
/// temp files. Each step's failure aborts the remainder; an asset uploaded
/// before the failure is recorded as an orphan for the sweep.
///
/// # Errors
///
/// - `400 Bad Request`: Missing text fields or either file
/// - `401 Unauthorized`: Missing or invalid token
/// - `500 Internal Server Error`: Any disk, media host, or database failure
pub async fn create_book(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<CreateBookResponse>)> {
    let form = read_book_form(multipart, &state.config.api.upload_dir).await?;
    let BookForm {
        title,
        description,
        genre,
        cover,
        file,
    } = form;

    let (title, description, genre) = match (
        title.filter(|s| !s.is_empty()),
        description.filter(|s| !s.is_empty()),
        genre.filter(|s| !s.is_empty()),
    ) {
        (Some(t), Some(d), Some(g)) => (t, d, g),
        _ => {
            discard(&cover, &file).await;
            return Err(ApiError::BadRequest(
                "Title, description and genre are required".to_string(),
            ));
        }
    };

    let (cover, file) = match (cover, file) {
        (Some(c), Some(f)) => (c, f),
        (cover, file) => {
            discard(&cover, &file).await;
            return Err(ApiError::BadRequest(
                "A cover image and a book file are required".to_string(),
            ));
        }
    };

    let cover_asset = match state.media.upload(cover_upload_request(&cover)).await {
        Ok(asset) => asset,
        Err(e) => {
            tracing::error!(error = %e, "Cover image upload failed");
            discard(&Some(cover), &Some(file)).await;
            return Err(ApiError::InternalError(UPLOAD_FAILED.to_string()));
        }
    };

    let file_asset = match state.media.upload(file_upload_request(&file)).await {
        Ok(asset) => asset,
        Err(e) => {
            tracing::error!(error = %e, "Book file upload failed");
            record_orphan(&state, &cover_asset.public_id, AssetKind::Image).await;
            discard(&Some(cover), &Some(file)).await;
            return Err(ApiError::InternalError(UPLOAD_FAILED.to_string()));
        }
    };

    let book = match Book::create(
        &state.db,
        CreateBook {
            title,
            description,
            genre,
            author_id: auth.user_id,
            cover_image_url: cover_asset.url.clone(),
            cover_image_key: cover_asset.public_id.clone(),
            file_url: file_asset.url.clone(),
            file_key: file_asset.public_id.clone(),
        },
    )
    .await
    {
        Ok(book) => book,
        Err(e) => {
            tracing::error!(error = %e, "Failed to persist book");
            record_orphan(&state, &cover_asset.public_id, AssetKind::Image).await;
            record_orphan(&state, &file_asset.public_id, AssetKind::Raw).await;
            discard(&Some(cover), &Some(file)).await;
            return Err(ApiError::InternalError(UPLOAD_FAILED.to_string()));
        }
    };

    // Delete temp files
    cover.remove().await;
    file.remove().await;

    tracing::info!(book_id = %book.id, author_id = %auth.user_id, "Book created");

    Ok((StatusCode::CREATED, Json(CreateBookResponse { id: book.id })))
}

/// Update a book
///
/// Only the author may update. Each file slot present in the multipart body
/// is re-uploaded exactly like create; the replaced remote asset is recorded
/// in the ledger so the sweep deletes it. Slots absent from the body keep
/// their URL and key.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `403 Forbidden`: Caller is not the author
/// - `404 Not Found`: No such book
/// - `500 Internal Server Error`: Any disk, media host, or database failure
pub async fn update_book(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(book_id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<BookWithAuthor>> {
    let book = Book::find_by_id(&state.db, book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))?;

    // Check access
    if book.author_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "You cannot update another user's book".to_string(),
        ));
    }

    let form = read_book_form(multipart, &state.config.api.upload_dir).await?;
    let BookForm {
        title,
        description,
        genre,
        cover,
        file,
    } = form;

    let mut update = UpdateBook {
        title: title.filter(|s| !s.is_empty()),
        description: description.filter(|s| !s.is_empty()),
        genre: genre.filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Old keys of the slots this update replaces: once the database write
    // succeeds, the previous remote objects are unreferenced and go to the
    // sweep. Until then, the *new* uploads are the ones at risk of stranding.
    let mut replaced: Vec<(String, AssetKind)> = Vec::new();
    let mut uploaded: Vec<(String, AssetKind)> = Vec::new();

    if let Some(ref staged) = cover {
        let asset = match state.media.upload(cover_upload_request(staged)).await {
            Ok(asset) => asset,
            Err(e) => {
                tracing::error!(error = %e, "Replacement cover upload failed");
                discard(&cover, &file).await;
                return Err(ApiError::InternalError(UPLOAD_FAILED.to_string()));
            }
        };
        uploaded.push((asset.public_id.clone(), AssetKind::Image));
        update.cover_image = Some(AssetUpdate {
            url: asset.url,
            key: asset.public_id,
        });
        replaced.push((book.cover_image_key.clone(), AssetKind::Image));
    }

    if let Some(ref staged) = file {
        let asset = match state.media.upload(file_upload_request(staged)).await {
            Ok(asset) => asset,
            Err(e) => {
                tracing::error!(error = %e, "Replacement file upload failed");
                for (key, kind) in uploaded {
                    record_orphan(&state, &key, kind).await;
                }
                discard(&cover, &file).await;
                return Err(ApiError::InternalError(UPLOAD_FAILED.to_string()));
            }
        };
        uploaded.push((asset.public_id.clone(), AssetKind::Raw));
        update.file = Some(AssetUpdate {
            url: asset.url,
            key: asset.public_id,
        });
        replaced.push((book.file_key.clone(), AssetKind::Raw));
    }

    let updated = match Book::update(&state.db, book_id, update).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            // Deleted out from under us between the ownership check and the
            // write: the freshly uploaded replacements are now orphans.
            for (key, kind) in uploaded {
                record_orphan(&state, &key, kind).await;
            }
            discard(&cover, &file).await;
            return Err(ApiError::NotFound("Book not found".to_string()));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to persist book update");
            for (key, kind) in uploaded {
                record_orphan(&state, &key, kind).await;
            }
            discard(&cover, &file).await;
            return Err(ApiError::InternalError(UPLOAD_FAILED.to_string()));
        }
    };

    discard(&cover, &file).await;

    // The previous assets of each replaced slot are now unreferenced
    for (key, kind) in replaced {
        record_orphan(&state, &key, kind).await;
    }

    tracing::info!(book_id = %updated.id, "Book updated");

    let with_author = Book::find_with_author(&state.db, updated.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))?;

    Ok(Json(with_author))
}

/// List all books with author display names
pub async fn list_books(State(state): State<AppState>) -> ApiResult<Json<Vec<BookWithAuthor>>> {
    let books = Book::list_with_authors(&state.db).await?;
    Ok(Json(books))
}

/// Get a single book with its author's display name
///
/// # Errors
///
/// - `404 Not Found`: No such book
pub async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> ApiResult<Json<BookWithAuthor>> {
    let book = Book::find_with_author(&state.db, book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))?;

    Ok(Json(book))
}

/// Delete a book
///
/// Only the author may delete. Deletion intents for both remote assets are
/// recorded in the ledger *before* anything is destroyed, then the database
/// row is removed, then the remote destroys are attempted. A destroy that
/// fails leaves its intent row for the sweep to retry; a crash anywhere in
/// the sequence is reconciled the same way.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `403 Forbidden`: Caller is not the author
/// - `404 Not Found`: No such book
/// - `500 Internal Server Error`: Database failure
pub async fn delete_book(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(book_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let book = Book::find_by_id(&state.db, book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))?;

    // Check access
    if book.author_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "You cannot delete another user's book".to_string(),
        ));
    }

    // Durable intents first: whatever happens after this point, the sweep
    // can finish the job. The intents carry the book id so an aborted delete
    // (row still present) is recognized and dropped.
    let cover_intent = OrphanedAsset::record(
        &state.db,
        &book.cover_image_key,
        AssetKind::Image,
        Some(book.id),
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to record deletion intent");
        ApiError::InternalError(DELETE_FAILED.to_string())
    })?;

    let file_intent =
        OrphanedAsset::record(&state.db, &book.file_key, AssetKind::Raw, Some(book.id))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to record deletion intent");
                ApiError::InternalError(DELETE_FAILED.to_string())
            })?;

    match Book::delete(&state.db, book_id).await {
        Ok(true) => {}
        Ok(false) => {
            // Already gone; drop the intents we just recorded
            let _ = OrphanedAsset::resolve(&state.db, cover_intent.id).await;
            let _ = OrphanedAsset::resolve(&state.db, file_intent.id).await;
            return Err(ApiError::NotFound("Book not found".to_string()));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete book row");
            let _ = OrphanedAsset::resolve(&state.db, cover_intent.id).await;
            let _ = OrphanedAsset::resolve(&state.db, file_intent.id).await;
            return Err(ApiError::InternalError(DELETE_FAILED.to_string()));
        }
    }

    // Best-effort remote deletes; failures stay in the ledger
    for (intent, kind) in [
        (cover_intent, AssetKind::Image),
        (file_intent, AssetKind::Raw),
    ] {
        match state.media.destroy(&intent.public_id, kind).await {
            Ok(()) => {
                let _ = OrphanedAsset::resolve(&state.db, intent.id).await;
            }
            Err(e) => {
                tracing::warn!(
                    public_id = %intent.public_id,
                    error = %e,
                    "Remote asset delete failed; left for the sweep"
                );
                let _ = OrphanedAsset::mark_attempt(&state.db, intent.id, &e.to_string()).await;
            }
        }
    }

    tracing::info!(book_id = %book_id, author_id = %auth.user_id, "Book deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn staged(content_type: &str) -> StagedFile {
        StagedFile {
            path: PathBuf::from("/tmp/abc"),
            file_name: "abc".to_string(),
            original_name: Some("cover.png".to_string()),
            content_type: content_type.to_string(),
        }
    }

    #[test]
    fn test_cover_upload_request_derives_format_from_mime() {
        let request = cover_upload_request(&staged("image/png"));
        assert_eq!(request.folder, COVER_FOLDER);
        assert_eq!(request.kind, AssetKind::Image);
        assert_eq!(request.format.as_deref(), Some("png"));
        assert_eq!(request.public_id, "abc");
    }

    #[test]
    fn test_file_upload_request_is_raw_without_format() {
        let request = file_upload_request(&staged("application/pdf"));
        assert_eq!(request.folder, FILE_FOLDER);
        assert_eq!(request.kind, AssetKind::Raw);
        assert!(request.format.is_none());
    }
}
