/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - A mock media store so no network access is needed
/// - Test user creation and token generation
/// - Multipart request body helpers
///
/// Tests are skipped when `TEST_DATABASE_URL` is not set.

use async_trait::async_trait;
use axum::Router;
use bookery_api::app::{build_router, AppState};
use bookery_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, MediaConfig};
use bookery_api::media::{MediaAsset, MediaError, MediaStore, UploadRequest};
use bookery_shared::auth::jwt::{create_token, Claims};
use bookery_shared::models::orphaned_asset::AssetKind;
use bookery_shared::models::user::{CreateUser, User};
use chrono::Duration;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

/// Secret used by every test token
pub const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Origin the test configuration allows
pub const TEST_ORIGIN: &str = "https://store.test";

/// In-memory media store standing in for the remote host
#[derive(Default)]
pub struct MockMediaStore {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    /// Folder-qualified ids of objects currently "stored"
    objects: HashSet<String>,

    /// When set, destroy calls fail (simulated outage)
    fail_destroy: bool,

    /// When set, upload calls fail
    fail_upload: bool,
}

impl MockMediaStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Whether an object with this folder-qualified id is stored
    pub fn contains(&self, public_id: &str) -> bool {
        self.state.lock().unwrap().objects.contains(public_id)
    }

    /// Number of stored objects
    pub fn object_count(&self) -> usize {
        self.state.lock().unwrap().objects.len()
    }

    /// Makes destroy calls fail until reset
    pub fn set_fail_destroy(&self, fail: bool) {
        self.state.lock().unwrap().fail_destroy = fail;
    }

    /// Makes upload calls fail until reset
    pub fn set_fail_upload(&self, fail: bool) {
        self.state.lock().unwrap().fail_upload = fail;
    }
}

#[async_trait]
impl MediaStore for MockMediaStore {
    async fn upload(&self, request: UploadRequest) -> Result<MediaAsset, MediaError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_upload {
            return Err(MediaError::Api("simulated upload outage".to_string()));
        }

        let public_id = format!("{}/{}", request.folder, request.public_id);
        let extension = request
            .format
            .as_deref()
            .map(|f| format!(".{}", f))
            .unwrap_or_default();
        let url = format!("https://media.test/{}{}", public_id, extension);

        state.objects.insert(public_id.clone());
        Ok(MediaAsset { url, public_id })
    }

    async fn destroy(&self, public_id: &str, _kind: AssetKind) -> Result<(), MediaError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_destroy {
            return Err(MediaError::Api("simulated destroy outage".to_string()));
        }

        // Destroying an absent object is success: the real host reports
        // "not found" and the client treats that as done.
        state.objects.remove(public_id);
        Ok(())
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub media: Arc<MockMediaStore>,
    pub upload_dir: TempDir,
    pub user: User,
    pub token: String,
}

impl TestContext {
    /// Creates a new test context, or None when TEST_DATABASE_URL is unset
    pub async fn try_new() -> Option<TestContext> {
        let database_url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("skipping: TEST_DATABASE_URL not set");
                return None;
            }
        };

        let db = PgPool::connect(&database_url)
            .await
            .expect("connect to test database");

        // Path relative to this crate's Cargo.toml
        sqlx::migrate!("../bookery-shared/migrations")
            .run(&db)
            .await
            .expect("run migrations");

        let upload_dir = TempDir::new().expect("create scratch dir");
        let media = MockMediaStore::new();

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec![TEST_ORIGIN.to_string()],
                upload_dir: upload_dir.path().to_path_buf(),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
                ttl_hours: 168,
            },
            media: MediaConfig {
                cloud_name: "test".to_string(),
                api_key: "key".to_string(),
                api_secret: "secret".to_string(),
                api_base: "https://media.test".to_string(),
            },
        };

        // Harness user for authenticated requests; login tests register
        // through the API instead, so the hash is never verified here.
        let user = User::create(
            &db,
            CreateUser {
                email: format!("test-{}@example.com", Uuid::new_v4()),
                name: "Test User".to_string(),
                password_hash: "test_hash".to_string(),
            },
        )
        .await
        .expect("create test user");

        let token = mint_token(user.id);

        let state = AppState::new(db.clone(), config, media.clone());
        let app = build_router(state);

        Some(TestContext {
            db,
            app,
            media,
            upload_dir,
            user,
            token,
        })
    }

    /// Returns authorization header value for the harness user
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// True when the scratch directory holds no staged files
    pub fn upload_dir_is_empty(&self) -> bool {
        std::fs::read_dir(self.upload_dir.path())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }

    /// Cleans up test data; books cascade with the user
    pub async fn cleanup(&self) {
        let _ = User::delete(&self.db, self.user.id).await;
    }
}

/// Signs a token for the given user with the test secret
pub fn mint_token(user_id: Uuid) -> String {
    let claims = Claims::new(user_id, Duration::hours(1));
    create_token(&claims, TEST_JWT_SECRET).expect("create token")
}

/// Signs an already-expired token for the given user
pub fn mint_expired_token(user_id: Uuid) -> String {
    let claims = Claims::new(user_id, Duration::seconds(-3600));
    create_token(&claims, TEST_JWT_SECRET).expect("create token")
}

/// One part of a multipart request body
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a str, &'a [u8]),
}

/// Boundary used by [`multipart_body`]
pub const BOUNDARY: &str = "bookery-test-boundary";

/// Content-Type header value matching [`multipart_body`]
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// Builds a multipart/form-data body from the given parts
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, content_type, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(
                    format!("Content-Type: {}\r\n\r\n", content_type).as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// The standard complete book form used by most tests
pub fn book_form_body(title: &str) -> Vec<u8> {
    multipart_body(&[
        Part::Text("title", title),
        Part::Text("description", "A book about things"),
        Part::Text("genre", "fiction"),
        Part::File("coverImage", "cover.png", "image/png", b"png-bytes"),
        Part::File("file", "book.pdf", "application/pdf", b"pdf-bytes"),
    ])
}
