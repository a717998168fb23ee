/// Authentication utilities
///
/// This module provides the authentication primitives used by the API server:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Bearer token generation and validation
/// - [`middleware`]: Axum middleware that authenticates incoming requests
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Bearer Tokens**: HS256 signing with a fixed expiry
/// - **Constant-time Comparison**: Password verification never short-circuits
///
/// # Example
///
/// ```no_run
/// use bookery_shared::auth::password::{hash_password, verify_password};
/// use bookery_shared::auth::jwt::{create_token, validate_token, Claims};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Password authentication
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// // Token issuance
/// let claims = Claims::new(Uuid::new_v4(), Duration::days(7));
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!!")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
