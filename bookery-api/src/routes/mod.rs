/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Registration and login
/// - `books`: Book catalog CRUD with file uploads

pub mod books;
pub mod health;
pub mod users;
