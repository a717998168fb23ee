//! # Bookery Shared Library
//!
//! This crate contains the types and persistence logic shared between the
//! Bookery API server and its supporting binaries.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, books, orphaned remote assets)
//! - `auth`: Password hashing, bearer tokens, request authentication
//! - `db`: Connection pool and migration management

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Bookery shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
