//! # Bookery API Server Library
//!
//! This library provides the core functionality for the Bookery API server.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `media`: Remote media host client
//! - `middleware`: Request middleware (origin allow-list)
//! - `routes`: API route handlers
//! - `sweep`: Background reconciliation of orphaned remote assets
//! - `upload`: Multipart upload staging

pub mod app;
pub mod config;
pub mod error;
pub mod media;
pub mod middleware;
pub mod routes;
pub mod sweep;
pub mod upload;
