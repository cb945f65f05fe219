//! pbxlog Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the pbxlog system. It includes:
//!
//! - Domain models (CDR, record formats, stored call rows)
//! - Repository traits for the call store and the read path
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
