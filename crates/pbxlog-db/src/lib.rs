//! pbxlog Database Layer
//!
//! This crate provides PostgreSQL database access for the pbxlog system.
//! It includes:
//!
//! - Connection pool management with sqlx
//! - Idempotent schema bootstrap for the calls and directory tables
//! - The call repository implementing both the append and the read traits

pub mod pool;
pub mod repositories;
pub mod schema;

pub use pool::{create_pool, create_pool_from_config};
pub use repositories::*;
pub use schema::ensure_schema;

// Re-export commonly used types
pub use pbxlog_core::{AppError, AppResult};
pub use sqlx::PgPool;
