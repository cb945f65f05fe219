//! HTTP request handlers

pub mod call;
pub mod health;

pub use call::configure as configure_calls;
pub use health::health_check;
