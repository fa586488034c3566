//! OfficeHub Common Library
//!
//! Shared code for the OfficeHub check-in client including:
//! - Error types and handling
//! - Configuration management
//! - Wire models for the record service
//! - Remote service client abstraction
//! - Session ownership and role-based route gating
//! - Metrics and observability

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod models;

// Re-export commonly used types
pub use crate::auth::{Session, SessionStore};
pub use crate::client::{HttpRemoteService, RemoteService};
pub use crate::config::AppConfig;
pub use crate::errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
