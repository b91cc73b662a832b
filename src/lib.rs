// Account Service - Core Library
// Exposes all modules for use in the HTTP server, the admin CLI, and tests

pub mod config;
pub mod content_type;
pub mod db;
pub mod entities;
pub mod error;
pub mod logging;
pub mod routes;
pub mod security;

// Re-export commonly used types
pub use config::ServerConfig;
pub use content_type::check_content_type;
pub use db::{setup_database, verify_count, Database};
pub use entities::Account;
pub use error::{AccountError, ValidationError};
pub use logging::{init_logging, LogFormat};
pub use routes::{build_router, AppState, Endpoint, Route, ROUTES};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
