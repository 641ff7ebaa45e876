//! # Axum Helpers
//!
//! Utilities, middleware, and helpers shared by the HTTP services.
//!
//! ## Modules
//!
//! - **[`server`]**: middleware composition, health probes, graceful shutdown
//! - **[`http`]**: individual middleware (CORS, security headers, request id, client IP, limits, panics)
//! - **[`errors`]**: the application error type and its JSON body
//! - **[`extractors`]**: validated JSON extractor

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

// Re-export server types
pub use server::{
    HttpOptions, ShutdownCoordinator, apply_middleware, bind, health_router, serve,
};

// Re-export HTTP middleware
pub use http::{ClientIp, create_cors_layer, extract_ip_from_headers, security_headers};

// Re-export error types
pub use errors::{AppError, AppResult, ErrorKind, ErrorResponse, handlers::not_found};

// Re-export extractors
pub use extractors::ValidatedJson;
