//! Server infrastructure module.
//!
//! - Middleware composition for the API router
//! - Liveness and readiness endpoints
//! - Graceful shutdown shared by several listeners
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::server::{apply_middleware, bind, serve, HttpOptions, ShutdownCoordinator};
//!
//! let app = apply_middleware(api_routes, &HttpOptions::default());
//! let coordinator = ShutdownCoordinator::new();
//! let listener = bind(&ServerConfig::new("0.0.0.0".to_string(), 8080)).await?;
//! serve(listener, app, coordinator.clone(), Duration::from_secs(30)).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{HttpOptions, apply_middleware, bind, serve};
pub use health::{health_router, healthz, readyz};
pub use shutdown::ShutdownCoordinator;
