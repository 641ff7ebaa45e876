//! HTTP middleware module.
//!
//! - CORS configuration
//! - Security headers
//! - Request id assignment and propagation
//! - Client IP resolution
//! - Header size limits
//! - Panic recovery
//!
//! The layers are normally composed through [`crate::server::apply_middleware`].

pub mod client_ip;
pub mod cors;
pub mod limits;
pub mod panic;
pub mod request_id;
pub mod security;

pub use client_ip::{ClientIp, client_ip_middleware, extract_ip_from_headers};
pub use cors::create_cors_layer;
pub use limits::{HeaderLimit, header_size_guard};
pub use panic::handle_panic;
pub use request_id::{REQUEST_ID_HEADER, propagate_request_id_layer, set_request_id_layer};
pub use security::security_headers;
