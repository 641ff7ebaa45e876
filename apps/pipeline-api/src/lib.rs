//! Pipeline Architecture API
//!
//! Wiring for the user management service: shared state and the route tree.
//! Startup and shutdown live in the binary.

pub mod api;
pub mod server;
pub mod state;

pub use state::AppState;
