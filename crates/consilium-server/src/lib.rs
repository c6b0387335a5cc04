//! HTTP surface for the Consilium consultation gateway.

pub mod api;
pub mod state;

/// Router assembly.
pub use api::router;
/// Shared application state and startup wiring.
pub use state::{AppState, build_state};
