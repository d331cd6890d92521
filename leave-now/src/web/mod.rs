//! Control surface for the alert engine.
//!
//! Accepts position fixes and dismissals, and exposes the last cycle's
//! outcomes for diagnostics.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::create_router;
pub use state::{AppState, SharedGate};
