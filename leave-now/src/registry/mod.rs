//! Registered routes the engine monitors.
//!
//! The scheduler reads one snapshot of the active routes per cycle, so an
//! edit may take up to one cycle to be picked up.

mod error;
mod memory;

use std::future::Future;

use crate::domain::RegisteredRoute;

pub use error::RegistryError;
pub use memory::{MemoryRouteStore, RouteRegistration};

/// Read access to the user's registered routes.
pub trait RouteStore: Send + Sync {
    /// Snapshot of all active routes.
    fn list_active(&self) -> impl Future<Output = Result<Vec<RegisteredRoute>, RegistryError>> + Send;
}
