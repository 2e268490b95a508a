//! Core storage and aggregation for the desk/bag hierarchy.
//!
//! The desk and every bag interior are the same kind of storage location.
//! Items and bags move in O(1) between the desk and a bag lying on it, each
//! location keeps a live nested item count, and `Desk::invert` swaps the
//! desk with a bag's interior in O(1) by exchanging location identities.

pub mod config;
pub mod logging;
pub mod model;
pub mod service;
mod store;

pub use config::{ConfigError, DeskConfig, LoggingConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::handle::{BagId, BagRef, EntityKind, EntityRef, Epoch, ItemRef, Placement};
pub use service::audit::AuditReport;
pub use service::desk_service::{Contents, Desk};
pub use service::error::{DeskError, DeskResult};
pub use service::snapshot::{BagSnapshot, DeskSnapshot};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
