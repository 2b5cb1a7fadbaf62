//! Album stack: a keyed table exposed through a gateway via fixed
//! request/response templates, plus local emulators for both services.

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod manifest;
pub mod mapping;
pub mod model;
pub mod native;
pub mod service;
pub mod store;

pub use config::{ConfigError, StackConfig};
pub use gateway::{Gateway, GatewayRequest, GatewayResponse, LogTelemetrySink, MemoryTelemetrySink};
pub use logging::{
    default_log_level, flush_logging, init_logging, init_stderr_logging, logging_status,
};
pub use manifest::{ManifestValidationError, StackManifest};
pub use model::album::{Album, AlbumKey, AlbumValidationError, Track};
pub use service::album_service::{AlbumService, AlbumServiceError};
pub use store::{SqliteTableStore, StoreError, TableKeySchema, TableStore};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
