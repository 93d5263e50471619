//! Metapackage tying the workspace crates together for integration tests

pub use account_service;
pub use common;
