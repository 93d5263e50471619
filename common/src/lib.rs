//! Common types and utilities for the transfer ledger
//!
//! This library contains the shared types used by the account service and
//! anything layered on top of it: the unified error type, decimal aliases
//! for exact money arithmetic, and the domain models.

pub mod error;
pub mod model;
pub mod decimal;

/// Re-export important types
pub use error::{Error, Result, ErrorExt};
pub use decimal::*;
