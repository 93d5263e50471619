//! Error types for the transfer ledger
//!
//! This module provides the unified error handling system shared by the
//! account store, the transfer service and anything built on top of them.
//! Every variant is recoverable: errors are returned to the immediate caller
//! and never logged or retried by the core.

use std::fmt::Display;
use thiserror::Error;

use crate::decimal::Amount;

/// Ledger error type
#[derive(Debug, Error)]
pub enum Error {
    /// An account with the same id is already stored
    #[error("Account id {0} already exists!")]
    DuplicateAccountId(String),

    /// Account id is missing, empty, or does not resolve to a stored account
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    /// Transfer amount is missing, zero, or negative
    #[error("Invalid transfer amount: {0}")]
    InvalidTransferAmount(String),

    /// The debited account cannot cover the requested amount
    #[error("Available balance is less than amount to transfer: {requested}")]
    InsufficientFunds {
        account_id: String,
        requested: Amount,
        available: Amount,
    },

    /// Crediting the account would exceed the representable balance
    #[error("Crediting {amount} would overflow the balance of account {account_id}")]
    BalanceOverflow {
        account_id: String,
        amount: Amount,
    },

    /// Generic validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),
}

impl Error {
    /// Amount still missing for an insufficient funds failure
    pub fn shortfall(&self) -> Option<Amount> {
        match self {
            Error::InsufficientFunds { requested, available, .. } => Some(*requested - *available),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::InvalidAccount(msg) => Error::InvalidAccount(format!("{}: {}", context, msg)),
                Error::InvalidTransferAmount(msg) => Error::InvalidTransferAmount(format!("{}: {}", context, msg)),
                Error::ValidationError(msg) => Error::ValidationError(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
                // Structured variants keep their exact caller-facing message
                e @ Error::DuplicateAccountId(_) => e,
                e @ Error::InsufficientFunds { .. } => e,
                e @ Error::BalanceOverflow { .. } => e,
                Error::Serialization(e) => Error::Serialization(e),
            }
        })
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::DecimalError(err.to_string())
    }
}
