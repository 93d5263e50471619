//! Domain models for the transfer ledger

pub mod account;
pub mod transfer;
