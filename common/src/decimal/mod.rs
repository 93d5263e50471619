//! Decimal type utilities for precise financial calculations

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Monetary amount with exact decimal precision
pub type Amount = Decimal;

/// Parse an amount from user input.
///
/// The value is kept exactly as written; input that `Decimal` cannot
/// represent is an error rather than a rounded value.
pub fn parse_amount(input: &str) -> crate::Result<Amount> {
    Ok(Decimal::from_str_exact(input.trim())?)
}
