//! Transfer request model

use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
use crate::error::{Error, Result};

/// Request to move funds between two accounts.
///
/// Fields are optional so an external request layer can deserialize an
/// incomplete body and have it rejected with the proper error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Account to debit
    pub from_id: Option<String>,
    /// Account to credit
    pub to_id: Option<String>,
    /// Amount to move
    pub amount: Option<Amount>,
}

/// A request that passed the shape checks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedTransfer<'a> {
    pub from_id: &'a str,
    pub to_id: &'a str,
    pub amount: Amount,
}

impl TransferRequest {
    /// Create a complete transfer request
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>, amount: Amount) -> Self {
        Self {
            from_id: Some(from_id.into()),
            to_id: Some(to_id.into()),
            amount: Some(amount),
        }
    }

    /// Check presence of both ids and a strictly positive amount.
    ///
    /// Checks run in order and the first failure is returned.
    pub fn validate(&self) -> Result<ValidatedTransfer<'_>> {
        let from_id = match self.from_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => return Err(Error::InvalidAccount("from account invalid".to_string())),
        };

        let to_id = match self.to_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => return Err(Error::InvalidAccount("to account invalid".to_string())),
        };

        let amount = match self.amount {
            Some(amount) if amount > Amount::ZERO => amount,
            Some(amount) => {
                return Err(Error::InvalidTransferAmount(format!(
                    "amount must be positive, got {}",
                    amount
                )))
            }
            None => return Err(Error::InvalidTransferAmount("amount is required".to_string())),
        };

        Ok(ValidatedTransfer { from_id, to_id, amount })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::dec;

    #[test]
    fn test_valid_request() {
        let request = TransferRequest::new("Id-126", "Id-127", dec!(500));
        let validated = request.validate().unwrap();
        assert_eq!(validated.from_id, "Id-126");
        assert_eq!(validated.to_id, "Id-127");
        assert_eq!(validated.amount, dec!(500));
    }

    #[test]
    fn test_first_failed_check_wins() {
        // Everything is wrong, the from account is reported
        let request = TransferRequest::default();
        match request.validate() {
            Err(Error::InvalidAccount(msg)) => assert_eq!(msg, "from account invalid"),
            other => panic!("Expected InvalidAccount, got {:?}", other),
        }

        let request = TransferRequest {
            from_id: Some("Id-126".to_string()),
            to_id: Some(String::new()),
            amount: None,
        };
        match request.validate() {
            Err(Error::InvalidAccount(msg)) => assert_eq!(msg, "to account invalid"),
            other => panic!("Expected InvalidAccount, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_positive_amounts() {
        for amount in [None, Some(dec!(0)), Some(dec!(-1))] {
            let request = TransferRequest {
                from_id: Some("a".to_string()),
                to_id: Some("b".to_string()),
                amount,
            };
            assert!(matches!(request.validate(), Err(Error::InvalidTransferAmount(_))));
        }
    }

    #[test]
    fn test_deserialize_partial_body() {
        let request: TransferRequest =
            serde_json::from_str(r#"{"from_id":"Id-126","amount":"12.50"}"#).unwrap();
        assert_eq!(request.to_id, None);
        assert_eq!(request.amount, Some(dec!(12.50)));
    }
}
