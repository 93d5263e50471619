//! Account models and related types

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
use crate::error::{Error, Result};

/// Account model
///
/// Carries no locking of its own. Concurrent access goes through a
/// [`SharedAccount`] handle and the locking discipline of the service that
/// owns the balance mutation.
///
/// Fields are public for serialization and reads. Code holding a
/// [`SharedAccount`] must not write `id` or `balance` directly: the id keys
/// the store and the lock order, and only the account service keeps
/// `balance >= 0` and conservation across a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account ID, immutable after creation
    pub id: String,
    /// Current balance, never negative
    pub balance: Amount,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last balance change timestamp
    pub updated_at: DateTime<Utc>,
}

/// Live handle to a stored account
pub type SharedAccount = Arc<Mutex<Account>>;

impl Account {
    /// Create a new account with an opening balance
    pub fn new(id: impl Into<String>, balance: Amount) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            balance,
            created_at: now,
            updated_at: now,
        }
    }

    /// Remove funds from the balance.
    ///
    /// The caller must already hold the account lock and have checked
    /// `balance >= amount`.
    pub fn debit(&mut self, amount: Amount) {
        self.balance -= amount;
        self.updated_at = Utc::now();
    }

    /// Add funds to the balance.
    ///
    /// Fails without touching the account when the result is not
    /// representable.
    pub fn credit(&mut self, amount: Amount) -> Result<()> {
        self.balance = self.balance.checked_add(amount).ok_or_else(|| Error::BalanceOverflow {
            account_id: self.id.clone(),
            amount,
        })?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Whether the balance covers `amount`
    pub fn can_cover(&self, amount: Amount) -> bool {
        self.balance >= amount
    }
}
