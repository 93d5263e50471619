//! Repository for account data

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::error::{Error, Result};
use common::model::account::{Account, SharedAccount};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

/// Account repository trait defining the interface for account data storage
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Store a new account, rejecting an id that already exists
    async fn create_account(&self, account: Account) -> Result<()>;

    /// Get a live handle to an account by ID
    async fn get_account(&self, id: &str) -> Result<Option<SharedAccount>>;

    /// Remove every account
    async fn clear_accounts(&self) -> Result<()>;

    /// Number of stored accounts
    async fn account_count(&self) -> Result<usize>;
}

/// In-memory repository for account data
///
/// Each account sits behind its own mutex so transfers on unrelated
/// accounts never contend. The map itself only guards its structure.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    /// Accounts by ID
    pub accounts: DashMap<String, SharedAccount>,
}

impl InMemoryAccountRepository {
    /// Create a new in-memory account repository
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create_account(&self, account: Account) -> Result<()> {
        // The entry holds the shard write lock, so check and insert are one step
        match self.accounts.entry(account.id.clone()) {
            Entry::Occupied(entry) => Err(Error::DuplicateAccountId(entry.key().clone())),
            Entry::Vacant(entry) => {
                debug!("Storing account {}", account.id);
                entry.insert(Arc::new(Mutex::new(account)));
                Ok(())
            }
        }
    }

    async fn get_account(&self, id: &str) -> Result<Option<SharedAccount>> {
        // Clone the handle out so no shard lock outlives this call
        Ok(self.accounts.get(id).map(|entry| Arc::clone(entry.value())))
    }

    async fn clear_accounts(&self) -> Result<()> {
        debug!("Clearing {} accounts", self.accounts.len());
        self.accounts.clear();
        Ok(())
    }

    async fn account_count(&self) -> Result<usize> {
        Ok(self.accounts.len())
    }
}
