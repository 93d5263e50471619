//! Account service implementation
//!
//! Owns the transfer algorithm. A transfer is validated, both accounts are
//! resolved, then their mutexes are taken in ascending id order so that two
//! transfers over the same pair can never wait on each other in a cycle.
//! Funds are checked and moved while both locks are held; notifications go
//! out only after the locks are released.

use std::sync::{Arc, MutexGuard, PoisonError};

use common::decimal::Amount;
use common::error::{Error, ErrorExt, Result};
use common::model::account::{Account, SharedAccount};
use common::model::transfer::{TransferRequest, ValidatedTransfer};
use tracing::{debug, info, warn};

use crate::config::AccountServiceConfig;
use crate::notification::{LoggingNotificationService, NoopNotificationService, NotificationService};
use crate::repository::{AccountRepository, InMemoryAccountRepository};

/// Account service for managing accounts and transfers between them
pub struct AccountService {
    /// Repository for account data
    repo: Arc<dyn AccountRepository>,
    /// Receives debit and credit notices
    notifier: Arc<dyn NotificationService>,
    /// Log completed transfers at info level
    transfer_logging: bool,
}

impl Default for AccountService {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountService {
    /// Create a new account service backed by an in-memory repository
    pub fn new() -> Self {
        Self::with_notifier(Arc::new(LoggingNotificationService))
    }

    /// Create a new account service with a specific notifier
    pub fn with_notifier(notifier: Arc<dyn NotificationService>) -> Self {
        Self::with_repository(Arc::new(InMemoryAccountRepository::new()), notifier)
    }

    /// Create a new account service from its collaborators
    pub fn with_repository(
        repo: Arc<dyn AccountRepository>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            repo,
            notifier,
            transfer_logging: false,
        }
    }

    /// Create a new account service with a configuration
    pub fn with_config(config: &AccountServiceConfig) -> Self {
        let notifier: Arc<dyn NotificationService> = if config.notifications_enabled {
            Arc::new(LoggingNotificationService)
        } else {
            Arc::new(NoopNotificationService)
        };

        Self {
            transfer_logging: config.transfer_logging,
            ..Self::with_notifier(notifier)
        }
    }

    /// Create a new account with an opening balance
    pub async fn create_account(&self, id: &str, initial_balance: Amount) -> Result<bool> {
        if id.is_empty() {
            return Err(Error::InvalidAccount("account id must not be empty".to_string()));
        }
        if initial_balance < Amount::ZERO {
            return Err(Error::ValidationError(format!(
                "Initial balance for account {} must not be negative, got {}",
                id, initial_balance
            )));
        }

        self.repo.create_account(Account::new(id, initial_balance)).await?;
        info!("Created account {} with balance {}", id, initial_balance);
        Ok(true)
    }

    /// Get a live handle to an account by ID
    pub async fn get_account(&self, id: &str) -> Result<Option<SharedAccount>> {
        self.repo.get_account(id).await
    }

    /// Copy of an account taken under its lock
    pub async fn account_snapshot(&self, id: &str) -> Result<Option<Account>> {
        let snapshot = match self.repo.get_account(id).await? {
            Some(account) => {
                let guard = lock_account(&account);
                Some(guard.clone())
            }
            None => None,
        };
        Ok(snapshot)
    }

    /// Remove every account
    pub async fn clear_accounts(&self) -> Result<()> {
        self.repo.clear_accounts().await
    }

    /// Number of stored accounts
    pub async fn account_count(&self) -> Result<usize> {
        self.repo.account_count().await
    }

    /// Move `amount` from one account to another
    pub async fn transfer_amount(&self, from_id: &str, to_id: &str, amount: Amount) -> Result<bool> {
        self.transfer(&TransferRequest::new(from_id, to_id, amount)).await
    }

    /// Execute a transfer request.
    ///
    /// Every failure happens before any balance is touched. Once both
    /// accounts are locked and the funds check passes, the transfer commits
    /// and notification problems are only reported.
    pub async fn transfer(&self, request: &TransferRequest) -> Result<bool> {
        let ValidatedTransfer { from_id, to_id, amount } = request.validate()?;

        let from = self.resolve(from_id, "from").await?;
        let to = self.resolve(to_id, "to").await?;

        debug!("Locking accounts {} and {} for transfer of {}", from_id, to_id, amount);
        let (debited, credited) = commit_transfer((from_id, &from), (to_id, &to), amount)?;

        if self.transfer_logging {
            info!("Transferred {} from {} to {}", amount, from_id, to_id);
        } else {
            debug!("Transferred {} from {} to {}", amount, from_id, to_id);
        }

        self.notify(&debited, format!("Account {} debited with amount {}", from_id, amount))
            .await;
        self.notify(&credited, format!("Account {} credited with amount {}", to_id, amount))
            .await;

        Ok(true)
    }

    async fn resolve(&self, id: &str, side: &str) -> Result<SharedAccount> {
        self.repo
            .get_account(id)
            .await
            .with_context(|| format!("Failed to retrieve {} account {}", side, id))?
            .ok_or_else(|| Error::InvalidAccount(format!("{} account {} does not exist", side, id)))
    }

    async fn notify(&self, account: &Account, message: String) {
        if let Err(e) = self.notifier.notify_about_transfer(account, &message).await {
            warn!(account_id = %account.id, "Failed to deliver notification '{}': {}", message, e);
        }
    }
}

/// Lock an account, recovering from poisoning.
///
/// Transfers fail only before any mutation and the final debit is an
/// infallible subtraction of a covered amount, so a poisoned guard still
/// protects a consistent balance.
fn lock_account(account: &SharedAccount) -> MutexGuard<'_, Account> {
    account.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Check and move funds with both accounts locked.
///
/// Locks are taken in ascending id order whatever the direction. The credit
/// is applied first so an overflowing destination fails the transfer before
/// anything changes. Returns snapshots of the debited and credited accounts
/// as of the commit.
fn commit_transfer(
    (from_id, from): (&str, &SharedAccount),
    (to_id, to): (&str, &SharedAccount),
    amount: Amount,
) -> Result<(Account, Account)> {
    if Arc::ptr_eq(from, to) {
        let account = lock_account(from);
        check_funds(&account, amount)?;
        // Debit and credit cancel out on a single account
        let snapshot = account.clone();
        return Ok((snapshot.clone(), snapshot));
    }

    // Ids are unique in the store; the address only breaks ties for handles
    // left over from a cleared store
    let from_first = (from_id, Arc::as_ptr(from) as usize) < (to_id, Arc::as_ptr(to) as usize);
    let (mut from_guard, mut to_guard) = if from_first {
        let from_guard = lock_account(from);
        let to_guard = lock_account(to);
        (from_guard, to_guard)
    } else {
        let to_guard = lock_account(to);
        let from_guard = lock_account(from);
        (from_guard, to_guard)
    };

    check_funds(&from_guard, amount)?;

    to_guard.credit(amount)?;
    from_guard.debit(amount);

    Ok((from_guard.clone(), to_guard.clone()))
}

fn check_funds(account: &Account, amount: Amount) -> Result<()> {
    if account.can_cover(amount) {
        Ok(())
    } else {
        Err(Error::InsufficientFunds {
            account_id: account.id.clone(),
            requested: amount,
            available: account.balance,
        })
    }
}
