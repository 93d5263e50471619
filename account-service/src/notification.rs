//! Notifications sent to account holders after a transfer

use async_trait::async_trait;
use common::error::Result;
use common::model::account::Account;
use tracing::info;

/// Delivers transfer notices to account holders.
///
/// Called once for the debited and once for the credited account of every
/// successful transfer. Delivery is best-effort: an error here never undoes
/// a committed transfer.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Notify the holder of `account` with a human-readable message
    async fn notify_about_transfer(&self, account: &Account, message: &str) -> Result<()>;
}

/// Writes every notification to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotificationService;

#[async_trait]
impl NotificationService for LoggingNotificationService {
    async fn notify_about_transfer(&self, account: &Account, message: &str) -> Result<()> {
        info!(account_id = %account.id, "Sending notification: {}", message);
        Ok(())
    }
}

/// Drops every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotificationService;

#[async_trait]
impl NotificationService for NoopNotificationService {
    async fn notify_about_transfer(&self, _account: &Account, _message: &str) -> Result<()> {
        Ok(())
    }
}
