//! Account service for managing accounts and transferring funds between them

pub mod service;
pub mod repository;
pub mod notification;
pub mod config;

pub use service::AccountService;
pub use repository::{AccountRepository, InMemoryAccountRepository};
pub use notification::{LoggingNotificationService, NoopNotificationService, NotificationService};
pub use config::AccountServiceConfig;
