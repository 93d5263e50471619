use std::sync::Arc;

use account_service::{AccountService, AccountServiceConfig};
use clap::{Parser, Subcommand};
use common::decimal::parse_amount;
use common::error::{Error, Result};
use common::model::account::Account;
use common::model::transfer::TransferRequest;
use dotenv::dotenv;
use futures::future::join_all;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Account Service CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Set the log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Commands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run concurrent transfers in both directions between two accounts
    Demo {
        /// Number of transfers in each direction
        #[arg(short, long, default_value_t = 1000)]
        transfers: usize,

        /// Amount moved by each transfer
        #[arg(short, long, default_value = "1")]
        amount: String,

        /// Print final account state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Seed accounts and perform a single transfer
    Transfer {
        /// Account to create, as id=balance (repeatable)
        #[arg(long = "account", value_name = "ID=BALANCE")]
        accounts: Vec<String>,

        /// Account to debit
        #[arg(long)]
        from: String,

        /// Account to credit
        #[arg(long)]
        to: String,

        /// Amount to move
        #[arg(long)]
        amount: String,
    },
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "account_service={level},transfer_ledger={level}",
            level = cli.log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AccountServiceConfig::from_env()?;
    info!(
        "Starting account service with notifications enabled: {}, transfer logging: {}",
        config.notifications_enabled, config.transfer_logging
    );
    let service = Arc::new(AccountService::with_config(&config));

    match cli.command {
        Commands::Demo { transfers, amount, json } => {
            run_demo(service, transfers, parse_amount(&amount)?, json).await?;
        }
        Commands::Transfer { accounts, from, to, amount } => {
            for entry in &accounts {
                let (id, balance) = parse_account_entry(entry)?;
                service.create_account(id, balance).await?;
            }

            let request = TransferRequest::new(from, to, parse_amount(&amount)?);
            match service.transfer(&request).await {
                Ok(_) => info!("Transfer completed"),
                Err(e) => {
                    error!("Transfer failed: {}", e);
                    return Err(e.into());
                }
            }

            for entry in &accounts {
                let (id, _) = parse_account_entry(entry)?;
                if let Some(account) = service.account_snapshot(id).await? {
                    println!("{} {}", account.id, account.balance);
                }
            }
        }
    }

    Ok(())
}

async fn run_demo(
    service: Arc<AccountService>,
    transfers: usize,
    amount: common::Amount,
    json: bool,
) -> Result<()> {
    const LEFT: &str = "Id-126";
    const RIGHT: &str = "Id-127";

    service.create_account(LEFT, common::dec!(1000)).await?;
    service.create_account(RIGHT, common::dec!(500)).await?;

    let tasks = (0..transfers * 2).map(|i| {
        let service = Arc::clone(&service);
        let (from, to) = if i % 2 == 0 { (LEFT, RIGHT) } else { (RIGHT, LEFT) };
        tokio::spawn(async move { service.transfer_amount(from, to, amount).await })
    });

    let mut completed = 0usize;
    let mut rejected = 0usize;
    for outcome in join_all(tasks).await {
        match outcome.map_err(|e| Error::Internal(format!("Transfer task failed: {}", e)))? {
            Ok(_) => completed += 1,
            Err(Error::InsufficientFunds { .. }) => rejected += 1,
            Err(e) => return Err(e),
        }
    }
    info!("Demo finished: {} transfers completed, {} rejected for insufficient funds", completed, rejected);

    let mut accounts: Vec<Account> = Vec::new();
    for id in [LEFT, RIGHT] {
        if let Some(account) = service.account_snapshot(id).await? {
            accounts.push(account);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
    } else {
        for account in &accounts {
            println!("{} {}", account.id, account.balance);
        }
    }

    Ok(())
}

fn parse_account_entry(entry: &str) -> Result<(&str, common::Amount)> {
    let (id, balance) = entry.split_once('=').ok_or_else(|| {
        Error::ValidationError(format!("Expected ID=BALANCE, got '{}'", entry))
    })?;
    Ok((id.trim(), parse_amount(balance)?))
}
