mod api;
mod api_types;
mod error;
mod feed;
mod history;
mod http_utils;
#[cfg(test)]
mod mock_backend;
mod settings;
mod sort;
mod storage;
mod types;
mod validation;

use std::path::PathBuf;
use std::process::ExitCode;

use api::{BankApi, CurrencyBalances};
use api_types::AppStorage;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use error::ClientError;
use feed::{CurrencyFeed, RateBoard};
use history::{balance_history, monthly_flows, BalancePoint, HistoryWindow};
use rusty_money::iso;
use sort::{sort_accounts, SortBy};
use storage::Storage;
use tracing_subscriber::EnvFilter;
use types::account::Account;
use types::currency::{Currency, ExchangeRate, Trend};
use types::transaction::{page_transactions, Direction, Transaction, TransactionFilter};

const LATEST_TRANSACTIONS: usize = 10;
const TRANSACTIONS_PER_PAGE: usize = 25;
const CHART_WIDTH: f64 = 40.0;

#[derive(Parser, Debug)]
#[command(
    name = "tiny-bank",
    version,
    about = "Personal banking from the terminal",
    long_about = None
)]
struct Cli {
    /// TOML file overriding the built-in configuration
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and remember the access token
    Login {
        #[arg(short, long)]
        login: String,

        #[arg(short, long, env = "BANK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the access token
    Logout,
    /// List your accounts
    Accounts {
        #[arg(short, long, value_enum, default_value_t)]
        sort: SortBy,
    },
    /// Show an account with its recent balance and latest transactions
    Account { id: String },
    /// Detailed balance history, monthly flows and paged transactions
    History {
        id: String,

        #[arg(short, long, value_enum, default_value_t = HistoryWindow::TwelveMonths)]
        months: HistoryWindow,

        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Only transactions with this counterparty
        #[arg(long, value_name = "ACCOUNT")]
        with: Option<String>,

        /// Only transactions on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
    },
    /// Open a new account
    CreateAccount,
    /// Transfer funds between accounts
    Transfer {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long, allow_hyphen_values = true)]
        amount: String,
    },
    /// Recently used transfer destinations of an account
    Recent {
        account: String,

        /// Only destinations containing this text
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Currency balances and tradable currencies
    Currencies,
    /// Buy one currency with another
    Exchange {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long, allow_hyphen_values = true)]
        amount: String,
    },
    /// Watch live exchange rates
    Rates {
        /// Stop after this many updates
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Office and ATM locations
    Banks,
}

fn rub(amount: f64) -> String {
    Currency::Iso(iso::RUB).format_amount(amount)
}

/// One line of the account list; accounts owned by the user are starred.
fn account_row(account: &Account) -> String {
    let last = account
        .last_transaction()
        .map(|t| {
            let effect = t.effect_on(&account.account);
            format!("{} {}", t.date.format("%Y-%m-%d"), rub(effect))
        })
        .unwrap_or_else(|| "no transactions".to_owned());
    let owner = if account.mine { '*' } else { ' ' };
    format!(
        "{}{:<28} {:>18}   {}",
        owner,
        account.account,
        rub(account.balance),
        last
    )
}

fn print_accounts(accounts: &[Account], sort_by: SortBy) {
    println!("{} account(s), sorted {}", accounts.len(), sort_by.description());
    for account in accounts {
        println!("{}", account_row(account));
    }
}

fn print_chart(points: &[BalancePoint]) {
    if points.is_empty() {
        println!("Not enough data for a balance chart");
        return;
    }
    let max = points.iter().map(|p| p.balance).fold(0.0, f64::max);
    for point in points {
        let width = if max > 0.0 {
            (point.balance / max * CHART_WIDTH).round() as usize
        } else {
            0
        };
        println!("{:>9} {:>18} {}", point.label(), rub(point.balance), "#".repeat(width));
    }
}

fn print_transactions(account: &str, transactions: &[Transaction]) {
    if transactions.is_empty() {
        println!("No transactions");
        return;
    }
    for t in transactions {
        let (sign, arrow) = match t.direction_for(account) {
            Direction::Incoming => ('+', "from"),
            Direction::Outgoing => ('-', "to"),
            Direction::Internal | Direction::Unrelated => (' ', "with"),
        };
        println!(
            "{}  {}{:>16}  {} {}",
            t.date.format("%Y-%m-%d %H:%M"),
            sign,
            rub(t.amount),
            arrow,
            t.counterparty(account)
        );
    }
}

fn print_balances(balances: &CurrencyBalances) {
    let nonzero = balances
        .values()
        .filter(|b| b.amount > 0.0)
        .collect::<Vec<_>>();
    if nonzero.is_empty() {
        println!("No currency holdings");
    }
    for balance in nonzero {
        println!("  {}", balance.code.format_amount(balance.amount));
    }
}

fn print_rate(rate: &ExchangeRate) {
    let trend = match rate.trend() {
        Trend::Up => "▲",
        Trend::Down => "▼",
        Trend::Flat => "=",
    };
    println!("{}/{} {:>12.4} {}", rate.from, rate.to, rate.rate, trend);
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Index of the first transaction on a 1-based `page`; page 0 counts as 1.
fn page_offset(page: usize) -> usize {
    page.saturating_sub(1).saturating_mul(TRANSACTIONS_PER_PAGE)
}

async fn transfer<S: Storage>(
    api: &mut BankApi<S>,
    from: &str,
    to: &str,
    amount: &str,
) -> Result<String, ClientError> {
    let input = validation::validate_transfer(to, amount)?;
    let account = api.transfer_funds(from, &input.to, input.amount).await?;
    // Destination history is best effort once the funds have moved.
    if let Err(err) = api.storage_mut().remember_destination(from, &input.to).await {
        tracing::warn!("could not remember destination {}: {}", input.to, err);
    }
    Ok(format!(
        "Transferred {} to {}, balance now {}",
        rub(input.amount),
        input.to,
        rub(account.balance)
    ))
}

async fn watch_rates(feed_url: &str, count: Option<usize>) -> Result<(), ClientError> {
    let mut feed = CurrencyFeed::connect(feed_url).await?;
    let mut board = RateBoard::default();
    let mut received = 0;

    loop {
        if count.is_some_and(|limit| received >= limit) {
            break;
        }
        let next = tokio::select! {
            next = feed.next_rate() => next,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(rate) = next else {
            break;
        };
        let rate = rate?;
        print_rate(&rate);
        board.apply(rate);
        received += 1;
    }
    feed.close().await?;

    println!("Current rates ({} pairs):", board.len());
    for rate in board.rates() {
        print_rate(rate);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    let config = settings::ClientConfig::load(cli.config.as_deref())?;
    tracing::debug!("configuration loaded: {:?}", config);
    let storage = AppStorage::new(&config.storage.state_file);
    tracing::debug!("client state kept in {}", storage.path().display());
    let mut api = BankApi::new(&config.api, storage)?;
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::Login { login, password } => {
            validation::validate_login(&login, &password)?;
            api.login(login.trim(), &password).await?;
            println!("Logged in as {}", login.trim());
        }
        Commands::Logout => {
            api.logout().await?;
            println!("Logged out");
        }
        Commands::Accounts { sort } => {
            let accounts = api.accounts().await?;
            print_accounts(&sort_accounts(&accounts, sort), sort);
        }
        Commands::Account { id } => {
            let account = api.account(&id).await?;
            println!("Account {}", account.account);
            println!("Balance {}", rub(account.balance));
            println!();
            print_chart(&balance_history(&account, HistoryWindow::SixMonths, today));
            println!();
            println!("Latest transactions:");
            let latest = page_transactions(
                &account.account,
                &account.transactions,
                None,
                0,
                LATEST_TRANSACTIONS,
            );
            print_transactions(&account.account, &latest);
        }
        Commands::History {
            id,
            months,
            page,
            with,
            since,
        } => {
            let account = api.account(&id).await?;
            println!("Balance history of {}", account.account);
            print_chart(&balance_history(&account, months, today));
            println!();
            println!("Income / outcome per month:");
            for flow in monthly_flows(&account, months, today) {
                println!(
                    "{:>9} {:>16} in ({:>5.1}%) {:>16} out ({:>5.1}%)",
                    flow.month.format("%b %Y"),
                    rub(flow.income),
                    flow.income_share,
                    rub(flow.outcome),
                    flow.outcome_share
                );
            }
            println!();
            let filter = TransactionFilter {
                min_timestamp: since.map(start_of),
                max_timestamp: None,
                counterparties: with.map(|c| vec![c]),
            };
            let page = page.max(1);
            let transactions = page_transactions(
                &account.account,
                &account.transactions,
                Some(&filter),
                page_offset(page),
                TRANSACTIONS_PER_PAGE,
            );
            println!("Transactions, page {}:", page);
            print_transactions(&account.account, &transactions);
        }
        Commands::CreateAccount => {
            let account = api.create_account().await?;
            println!("Opened account {}", account.account);
        }
        Commands::Transfer { from, to, amount } => {
            println!("{}", transfer(&mut api, &from, &to, &amount).await?);
        }
        Commands::Recent { account, filter } => {
            let recent = api.storage().load_recent_destinations(&account).await?;
            for destination in storage::suggest(&recent, &filter) {
                println!("{}", destination);
            }
        }
        Commands::Currencies => {
            let all = api.all_currencies().await?;
            let balances = api.currencies().await?;
            println!("Your currencies:");
            print_balances(&balances);
            println!(
                "Tradable: {}",
                all.iter().map(|c| c.code()).collect::<Vec<_>>().join(", ")
            );
        }
        Commands::Exchange { from, to, amount } => {
            let balances = api.currencies().await?;
            let input = validation::validate_exchange(&from, &to, &amount, &balances)?;
            let updated = api
                .buy_currency(&input.from, &input.to, input.amount)
                .await?;
            println!(
                "Exchanged {} into {}",
                input.from.format_amount(input.amount),
                input.to
            );
            print_balances(&updated);
        }
        Commands::Rates { count } => {
            watch_rates(&config.api.feed_url, count).await?;
        }
        Commands::Banks => {
            for bank in api.banks().await? {
                println!("{:>10.5} {:>10.5}", bank.lat, bank.lon);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .compact();
    tracing_subscriber::fmt()
        .event_format(format)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:?}", err);
            eprintln!("{}", err.user_message());
            ExitCode::FAILURE
        }
    }
}
