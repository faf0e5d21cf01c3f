use crate::types::account::Account;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortBy {
    #[default]
    Number,
    Balance,
    Transaction,
}

impl SortBy {
    pub fn description(self) -> &'static str {
        match self {
            SortBy::Number => "by account number",
            SortBy::Balance => "by balance (highest first)",
            SortBy::Transaction => "by last transaction date (newest first)",
        }
    }
}

pub fn sort_accounts(accounts: &[Account], sort_by: SortBy) -> Vec<Account> {
    let mut sorted = accounts.to_vec();
    match sort_by {
        SortBy::Number => sorted.sort_by(|a, b| a.account.cmp(&b.account)),
        SortBy::Balance => sorted.sort_by(|a, b| {
            b.balance
                .partial_cmp(&a.balance)
                .unwrap_or(Ordering::Equal)
        }),
        SortBy::Transaction => sorted.sort_by(|a, b| {
            match (a.last_transaction_date(), b.last_transaction_date()) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a_date), Some(b_date)) => b_date.cmp(&a_date),
            }
        }),
    }
    sorted
}
