use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Transaction {
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub from: String,
    pub to: String,
}

/// How a transaction moves money relative to one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Incoming,
    Outgoing,
    // transfer from an account to itself, no effect on the balance
    Internal,
    Unrelated,
}

impl Transaction {
    pub fn direction_for(&self, account: &str) -> Direction {
        match (self.from == account, self.to == account) {
            (true, true) => Direction::Internal,
            (false, true) => Direction::Incoming,
            (true, false) => Direction::Outgoing,
            (false, false) => Direction::Unrelated,
        }
    }

    /// Signed effect of this transaction on the balance of `account`.
    pub fn effect_on(&self, account: &str) -> f64 {
        match self.direction_for(account) {
            Direction::Incoming => self.amount,
            Direction::Outgoing => -self.amount,
            Direction::Internal | Direction::Unrelated => 0.0,
        }
    }

    pub fn counterparty(&self, account: &str) -> &str {
        if self.from == account {
            &self.to
        } else {
            &self.from
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct TransactionFilter {
    pub min_timestamp: Option<DateTime<Utc>>,
    pub max_timestamp: Option<DateTime<Utc>>,
    pub counterparties: Option<Vec<String>>,
}

impl TransactionFilter {
    pub fn matches(&self, account: &str, t: &Transaction) -> bool {
        if let Some(min_dt) = self.min_timestamp {
            if t.date < min_dt {
                return false;
            }
        }
        if let Some(max_dt) = self.max_timestamp {
            if t.date > max_dt {
                return false;
            }
        }
        if let Some(counterparties) = &self.counterparties {
            if !counterparties.iter().any(|c| c == t.counterparty(account)) {
                return false;
            }
        }
        true
    }
}

/// Newest-first page of an account's transactions.
pub fn page_transactions(
    account: &str,
    transactions: &[Transaction],
    filter: Option<&TransactionFilter>,
    offset: usize,
    count: usize,
) -> Vec<Transaction> {
    let default_filter = TransactionFilter::default();
    let tf = filter.unwrap_or(&default_filter);
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
        .into_iter()
        .filter(|t| tf.matches(account, t))
        .skip(offset)
        .take(count)
        .cloned()
        .collect()
}
