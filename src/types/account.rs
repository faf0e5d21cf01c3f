use crate::types::transaction::Transaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// main struct for modelling a bank account as the backend reports it
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Account {
    pub account: String,
    pub balance: f64,
    #[serde(default)]
    pub mine: bool,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Account {
    /// Date of the most recent transaction, if any.
    pub fn last_transaction_date(&self) -> Option<DateTime<Utc>> {
        self.transactions.iter().map(|t| t.date).max()
    }

    pub fn last_transaction(&self) -> Option<&Transaction> {
        self.transactions.iter().max_by_key(|t| t.date)
    }
}
