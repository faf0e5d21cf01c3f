//! Balance history reconstructed from an account's current balance and its
//! transactions, plus monthly income/outcome totals for the same window.

use crate::types::account::Account;
use crate::types::transaction::{Direction, Transaction};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum HistoryWindow {
    #[default]
    #[value(name = "6")]
    SixMonths,
    #[value(name = "12")]
    TwelveMonths,
}

impl HistoryWindow {
    pub fn months(self) -> u32 {
        match self {
            HistoryWindow::SixMonths => 6,
            HistoryWindow::TwelveMonths => 12,
        }
    }
}

/// Balance as of the first instant of `month`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancePoint {
    pub month: NaiveDate,
    pub balance: f64,
}

impl BalancePoint {
    pub fn label(&self) -> String {
        self.month.format("%b %Y").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyFlow {
    pub month: NaiveDate,
    pub income: f64,
    pub outcome: f64,
    pub total: f64,
    pub income_share: f64,
    pub outcome_share: f64,
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

fn month_start_utc(month: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&month.and_time(NaiveTime::MIN))
}

/// First days of the trailing months ending with the month of `today`, oldest first.
pub fn window_months(window: HistoryWindow, today: NaiveDate) -> Vec<NaiveDate> {
    let current = first_of_month(today);
    (0..window.months())
        .rev()
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .collect()
}

pub fn balance_history(
    account: &Account,
    window: HistoryWindow,
    today: NaiveDate,
) -> Vec<BalancePoint> {
    if account.transactions.is_empty() {
        return Vec::new();
    }

    let mut newest_first: Vec<&Transaction> = account.transactions.iter().collect();
    newest_first.sort_by(|a, b| b.date.cmp(&a.date));
    let mut pending = newest_first.into_iter().peekable();

    let mut running = account.balance;
    let mut points = window_months(window, today)
        .into_iter()
        .rev()
        .map(|month| {
            let start = month_start_utc(month);
            while let Some(t) = pending.next_if(|t| t.date >= start) {
                running -= t.effect_on(&account.account);
            }
            BalancePoint {
                month,
                balance: running.max(0.0),
            }
        })
        .collect::<Vec<_>>();
    points.reverse();
    points
}

pub fn monthly_flows(
    account: &Account,
    window: HistoryWindow,
    today: NaiveDate,
) -> Vec<MonthlyFlow> {
    if account.transactions.is_empty() {
        return Vec::new();
    }

    let months = window_months(window, today);
    let mut totals: HashMap<NaiveDate, (f64, f64)> =
        months.iter().map(|m| (*m, (0.0, 0.0))).collect();

    for t in &account.transactions {
        let Some(entry) = totals.get_mut(&first_of_month(t.date.date_naive())) else {
            continue;
        };
        match t.direction_for(&account.account) {
            Direction::Incoming => entry.0 += t.amount,
            Direction::Outgoing => entry.1 += t.amount,
            Direction::Internal | Direction::Unrelated => {}
        }
    }

    months
        .into_iter()
        .map(|month| {
            let (income, outcome) = totals.get(&month).copied().unwrap_or_default();
            let total = income + outcome;
            let share = |part: f64| if total > 0.0 { part / total * 100.0 } else { 0.0 };
            MonthlyFlow {
                month,
                income,
                outcome,
                total,
                income_share: share(income),
                outcome_share: share(outcome),
            }
        })
        .collect()
}
