//! Checks applied to user input before anything is sent to the backend.

use crate::error::ValidationError;
use crate::types::currency::{Currency, CurrencyBalance};
use std::collections::BTreeMap;

pub const MIN_ACCOUNT_LEN: usize = 5;
pub const MIN_PASSWORD_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct TransferInput {
    pub to: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeInput {
    pub from: Currency,
    pub to: Currency,
    pub amount: f64,
}

fn parse_positive_amount(raw: &str) -> Result<f64, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("enter an amount".to_owned());
    }
    match raw.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err("amount must be a positive number".to_owned()),
    }
}

pub fn validate_transfer(to: &str, amount: &str) -> Result<TransferInput, ValidationError> {
    let mut errors = ValidationError::default();

    let to = to.trim();
    if to.is_empty() {
        errors.push("to", "enter the destination account");
    } else if to.chars().count() < MIN_ACCOUNT_LEN {
        errors.push("to", "account number is too short");
    }

    let amount = parse_positive_amount(amount).map_err(|message| errors.push("amount", message));

    match amount {
        Ok(amount) if errors.is_empty() => Ok(TransferInput {
            to: to.to_owned(),
            amount,
        }),
        _ => Err(errors),
    }
}

pub fn validate_login(login: &str, password: &str) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    if login.trim().is_empty() {
        errors.push("login", "enter a login");
    }
    if password.trim().is_empty() {
        errors.push("password", "enter a password");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push("password", "password must be at least 4 characters");
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn validate_exchange(
    from: &str,
    to: &str,
    amount: &str,
    balances: &BTreeMap<String, CurrencyBalance>,
) -> Result<ExchangeInput, ValidationError> {
    let mut errors = ValidationError::default();

    let from = Currency::parse(from);
    if from.is_none() {
        errors.push("from", "choose the currency to sell");
    }
    let to = Currency::parse(to);
    if to.is_none() {
        errors.push("to", "choose the currency to buy");
    }
    let amount = parse_positive_amount(amount).map_err(|message| errors.push("amount", message));

    let (Some(from), Some(to), Ok(amount)) = (from, to, amount) else {
        return Err(errors);
    };

    let available = balances.get(from.code()).map(|b| b.amount).unwrap_or(0.0);
    if amount > available {
        errors.push(
            "amount",
            format!("insufficient funds, available {}", from.format_amount(available)),
        );
        return Err(errors);
    }

    Ok(ExchangeInput { from, to, amount })
}
