use rusty_money::{crypto, iso, FormattableCurrency};
use serde::de::{self, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Currency {
    Iso(&'static iso::Currency),
    Crypto(&'static crypto::Currency),
    // codes the backend trades that rusty-money does not list, e.g. CNH
    Unlisted(String),
}

impl Currency {
    pub fn parse(code: &str) -> Option<Currency> {
        let code = code.trim().to_uppercase();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        if let Some(rmc) = iso::find(&code) {
            return Some(Currency::Iso(rmc));
        }
        if let Some(rmc) = crypto::find(&code) {
            return Some(Currency::Crypto(rmc));
        }
        Some(Currency::Unlisted(code))
    }

    pub fn code(&self) -> &str {
        match self {
            Currency::Iso(rmc) => rmc.code(),
            Currency::Crypto(rmc) => rmc.code(),
            Currency::Unlisted(code) => code,
        }
    }

    /// Number of fractional digits used when displaying amounts.
    pub fn exponent(&self) -> u32 {
        match self {
            Currency::Iso(rmc) => rmc.exponent(),
            Currency::Crypto(rmc) => rmc.exponent().min(8),
            Currency::Unlisted(_) => 2,
        }
    }

    pub fn format_amount(&self, amount: f64) -> String {
        format!("{:.*} {}", self.exponent() as usize, amount, self.code())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Currency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self.code())
    }
}

struct CurrencyVisitor;

impl<'de> Visitor<'de> for CurrencyVisitor {
    type Value = Currency;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an alphanumeric currency code")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Currency::parse(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(CurrencyVisitor)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CurrencyBalance {
    pub amount: f64,
    pub code: Currency,
}

/// One entry of the rate board, as pushed by the currency feed.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ExchangeRate {
    pub from: Currency,
    pub to: Currency,
    pub rate: f64,
    pub change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl ExchangeRate {
    pub fn trend(&self) -> Trend {
        if self.change > 0.0 {
            Trend::Up
        } else if self.change < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}
