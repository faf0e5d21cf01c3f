use crate::error::ApiError;
use crate::storage;
use crate::types::currency::Currency;
use serde::{Deserialize, Serialize};

// can be adjusted to keep client state somewhere else
pub type AppStorage = storage::FileStorage;

/// Envelope wrapping every backend response.
#[derive(Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub payload: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self, path: &str) -> Result<T, ApiError> {
        if let Some(error) = self.error.filter(|e| !e.is_empty()) {
            return Err(ApiError::Rejected(error));
        }
        self.payload
            .ok_or_else(|| ApiError::MissingPayload(path.to_owned()))
    }
}

pub struct Auth {
    pub token: String,
}

impl Auth {
    pub fn header_value(&self) -> String {
        format!("Basic {}", self.token)
    }
}

#[derive(Serialize, Debug)]
pub struct LoginRequest<'a> {
    pub login: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
    pub token: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct TransferRequest<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub amount: f64,
}

#[derive(Serialize, Debug)]
pub struct CurrencyBuyRequest<'a> {
    pub from: &'a Currency,
    pub to: &'a Currency,
    pub amount: f64,
}
