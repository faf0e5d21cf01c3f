use serde::{Deserialize, Serialize};

/// Office or ATM location.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Bank {
    pub lat: f64,
    pub lon: f64,
}
