pub mod account;
pub mod bank;
pub mod currency;
pub mod transaction;
