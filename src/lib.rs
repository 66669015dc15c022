pub mod admin;
pub mod auth;
pub mod cache;
pub mod config;
pub mod consume;
pub mod error;
pub mod export;
pub mod ledger;
pub mod movement;
pub mod part;
pub mod report;
pub mod service;
pub mod status;
pub mod store;
pub mod types;
pub mod utils;

pub use error::{LedgerError, Result};
pub use service::Inventory;
