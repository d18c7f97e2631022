pub mod advice;
pub mod catalog;
pub mod cli;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod identity;
pub mod ledger;
mod migrations;
pub mod onboarding;
pub mod persistence;
pub mod regulation;
pub mod sensory_scan;
pub mod session;
pub mod status;
pub mod types;

#[cfg(test)]
mod test_support;

pub use cli::run;
