pub mod app;
pub mod classify;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod ledger;
pub mod output;
pub mod store;
pub mod walk;
