pub mod config;
pub mod engine;
pub mod error;
pub mod feeds;
pub mod ledger;
pub mod models;
