//! books-sync keeps income, expenses and invoices in a local SQLite database and synchronizes them
//! with a Google sheet.
//!
//! The pieces, from the bottom up:
//! - `model`: the record types and the `Grid` exchanged with the sheet
//! - `codec`: converts between a `Grid` and records
//! - `RemoteStore`: reads and writes one tab of the sheet
//! - `reconcile`: merges remote records into local ones without duplicating them
//! - `sync`: runs fetch, decode, merge and store for every category

mod api;
pub mod args;
pub mod codec;
pub mod commands;
mod config;
pub mod dashboard;
mod db;
mod error;
pub mod ledger;
pub mod model;
pub mod reconcile;
pub mod sync;
mod utils;


pub use api::{store, Mode, RemoteStore, TEST_MODE_ENV};
pub use config::{Config, RemoteSettings};
pub use error::{Error, ErrorType, Result};
