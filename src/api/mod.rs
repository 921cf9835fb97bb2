//! The remote store: a Google sheet with one tab per record category.
//!
//! `RemoteStore` is the seam between the sync logic and the network. `GoogleSheet` talks to the
//! Sheets API for reading and to an Apps Script web app for writing. `TestStore` keeps everything
//! in memory so that the whole program can run without touching Google.

mod google;
mod test_store;

use crate::model::{Category, Grid};
use crate::{Config, Result};

pub(crate) use test_store::TestStore;
#[cfg(test)]
pub(crate) use test_store::TestStoreState;

/// Reads and writes whole sheet tabs, one record category at a time.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// True when the identifiers and keys needed to read from the store are present.
    fn is_configured(&self) -> bool;

    /// Reads every row of the tab holding `category`, headers first.
    ///
    /// # Errors
    /// - `RemoteUnavailable` when the store cannot be reached, answers with an HTTP error or sends
    ///   a body we cannot understand.
    async fn fetch(&self, category: Category) -> Result<Grid>;

    /// Replaces the content of the tab holding `category` with `grid`.
    ///
    /// # Errors
    /// - `NotConfigured` when there is no write endpoint.
    /// - `RemoteUnavailable` when the store cannot be reached.
    /// - `RemoteRejected` when the store refuses the write.
    async fn write(&self, category: Category, grid: &Grid) -> Result<()>;
}

/// Determines which implementation of `RemoteStore` is used.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// Talk to Google.
    #[default]
    Google,
    /// Use the in-memory `TestStore`.
    Test,
}

/// When this environment variable is set to something non-empty we run in `Mode::Test`.
pub const TEST_MODE_ENV: &str = "BOOKS_IN_TEST_MODE";

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// Creates the `RemoteStore` for `config` according to `mode`.
pub fn store(config: &Config, mode: Mode) -> Result<Box<dyn RemoteStore>> {
    Ok(match mode {
        Mode::Google => Box::new(google::GoogleSheet::new(config.clone())?),
        Mode::Test => Box::new(TestStore::from_config(config)),
    })
}
