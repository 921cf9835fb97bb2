//! Command handlers for the books CLI.
//!
//! Each handler loads what it needs from the books home, does its work and returns an `Out`.

mod dashboard;
mod entries;
mod init;
mod invoices;
mod sync;

use crate::error::{Error, ErrorType, IntoResult};
use crate::ledger::Ledger;
use crate::model::Category;
use crate::{utils, Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use dashboard::dashboard;
pub use entries::{add_entry, delete_entry, list_entries, update_entry};
pub use init::init;
pub use invoices::{add_invoice, delete_invoice, list_invoices, pay_invoice, update_invoice};
pub use sync::{sync, SyncOut};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

async fn load_ledger(config: &Config) -> Result<Ledger> {
    config
        .db()
        .load_ledger()
        .await
        .pub_result(ErrorType::Database)
}

/// Stores the `category` collection of `ledger` in the database.
async fn save(config: &Config, ledger: &Ledger, category: Category) -> Result<()> {
    config
        .db()
        .replace(category, ledger.records(category))
        .await
        .pub_result(ErrorType::Database)
        .map_err(|e| e.in_category(category))
}

/// Validates a date given on the command line and returns it as `YYYY-MM-DD`.
fn date_arg(date: &str) -> Result<String> {
    match utils::parse_date(date) {
        Some(d) => Ok(utils::format_date(d)),
        None => Err(Error::msg(
            ErrorType::Request,
            format!("'{date}' is not a date, use YYYY-MM-DD"),
        )),
    }
}

/// Finds `label` among the configured labels of `category`, ignoring case, and returns the label
/// as configured.
fn label_arg(config: &Config, category: Category, label: &str) -> Result<String> {
    let labels = config.labels(category);
    labels
        .iter()
        .find(|l| l.eq_ignore_ascii_case(label.trim()))
        .cloned()
        .ok_or_else(|| {
            Error::msg(
                ErrorType::Request,
                format!(
                    "'{label}' is not a {category} category, use one of: {}",
                    labels.join(", ")
                ),
            )
        })
}
