//! These structs provide the CLI interface for the books CLI.

use crate::model::{Amount, InvoiceStatus};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// books: A command-line tool for keeping track of income, expenses and invoices.
///
/// Records are kept in a local database in your books home directory. Optionally they can be
/// synchronized with a Google sheet that has an Income, an Expenses and an Invoices tab. Reading
/// the sheet requires a Google API key. Writing to it requires an Apps Script web app deployed on
/// the sheet.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the books home directory, the configuration file and the database.
    ///
    /// This is the first command you should run. The Google sheet settings are optional, without
    /// them everything works locally and `sync` will tell you that it is not configured.
    Init(InitArgs),
    /// Merge the records of the Google sheet into the local records.
    Sync(SyncArgs),
    /// Add, change, remove or list income.
    Income(EntryArgs),
    /// Add, change, remove or list expenses.
    Expense(EntryArgs),
    /// Add, change, pay, remove or list invoices.
    Invoice(InvoiceArgs),
    /// Show this month's totals and the most recent transactions.
    Dashboard,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where books data and configuration is held. Defaults to ~/books
    #[arg(long, env = "BOOKS_HOME", default_value_t = default_books_home())]
    books_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, books_home: PathBuf) -> Self {
        Self {
            log_level,
            books_home: books_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn books_home(&self) -> &DisplayPath {
        &self.books_home
    }
}

/// (Not shown): Args for the `books init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL of your Google sheet, or just its id. The URL looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long, default_value = "")]
    sheet_url: String,

    /// A Google API key that can read the sheet.
    #[arg(long, default_value = "")]
    api_key: String,

    /// The URL of the Apps Script web app used to write to the sheet.
    #[arg(long)]
    web_app_url: Option<String>,
}

impl InitArgs {
    pub fn new(
        sheet_url: impl Into<String>,
        api_key: impl Into<String>,
        web_app_url: Option<String>,
    ) -> Self {
        Self {
            sheet_url: sheet_url.into(),
            api_key: api_key.into(),
            web_app_url,
        }
    }

    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn web_app_url(&self) -> Option<&str> {
        self.web_app_url.as_deref()
    }
}

/// (Not shown): Args for the `books sync` command.
#[derive(Debug, Parser, Clone)]
pub struct SyncArgs {
    /// After merging, overwrite the sheet with the merged records. Records deleted locally are
    /// only removed from the sheet this way.
    #[arg(long)]
    push: bool,
}

impl SyncArgs {
    pub fn new(push: bool) -> Self {
        Self { push }
    }

    pub fn push(&self) -> bool {
        self.push
    }
}

/// (Not shown): Args for the `books income` and `books expense` commands.
#[derive(Debug, Parser, Clone)]
pub struct EntryArgs {
    #[command(subcommand)]
    command: EntryCommand,
}

impl EntryArgs {
    pub fn new(command: EntryCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &EntryCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum EntryCommand {
    /// Add a record.
    Add(AddEntryArgs),
    /// Change some fields of a record.
    Update(UpdateEntryArgs),
    /// Remove a record.
    Delete(IdArgs),
    /// List the records, newest first.
    List,
}

/// (Not shown): Args for adding income or an expense.
#[derive(Debug, Parser, Clone)]
pub struct AddEntryArgs {
    /// The date, e.g. 2024-03-15. Defaults to today.
    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    description: String,

    /// One of the category labels in the config file.
    #[arg(long)]
    category: String,

    /// The amount, e.g. 12.50 or $1,200.00
    #[arg(long, allow_hyphen_values = true)]
    amount: Amount,
}

impl AddEntryArgs {
    pub fn new(
        date: Option<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        amount: Amount,
    ) -> Self {
        Self {
            date,
            description: description.into(),
            category: category.into(),
            amount,
        }
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }
}

/// (Not shown): Args for updating income or an expense. Only the given fields change.
#[derive(Debug, Parser, Clone, Default)]
pub struct UpdateEntryArgs {
    /// The id of the record, as shown by `list`.
    id: String,

    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    amount: Option<Amount>,
}

impl UpdateEntryArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }
}

/// (Not shown): Args for commands that address one record.
#[derive(Debug, Parser, Clone)]
pub struct IdArgs {
    /// The id of the record, as shown by `list`.
    id: String,
}

impl IdArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// (Not shown): Args for the `books invoice` command.
#[derive(Debug, Parser, Clone)]
pub struct InvoiceArgs {
    #[command(subcommand)]
    command: InvoiceCommand,
}

impl InvoiceArgs {
    pub fn new(command: InvoiceCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &InvoiceCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum InvoiceCommand {
    /// Create an invoice. It starts out pending.
    Add(AddInvoiceArgs),
    /// Change some fields of an invoice.
    Update(UpdateInvoiceArgs),
    /// Mark an invoice as paid.
    Pay(IdArgs),
    /// Remove an invoice.
    Delete(IdArgs),
    /// List the invoices, newest first. Pending invoices that are past due become overdue.
    List,
}

/// (Not shown): Args for creating an invoice.
#[derive(Debug, Parser, Clone)]
pub struct AddInvoiceArgs {
    #[arg(long)]
    client: String,

    #[arg(long, allow_hyphen_values = true)]
    amount: Amount,

    /// The invoice number. Defaults to the next INV-NNN.
    #[arg(long)]
    number: Option<String>,

    /// The invoice date. Defaults to today.
    #[arg(long)]
    date: Option<String>,

    /// The due date. Defaults to 30 days after the invoice date.
    #[arg(long)]
    due_date: Option<String>,
}

impl AddInvoiceArgs {
    pub fn new(client: impl Into<String>, amount: Amount) -> Self {
        Self {
            client: client.into(),
            amount,
            number: None,
            date: None,
            due_date: None,
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn number(&self) -> Option<&str> {
        self.number.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn due_date(&self) -> Option<&str> {
        self.due_date.as_deref()
    }
}

/// (Not shown): Args for updating an invoice. Only the given fields change.
#[derive(Debug, Parser, Clone, Default)]
pub struct UpdateInvoiceArgs {
    /// The id of the invoice, as shown by `list`.
    id: String,

    #[arg(long)]
    number: Option<String>,

    #[arg(long)]
    client: Option<String>,

    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    due_date: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    amount: Option<Amount>,

    /// pending, paid or overdue. A paid invoice cannot go back to pending or overdue.
    #[arg(long)]
    status: Option<InvoiceStatus>,
}

impl UpdateInvoiceArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn number(&self) -> Option<&str> {
        self.number.as_deref()
    }

    pub fn client(&self) -> Option<&str> {
        self.client.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn due_date(&self) -> Option<&str> {
        self.due_date.as_deref()
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }

    pub fn status(&self) -> Option<InvoiceStatus> {
        self.status
    }
}

fn default_books_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("books"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --books-home or BOOKS_HOME instead of relying on the default \
                books home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("books")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry_add() {
        let args = Args::try_parse_from([
            "books",
            "--books-home",
            "/tmp/books",
            "expense",
            "add",
            "--description",
            "Paper",
            "--category",
            "Office Supplies",
            "--amount",
            "$1,200.50",
        ])
        .unwrap();
        assert_eq!(args.common().books_home().path(), Path::new("/tmp/books"));
        let Command::Expense(entry) = args.command() else {
            panic!("expected the expense command");
        };
        let EntryCommand::Add(add) = entry.command() else {
            panic!("expected add");
        };
        assert_eq!(add.amount(), Amount::new(1200.5));
        assert_eq!(add.date(), None);
    }

    #[test]
    fn test_parse_invoice_update_status() {
        let args = Args::try_parse_from([
            "books", "invoice", "update", "abc-1", "--status", "paid", "--amount", "-5",
        ])
        .unwrap();
        let Command::Invoice(invoice) = args.command() else {
            panic!("expected the invoice command");
        };
        let InvoiceCommand::Update(update) = invoice.command() else {
            panic!("expected update");
        };
        assert_eq!(update.id(), "abc-1");
        assert_eq!(update.status(), Some(InvoiceStatus::Paid));
        assert_eq!(update.amount(), Some(Amount::new(-5.0)));
    }

    #[test]
    fn test_parse_bad_amount() {
        let result = Args::try_parse_from([
            "books", "income", "add", "--description", "x", "--category", "Sales", "--amount",
            "lots",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_sync_push() {
        let args = Args::try_parse_from(["books", "--log-level", "debug", "sync", "--push"]).unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        let Command::Sync(sync) = args.command() else {
            panic!("expected sync");
        };
        assert!(sync.push());
    }
}
