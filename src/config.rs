//! Configuration file handling.
//!
//! The configuration file is stored at `$BOOKS_HOME/config.json` and holds the Google Sheet
//! settings, the names of the sheet tabs, the category labels offered for income and expenses and
//! the time of the last successful sync.

use crate::db::Db;
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::Category;
use crate::{utils, Result};
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "books";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const BOOKS_SQLITE: &str = "books.sqlite";

const DEFAULT_INCOME_CATEGORIES: &[&str] = &["Sales", "Services", "Interest", "Investment", "Other"];

const DEFAULT_EXPENSE_CATEGORIES: &[&str] = &[
    "Office Supplies",
    "Utilities",
    "Rent",
    "Salaries",
    "Marketing",
    "Travel",
    "Software",
    "Other",
];

/// The remote store settings given to `books init`.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct RemoteSettings {
    /// A Google Sheets URL or a bare spreadsheet id. May be empty.
    pub sheet_url: String,
    /// The Google API key used for reading. May be empty.
    pub api_key: String,
    /// The URL of the Apps Script web app used for writing.
    pub web_app_url: Option<String>,
}

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$BOOKS_HOME` and from there it loads `$BOOKS_HOME/config.json` and opens the
/// database.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    spreadsheet_id: String,
    sqlite_path: PathBuf,
}

impl Config {
    /// Creates the data directory, an initial `config.json` and an empty database.
    ///
    /// # Errors
    /// - Returns an error if the sheet URL cannot be understood, if a configuration already exists
    ///   in `dir`, or if any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>, remote: RemoteSettings) -> Res<Self> {
        let spreadsheet_id = extract_spreadsheet_id(&remote.sheet_url)
            .context("Failed to extract the spreadsheet ID from the sheet URL")?
            .to_string();

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the books home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A configuration already exists at '{}'",
                config_path.display()
            )
        }

        let config_file = ConfigFile {
            sheet_url: remote.sheet_url,
            api_key: remote.api_key,
            web_app_url: remote.web_app_url.filter(|s| !s.trim().is_empty()),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        let sqlite_path = root.join(BOOKS_SQLITE);
        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create SQLite DB")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            spreadsheet_id,
            sqlite_path,
        })
    }

    /// This will
    /// - validate that `books_home` exists and that the config file exists
    /// - load the config file
    /// - open the database, migrating it if needed
    ///
    /// # Errors
    /// - Returns a `Config` error if any of the above fails.
    pub async fn load(books_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(books_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The books home directory is missing, run 'books init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(&config_file.sheet_url)
            .context("Failed to extract the spreadsheet ID from the sheet URL")?
            .to_string();

        let sqlite_path = root.join(BOOKS_SQLITE);
        let db = Db::load(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            spreadsheet_id,
            sqlite_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn sheet_url(&self) -> &str {
        &self.config_file.sheet_url
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn api_key(&self) -> &str {
        &self.config_file.api_key
    }

    pub fn web_app_url(&self) -> Option<&str> {
        self.config_file.web_app_url.as_deref()
    }

    /// True when both the spreadsheet id and the API key are present, i.e. we can at least read.
    pub fn is_configured(&self) -> bool {
        !self.spreadsheet_id.trim().is_empty() && !self.api_key().trim().is_empty()
    }

    /// The name of the sheet tab that holds `category`.
    pub fn sheet_name(&self, category: Category) -> &str {
        self.config_file
            .sheet_names
            .get(&category)
            .map(String::as_str)
            .unwrap_or_else(|| category.default_sheet_name())
    }

    /// The category labels that may be used for `category`. Invoices have none.
    pub fn labels(&self, category: Category) -> Vec<String> {
        let (configured, default) = match category {
            Category::Income => (
                &self.config_file.income_categories,
                DEFAULT_INCOME_CATEGORIES,
            ),
            Category::Expenses => (
                &self.config_file.expense_categories,
                DEFAULT_EXPENSE_CATEGORIES,
            ),
            Category::Invoices => return Vec::new(),
        };
        match configured {
            Some(labels) => labels.clone(),
            None => default.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.config_file.last_sync
    }

    /// Records the time of a successful sync and saves the config file.
    pub(crate) async fn set_last_sync(&mut self, when: DateTime<Utc>) -> Res<()> {
        self.config_file.last_sync = Some(when);
        self.config_file.save(&self.config_path).await?;
        debug!("Recorded last sync {when}");
        Ok(())
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "books",
///   "config_version": 1,
///   "sheet_url": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///   "api_key": "AIzaSyD-example",
///   "web_app_url": "https://script.google.com/macros/s/AKfycbx-example/exec",
///   "sheet_names": { "invoices": "Billing" },
///   "income_categories": ["Sales", "Consulting"],
///   "last_sync": "2024-03-01T17:04:11Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "books"
    app_name: String,

    config_version: u8,

    /// URL of the Google Sheet, or just its id
    #[serde(default)]
    sheet_url: String,

    /// Google API key used for reading the sheet
    #[serde(default)]
    api_key: String,

    /// The Apps Script web app that writes to the sheet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    web_app_url: Option<String>,

    /// Overrides of the default sheet tab names
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    sheet_names: BTreeMap<Category, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    income_categories: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    expense_categories: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_sync: Option<DateTime<Utc>>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: String::new(),
            api_key: String::new(),
            web_app_url: None,
            sheet_names: BTreeMap::new(),
            income_categories: None,
            expense_categories: None,
            last_sync: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from `path`, validating the app name.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;
        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version <= CONFIG_VERSION,
            "Unsupported config_version {} in config file, is a newer version of books installed?",
            config.config_version
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL such as
/// `https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/edit`. A value without any `/` is taken
/// to be the id itself. An empty value gives an empty id.
fn extract_spreadsheet_id(url: &str) -> Res<&str> {
    let url = url.trim();
    if !url.contains('/') {
        return Ok(url);
    }

    let mut parts = url.split('/');
    while let Some(part) = parts.next() {
        if part != "d" {
            continue;
        }
        let id = parts
            .next()
            .and_then(|id_part| id_part.split(['?', '#']).next())
            .unwrap_or_default();
        if !id.is_empty() {
            return Ok(id);
        }
    }
    bail!(
        "Invalid Google Sheets URL format. Expected: \
        https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    )
}
