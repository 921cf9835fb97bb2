//! This module is responsible for reading, writing and managing the SQLite database.

mod migrations;

use crate::error::Res;
use crate::ledger::Ledger;
use crate::model::{Amount, Category, Entry, Invoice, InvoiceStatus, Record, RecordId};
use anyhow::{bail, Context};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that there is a SQLite file at `path`
    /// - Connects to it
    /// - Updates the database schema with migrations if it is out-of-date
    pub(crate) async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The SQLite database is missing '{}'", path.display())
        }
        let pool = connect(path, false).await?;
        let current = migrations::version(&pool).await?;
        if current > migrations::CURRENT_VERSION {
            bail!(
                "The database schema is at version {current} which is newer than this program \
                supports ({}), is a newer version of books installed?",
                migrations::CURRENT_VERSION
            )
        }
        migrations::run(&pool, current, migrations::CURRENT_VERSION).await?;
        Ok(Self { pool })
    }

    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    pub(crate) async fn init(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at '{}'", path.display())
        }
        let pool = connect(path, true).await?;
        migrations::bootstrap(&pool).await?;
        migrations::run(&pool, 0, migrations::CURRENT_VERSION).await?;
        debug!("Created the database at {}", path.display());
        Ok(Self { pool })
    }

    /// Reads all three collections.
    pub(crate) async fn load_ledger(&self) -> Res<Ledger> {
        Ok(Ledger::new(
            self.records(Category::Income).await?,
            self.records(Category::Expenses).await?,
            self.records(Category::Invoices).await?,
        ))
    }

    /// Reads the records of `category` in their stored order.
    pub(crate) async fn records(&self, category: Category) -> Res<Vec<Record>> {
        match category {
            Category::Income | Category::Expenses => {
                let rows: Vec<EntryRow> = sqlx::query_as(
                    "SELECT id, date, description, category, amount FROM entries \
                    WHERE kind = ? ORDER BY position",
                )
                .bind(category.to_string())
                .fetch_all(&self.pool)
                .await
                .with_context(|| format!("Unable to read {category} from the database"))?;
                Ok(rows
                    .into_iter()
                    .map(|row| {
                        let entry = row.into_entry();
                        match category {
                            Category::Income => Record::Income(entry),
                            _ => Record::Expense(entry),
                        }
                    })
                    .collect())
            }
            Category::Invoices => {
                let rows: Vec<InvoiceRow> = sqlx::query_as(
                    "SELECT id, invoice_number, client, date, due_date, amount, status \
                    FROM invoices ORDER BY position",
                )
                .fetch_all(&self.pool)
                .await
                .context("Unable to read invoices from the database")?;
                rows.into_iter()
                    .map(|row| row.into_invoice().map(Record::Invoice))
                    .collect()
            }
        }
    }

    /// Replaces every stored record of `category` with `records` in a single transaction. Either
    /// all of `records` are stored or nothing changes.
    pub(crate) async fn replace(&self, category: Category, records: &[Record]) -> Res<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        match category {
            Category::Income | Category::Expenses => {
                sqlx::query("DELETE FROM entries WHERE kind = ?")
                    .bind(category.to_string())
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("Unable to clear {category}"))?;
            }
            Category::Invoices => {
                sqlx::query("DELETE FROM invoices")
                    .execute(&mut *tx)
                    .await
                    .context("Unable to clear invoices")?;
            }
        }

        for (position, record) in records.iter().enumerate() {
            if record.category() != category {
                bail!(
                    "Record {} is {} and cannot be stored as {category}",
                    record.id(),
                    record.category()
                );
            }
            insert(&mut tx, position as i64, record)
                .await
                .with_context(|| format!("Unable to store {category} record {}", record.id()))?;
        }

        tx.commit()
            .await
            .with_context(|| format!("Unable to commit {category}"))?;
        debug!("Stored {} {category} records", records.len());
        Ok(())
    }
}

async fn connect(path: &Path, create: bool) -> Res<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open the SQLite database at {}", path.display()))
}

async fn insert(tx: &mut Transaction<'_, Sqlite>, position: i64, record: &Record) -> Res<()> {
    match record {
        Record::Income(e) | Record::Expense(e) => {
            sqlx::query(
                "INSERT INTO entries (kind, id, position, date, description, category, amount) \
                VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(record.category().to_string())
            .bind(e.id().as_str())
            .bind(position)
            .bind(e.date())
            .bind(e.description())
            .bind(e.category())
            .bind(e.amount().value())
            .execute(&mut **tx)
            .await?;
        }
        Record::Invoice(i) => {
            sqlx::query(
                "INSERT INTO invoices \
                (id, position, invoice_number, client, date, due_date, amount, status) \
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(i.id().as_str())
            .bind(position)
            .bind(i.invoice_number())
            .bind(i.client())
            .bind(i.date())
            .bind(i.due_date())
            .bind(i.amount().value())
            .bind(i.status().to_string())
            .execute(&mut **tx)
            .await?;
        }
    }
    Ok(())
}

#[derive(FromRow)]
struct EntryRow {
    id: String,
    date: String,
    description: String,
    category: String,
    amount: f64,
}

impl EntryRow {
    fn into_entry(self) -> Entry {
        Entry {
            id: RecordId::from(self.id),
            date: self.date,
            description: self.description,
            category: self.category,
            amount: Amount::new(self.amount),
        }
    }
}

#[derive(FromRow)]
struct InvoiceRow {
    id: String,
    invoice_number: String,
    client: String,
    date: String,
    due_date: String,
    amount: f64,
    status: String,
}

impl InvoiceRow {
    fn into_invoice(self) -> Res<Invoice> {
        let status = InvoiceStatus::from_str(&self.status)
            .with_context(|| format!("Invalid status '{}' for invoice {}", self.status, self.id))?;
        Ok(Invoice {
            id: RecordId::from(self.id),
            invoice_number: self.invoice_number,
            client: self.client,
            date: self.date,
            due_date: self.due_date,
            amount: Amount::new(self.amount),
            status,
        })
    }
}
