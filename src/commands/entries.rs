//! Handlers for `books income` and `books expense`.

use crate::args::{AddEntryArgs, UpdateEntryArgs};
use crate::commands::{date_arg, label_arg, load_ledger, save, Out};
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{Category, Entry, Record, RecordId};
use crate::{utils, Config, Result};
use std::fmt::Write;

/// Adds an income or expense record to the local database.
///
/// # Arguments
/// - `category` - `Income` or `Expenses`.
/// - `args` - The record. The date defaults to today and the category label must be one of the
///   labels configured for `category`.
///
/// # Returns
/// The new record, including its generated id.
///
/// # Errors
/// - `Request` if the date, description or category label is not acceptable.
/// - `Database` if the record cannot be stored.
pub async fn add_entry(
    config: Config,
    category: Category,
    args: AddEntryArgs,
) -> Result<Out<Record>> {
    let date = match args.date() {
        Some(date) => date_arg(date)?,
        None => utils::format_date(utils::today()),
    };
    let description = description_arg(args.description())?;
    let label = label_arg(&config, category, args.category())?;
    let record = entry_record(
        category,
        Entry::new(date, description, label, args.amount()),
    )?;

    let mut ledger = load_ledger(&config).await?;
    let id = ledger.add(record.clone());
    save(&config, &ledger, category).await?;

    Ok(Out::new(format!("Added {category} record {id}"), record))
}

/// Changes the given fields of an income or expense record. Fields that are not given keep their
/// value.
///
/// # Errors
/// - `Request` if there is no record with the id or a new value is not acceptable.
/// - `Database` if the record cannot be stored.
pub async fn update_entry(
    config: Config,
    category: Category,
    args: UpdateEntryArgs,
) -> Result<Out<Record>> {
    let date = args.date().map(date_arg).transpose()?;
    let description = args.description().map(description_arg).transpose()?;
    let label = args
        .category()
        .map(|label| label_arg(&config, category, label))
        .transpose()?;

    let mut ledger = load_ledger(&config).await?;
    let id = RecordId::from(args.id());
    let record = ledger
        .get_mut(category, &id)
        .pub_result(ErrorType::Request)?;
    let entry = record
        .as_entry_mut()
        .ok_or_else(|| not_an_entry(category))?;

    if let Some(date) = date {
        entry.date = date;
    }
    if let Some(description) = description {
        entry.description = description;
    }
    if let Some(label) = label {
        entry.category = label;
    }
    if let Some(amount) = args.amount() {
        entry.amount = amount;
    }
    let updated = record.clone();
    save(&config, &ledger, category).await?;

    Ok(Out::new(format!("Updated {category} record {id}"), updated))
}

/// Removes an income or expense record. The record is returned.
///
/// Note that the record comes back with the next `sync` if it is still in the sheet, unless the
/// sync is run with `--push`.
pub async fn delete_entry(config: Config, category: Category, id: &str) -> Result<Out<Record>> {
    let mut ledger = load_ledger(&config).await?;
    let id = RecordId::from(id);
    let deleted = ledger
        .delete(category, &id)
        .pub_result(ErrorType::Request)?;
    save(&config, &ledger, category).await?;
    Ok(Out::new(format!("Deleted {category} record {id}"), deleted))
}

/// Lists the income or expense records, newest first. The message is a printable table.
pub async fn list_entries(config: Config, category: Category) -> Result<Out<Vec<Record>>> {
    let ledger = load_ledger(&config).await?;
    let records: Vec<Record> = ledger.newest_first(category).into_iter().cloned().collect();
    if records.is_empty() {
        return Ok(Out::new(format!("No {category} records"), records));
    }

    let mut table = format!("{} {category} records", records.len());
    for entry in records.iter().filter_map(Record::as_entry) {
        let _ = write!(
            table,
            "\n  {}  {}  {:>12}  {} ({})",
            entry.id(),
            entry.date(),
            entry.amount().to_currency(),
            entry.description(),
            entry.category()
        );
    }
    Ok(Out::new(table, records))
}

fn entry_record(category: Category, entry: Entry) -> Result<Record> {
    match category {
        Category::Income => Ok(Record::Income(entry)),
        Category::Expenses => Ok(Record::Expense(entry)),
        Category::Invoices => Err(not_an_entry(category)),
    }
}

fn not_an_entry(category: Category) -> Error {
    Error::msg(
        ErrorType::Internal,
        format!("{category} records are not income or expenses"),
    )
}

fn description_arg(description: &str) -> Result<String> {
    let description = description.trim();
    if description.is_empty() {
        return Err(Error::msg(
            ErrorType::Request,
            "The description cannot be empty",
        ));
    }
    Ok(description.to_string())
}
