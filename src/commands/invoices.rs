//! Handlers for `books invoice`.

use crate::args::{AddInvoiceArgs, UpdateInvoiceArgs};
use crate::commands::{date_arg, load_ledger, save, Out};
use crate::error::{Error, ErrorType, IntoResult};
use crate::ledger::Ledger;
use crate::model::{Category, Invoice, InvoiceStatus, Record, RecordId};
use crate::{utils, Config, Result};
use chrono::Days;
use std::fmt::Write;
use tracing::info;

/// The number of days between an invoice's date and its default due date.
const PAYMENT_TERM_DAYS: u64 = 30;

/// Creates a pending invoice.
///
/// When not given, the invoice number is the next `INV-NNN`, the date is today and the due date
/// is 30 days after the date.
///
/// # Errors
/// - `Request` if the client is empty, a date is not a date or the invoice number is taken.
/// - `Database` if the invoice cannot be stored.
pub async fn add_invoice(config: Config, args: AddInvoiceArgs) -> Result<Out<Record>> {
    let client = required("client", args.client())?;
    let date = match args.date() {
        Some(date) => date_arg(date)?,
        None => utils::format_date(utils::today()),
    };
    let due_date = match args.due_date() {
        Some(due_date) => date_arg(due_date)?,
        None => default_due_date(&date)?,
    };

    let mut ledger = load_ledger(&config).await?;
    let number = match args.number() {
        Some(number) => required("invoice number", number)?,
        None => ledger.next_invoice_number(),
    };
    ensure_number_free(&ledger, &number, None)?;

    let record = Record::Invoice(Invoice::new(
        &number,
        client,
        date,
        due_date,
        args.amount(),
    ));
    ledger.add(record.clone());
    save(&config, &ledger, Category::Invoices).await?;

    Ok(Out::new(format!("Created invoice {number}"), record))
}

/// Changes the given fields of an invoice. Fields that are not given keep their value.
///
/// # Errors
/// - `Request` if there is no invoice with the id, a new value is not acceptable, or the status
///   change is anything other than pending or overdue to paid.
/// - `Database` if the invoice cannot be stored.
pub async fn update_invoice(config: Config, args: UpdateInvoiceArgs) -> Result<Out<Record>> {
    let number = args
        .number()
        .map(|n| required("invoice number", n))
        .transpose()?;
    let client = args.client().map(|c| required("client", c)).transpose()?;
    let date = args.date().map(date_arg).transpose()?;
    let due_date = args.due_date().map(date_arg).transpose()?;

    let mut ledger = load_ledger(&config).await?;
    let id = RecordId::from(args.id());
    if let Some(number) = &number {
        ensure_number_free(&ledger, number, Some(&id))?;
    }

    let invoice = invoice_mut(&mut ledger, &id)?;
    if let Some(status) = args.status() {
        invoice
            .set_status(status)
            .pub_result(ErrorType::Request)?;
    }
    if let Some(number) = number {
        invoice.invoice_number = number;
    }
    if let Some(client) = client {
        invoice.client = client;
    }
    if let Some(date) = date {
        invoice.date = date;
    }
    if let Some(due_date) = due_date {
        invoice.due_date = due_date;
    }
    if let Some(amount) = args.amount() {
        invoice.amount = amount;
    }
    let message = format!("Updated invoice {}", invoice.invoice_number());
    let updated = Record::Invoice(invoice.clone());
    save(&config, &ledger, Category::Invoices).await?;

    Ok(Out::new(message, updated))
}

/// Marks an invoice as paid. Paying a paid invoice is not an error.
pub async fn pay_invoice(config: Config, id: &str) -> Result<Out<Record>> {
    let mut ledger = load_ledger(&config).await?;
    let invoice = invoice_mut(&mut ledger, &RecordId::from(id))?;
    let message = if invoice.status() == InvoiceStatus::Paid {
        format!("Invoice {} was already paid", invoice.invoice_number())
    } else {
        invoice.mark_paid();
        format!("Invoice {} is paid", invoice.invoice_number())
    };
    let paid = Record::Invoice(invoice.clone());
    save(&config, &ledger, Category::Invoices).await?;
    Ok(Out::new(message, paid))
}

/// Removes an invoice. The invoice is returned.
pub async fn delete_invoice(config: Config, id: &str) -> Result<Out<Record>> {
    let mut ledger = load_ledger(&config).await?;
    let deleted = ledger
        .delete(Category::Invoices, &RecordId::from(id))
        .pub_result(ErrorType::Request)?;
    save(&config, &ledger, Category::Invoices).await?;
    let number = deleted
        .as_invoice()
        .map(Invoice::invoice_number)
        .unwrap_or_default();
    Ok(Out::new(format!("Deleted invoice {number}"), deleted))
}

/// Lists the invoices, newest first. Pending invoices that are past due are marked overdue, and
/// stored that way, before listing.
pub async fn list_invoices(config: Config) -> Result<Out<Vec<Record>>> {
    let mut ledger = load_ledger(&config).await?;
    refresh_overdue(&config, &mut ledger).await?;

    let records: Vec<Record> = ledger
        .newest_first(Category::Invoices)
        .into_iter()
        .cloned()
        .collect();
    if records.is_empty() {
        return Ok(Out::new("No invoices", records));
    }

    let mut table = format!("{} invoices", records.len());
    for invoice in records.iter().filter_map(Record::as_invoice) {
        let _ = write!(
            table,
            "\n  {}  {}  {}  due {}  {:>12}  {:<7}  {}",
            invoice.id(),
            invoice.invoice_number(),
            invoice.date(),
            invoice.due_date(),
            invoice.amount().to_currency(),
            invoice.status(),
            invoice.client()
        );
    }
    Ok(Out::new(table, records))
}

/// Marks past due invoices as overdue and stores them if anything changed.
pub(super) async fn refresh_overdue(config: &Config, ledger: &mut Ledger) -> Result<()> {
    let changed = ledger.refresh_overdue(utils::today());
    if changed > 0 {
        info!("{changed} invoices are now overdue");
        save(config, ledger, Category::Invoices).await?;
    }
    Ok(())
}

fn invoice_mut<'a>(ledger: &'a mut Ledger, id: &RecordId) -> Result<&'a mut Invoice> {
    ledger
        .get_mut(Category::Invoices, id)
        .pub_result(ErrorType::Request)?
        .as_invoice_mut()
        .ok_or_else(|| Error::msg(ErrorType::Internal, format!("Record {id} is not an invoice")))
}

/// Fails if an invoice other than `except` already uses `number`.
fn ensure_number_free(ledger: &Ledger, number: &str, except: Option<&RecordId>) -> Result<()> {
    let taken = ledger
        .records(Category::Invoices)
        .iter()
        .filter_map(Record::as_invoice)
        .any(|i| i.invoice_number() == number && Some(i.id()) != except);
    if taken {
        return Err(Error::msg(
            ErrorType::Request,
            format!("Invoice number {number} is already used"),
        ));
    }
    Ok(())
}

fn default_due_date(date: &str) -> Result<String> {
    utils::parse_date(date)
        .and_then(|d| d.checked_add_days(Days::new(PAYMENT_TERM_DAYS)))
        .map(utils::format_date)
        .ok_or_else(|| {
            Error::msg(
                ErrorType::Request,
                format!("Unable to compute a due date from '{date}'"),
            )
        })
}

fn required(name: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::msg(
            ErrorType::Request,
            format!("The {name} cannot be empty"),
        ));
    }
    Ok(value.to_string())
}
