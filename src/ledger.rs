//! The `Ledger` holds the three record collections in memory for the duration of a command. It is
//! loaded from the database, changed by the command and then saved back, one category at a time.

use crate::error::Res;
use crate::model::{Category, Invoice, Record, RecordId};
use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Ledger {
    income: Vec<Record>,
    expenses: Vec<Record>,
    invoices: Vec<Record>,
}

impl Ledger {
    pub fn new(income: Vec<Record>, expenses: Vec<Record>, invoices: Vec<Record>) -> Self {
        Self {
            income,
            expenses,
            invoices,
        }
    }

    pub fn records(&self, category: Category) -> &[Record] {
        match category {
            Category::Income => &self.income,
            Category::Expenses => &self.expenses,
            Category::Invoices => &self.invoices,
        }
    }

    fn records_mut(&mut self, category: Category) -> &mut Vec<Record> {
        match category {
            Category::Income => &mut self.income,
            Category::Expenses => &mut self.expenses,
            Category::Invoices => &mut self.invoices,
        }
    }

    /// Replaces the whole collection for `category`.
    pub fn replace(&mut self, category: Category, records: Vec<Record>) {
        debug!("Installing {} {category} records", records.len());
        *self.records_mut(category) = records;
    }

    /// Appends `record` to the collection it belongs to and returns its id.
    pub fn add(&mut self, record: Record) -> RecordId {
        let id = record.id().clone();
        self.records_mut(record.category()).push(record);
        id
    }

    pub fn get(&self, category: Category, id: &RecordId) -> Option<&Record> {
        self.records(category).iter().find(|r| r.id() == id)
    }

    pub fn get_mut(&mut self, category: Category, id: &RecordId) -> Res<&mut Record> {
        self.records_mut(category)
            .iter_mut()
            .find(|r| r.id() == id)
            .with_context(|| format!("No {category} record with id '{id}'"))
    }

    pub fn delete(&mut self, category: Category, id: &RecordId) -> Res<Record> {
        let records = self.records_mut(category);
        let ix = records
            .iter()
            .position(|r| r.id() == id)
            .with_context(|| format!("No {category} record with id '{id}'"))?;
        Ok(records.remove(ix))
    }

    /// The records of `category` sorted by date, newest first. Records with the same date keep
    /// their stored order.
    pub fn newest_first(&self, category: Category) -> Vec<&Record> {
        let mut sorted: Vec<&Record> = self.records(category).iter().collect();
        sorted.sort_by(|a, b| b.date().cmp(a.date()));
        sorted
    }

    /// The number to use for the next invoice, e.g. `INV-007` when there are six invoices. Numbers
    /// that are already used are skipped.
    pub fn next_invoice_number(&self) -> String {
        let used: HashSet<&str> = self
            .invoices
            .iter()
            .filter_map(Record::as_invoice)
            .map(Invoice::invoice_number)
            .collect();
        (self.invoices.len() + 1..)
            .map(|n| format!("INV-{n:03}"))
            .find(|number| !used.contains(number.as_str()))
            .unwrap_or_default()
    }

    /// Marks pending invoices that are past due as overdue. Returns how many changed.
    pub fn refresh_overdue(&mut self, today: NaiveDate) -> usize {
        let changed = self
            .invoices
            .iter_mut()
            .filter_map(Record::as_invoice_mut)
            .map(|i| i.refresh_overdue(today))
            .filter(|&changed| changed)
            .count();
        if changed > 0 {
            debug!("{changed} invoices are now overdue");
        }
        changed
    }
}
