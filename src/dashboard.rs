//! The summary shown by `books dashboard`.

use crate::ledger::Ledger;
use crate::model::{Amount, Category, InvoiceStatus, Record};
use crate::utils;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

const RECENT_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Dashboard {
    /// The month being summarized, e.g. `2024-03`.
    pub month: String,
    pub income: Amount,
    pub expenses: Amount,
    pub net_profit: Amount,
    pub pending_invoices: usize,
    /// The most recent income and expense records, newest first.
    pub recent: Vec<Transaction>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub direction: Direction,
    pub date: String,
    pub description: String,
    pub category: String,
    pub amount: Amount,
}

impl Dashboard {
    /// Summarizes `ledger` for the month that contains `today`.
    pub fn new(ledger: &Ledger, today: NaiveDate) -> Self {
        let income = month_total(ledger.records(Category::Income), today);
        let expenses = month_total(ledger.records(Category::Expenses), today);
        let pending_invoices = ledger
            .records(Category::Invoices)
            .iter()
            .filter_map(Record::as_invoice)
            .filter(|i| i.status() == InvoiceStatus::Pending)
            .count();

        let mut recent: Vec<Transaction> = ledger
            .records(Category::Income)
            .iter()
            .chain(ledger.records(Category::Expenses))
            .filter_map(Transaction::from_record)
            .collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        recent.truncate(RECENT_COUNT);

        Self {
            month: today.format("%Y-%m").to_string(),
            income,
            expenses,
            net_profit: Amount::new(income.value() - expenses.value()),
            pending_invoices,
            recent,
        }
    }

    /// A plain text rendering for the terminal.
    pub fn render(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "Month:            {}", self.month);
        let _ = writeln!(s, "Income:           {}", self.income.to_currency());
        let _ = writeln!(s, "Expenses:         {}", self.expenses.to_currency());
        let _ = writeln!(s, "Net profit:       {}", self.net_profit.to_currency());
        let _ = writeln!(s, "Pending invoices: {}", self.pending_invoices);
        if self.recent.is_empty() {
            let _ = write!(s, "No recent transactions");
            return s;
        }
        let _ = writeln!(s, "Recent transactions:");
        for t in &self.recent {
            let sign = match t.direction {
                Direction::Income => '+',
                Direction::Expense => '-',
            };
            let _ = writeln!(
                s,
                "  {}  {sign}{:>12}  {} ({})",
                t.date,
                t.amount.to_currency(),
                t.description,
                t.category
            );
        }
        s
    }
}

impl Transaction {
    fn from_record(record: &Record) -> Option<Self> {
        let (direction, entry) = match record {
            Record::Income(e) => (Direction::Income, e),
            Record::Expense(e) => (Direction::Expense, e),
            Record::Invoice(_) => return None,
        };
        Some(Self {
            direction,
            date: entry.date().to_string(),
            description: entry.description().to_string(),
            category: entry.category().to_string(),
            amount: entry.amount(),
        })
    }
}

/// Sums the amounts of the records dated in the same month as `today`. Records with an unreadable
/// date are left out.
fn month_total(records: &[Record], today: NaiveDate) -> Amount {
    let total = records
        .iter()
        .filter(|r| {
            utils::parse_date(r.date())
                .map(|d| d.year() == today.year() && d.month() == today.month())
                .unwrap_or(false)
        })
        .map(|r| r.amount().value())
        .sum();
    Amount::new(total)
}
