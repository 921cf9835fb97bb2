use crate::error::Res;
use crate::model::{Amount, Category, Field, FieldKey};
use crate::utils;
use anyhow::bail;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tracing::trace;

/// A locally generated identifier. It has no meaning in the remote store and is never used to
/// decide whether two records are the same.
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generates a new id from the current time and a random suffix.
    pub fn generate() -> Self {
        Self(utils::generate_id(None))
    }

    /// Generates a new id for the `ordinal`-th row of a decode. Ids generated for different
    /// ordinals are always different, even within the same millisecond.
    pub(crate) fn generate_for_row(ordinal: usize) -> Self {
        Self(utils::generate_id(Some(ordinal)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<S: Into<String>> From<S> for RecordId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

/// A row of the Income or Expenses sheet.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Entry {
    pub(crate) id: RecordId,
    pub(crate) date: String,
    pub(crate) description: String,
    pub(crate) category: String,
    pub(crate) amount: Amount,
}

impl Entry {
    pub fn new(
        date: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        amount: impl Into<Amount>,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            date: utils::normalize_date(&date.into()),
            description: description.into(),
            category: category.into(),
            amount: amount.into(),
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn date(&self) -> &str {
        &self.date
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

    fn same_content(&self, other: &Entry) -> bool {
        self.date == other.date
            && self.description == other.description
            && self.category == other.category
            && self.amount.approx_eq(&other.amount)
    }

    fn set_field(&mut self, field: Field, value: String) -> bool {
        match field {
            Field::Date => self.date = utils::normalize_date(&value),
            Field::Description => self.description = value,
            Field::Category => self.category = value,
            Field::Amount => self.amount = Amount::parse_lenient(&value),
            _ => return false,
        }
        true
    }

    fn field(&self, field: Field) -> Option<String> {
        match field {
            Field::Date => Some(self.date.clone()),
            Field::Description => Some(self.description.clone()),
            Field::Category => Some(self.category.clone()),
            Field::Amount => Some(self.amount.to_string()),
            _ => None,
        }
    }
}

/// The state of an invoice.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
}

serde_plain::derive_display_from_serialize!(InvoiceStatus);
serde_plain::derive_fromstr_from_deserialize!(InvoiceStatus);

impl InvoiceStatus {
    /// Reads a status cell. Case is ignored and an empty or unknown value is `Pending`.
    pub fn parse_lenient(s: &str) -> Self {
        s.trim().to_lowercase().parse().unwrap_or_default()
    }
}

/// A row of the Invoices sheet.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Invoice {
    pub(crate) id: RecordId,
    pub(crate) invoice_number: String,
    pub(crate) client: String,
    pub(crate) date: String,
    pub(crate) due_date: String,
    pub(crate) amount: Amount,
    pub(crate) status: InvoiceStatus,
}

impl Invoice {
    pub fn new(
        invoice_number: impl Into<String>,
        client: impl Into<String>,
        date: impl Into<String>,
        due_date: impl Into<String>,
        amount: impl Into<Amount>,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            invoice_number: invoice_number.into(),
            client: client.into(),
            date: utils::normalize_date(&date.into()),
            due_date: utils::normalize_date(&due_date.into()),
            amount: amount.into(),
            status: InvoiceStatus::Pending,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn due_date(&self) -> &str {
        &self.due_date
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    /// Changes the status by hand. The only change allowed is from pending or overdue to paid;
    /// overdue is set by `refresh_overdue` and a paid invoice stays paid. Setting the current
    /// status again does nothing.
    pub fn set_status(&mut self, status: InvoiceStatus) -> Res<()> {
        if status == self.status {
            return Ok(());
        }
        match (self.status, status) {
            (InvoiceStatus::Pending | InvoiceStatus::Overdue, InvoiceStatus::Paid) => {
                self.status = status;
                Ok(())
            }
            (from, to) => bail!(
                "Invoice {} is {from} and cannot be changed to {to}",
                self.invoice_number
            ),
        }
    }

    pub fn mark_paid(&mut self) {
        self.status = InvoiceStatus::Paid;
    }

    /// Moves a pending invoice whose due date is before `today` to overdue. Returns `true` if the
    /// status changed. Invoices with an unreadable due date are left alone.
    pub fn refresh_overdue(&mut self, today: NaiveDate) -> bool {
        if self.status != InvoiceStatus::Pending {
            return false;
        }
        match utils::parse_date(&self.due_date) {
            Some(due) if due < today => {
                self.status = InvoiceStatus::Overdue;
                true
            }
            _ => false,
        }
    }

    /// Status is deliberately not compared, see `Record::same_content`.
    fn same_content(&self, other: &Invoice) -> bool {
        self.invoice_number == other.invoice_number
            && self.client == other.client
            && self.date == other.date
            && self.due_date == other.due_date
            && self.amount.approx_eq(&other.amount)
    }

    fn set_field(&mut self, field: Field, value: String) -> bool {
        match field {
            Field::InvoiceNumber => self.invoice_number = value,
            Field::Client => self.client = value,
            Field::Date => self.date = utils::normalize_date(&value),
            Field::DueDate => self.due_date = utils::normalize_date(&value),
            Field::Amount => self.amount = Amount::parse_lenient(&value),
            Field::Status => self.status = InvoiceStatus::parse_lenient(&value),
            _ => return false,
        }
        true
    }

    fn field(&self, field: Field) -> Option<String> {
        match field {
            Field::InvoiceNumber => Some(self.invoice_number.clone()),
            Field::Client => Some(self.client.clone()),
            Field::Date => Some(self.date.clone()),
            Field::DueDate => Some(self.due_date.clone()),
            Field::Amount => Some(self.amount.to_string()),
            Field::Status => Some(self.status.to_string()),
            _ => None,
        }
    }
}

/// A record of any category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Income(Entry),
    Expense(Entry),
    Invoice(Invoice),
}

impl Record {
    /// An empty record for `category` with the given `id`.
    pub(crate) fn blank(category: Category, id: RecordId) -> Self {
        match category {
            Category::Income => Record::Income(Entry {
                id,
                ..Entry::default()
            }),
            Category::Expenses => Record::Expense(Entry {
                id,
                ..Entry::default()
            }),
            Category::Invoices => Record::Invoice(Invoice {
                id,
                ..Invoice::default()
            }),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Record::Income(_) => Category::Income,
            Record::Expense(_) => Category::Expenses,
            Record::Invoice(_) => Category::Invoices,
        }
    }

    pub fn id(&self) -> &RecordId {
        match self {
            Record::Income(e) | Record::Expense(e) => e.id(),
            Record::Invoice(i) => i.id(),
        }
    }

    pub fn date(&self) -> &str {
        match self {
            Record::Income(e) | Record::Expense(e) => e.date(),
            Record::Invoice(i) => i.date(),
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            Record::Income(e) | Record::Expense(e) => e.amount(),
            Record::Invoice(i) => i.amount(),
        }
    }

    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            Record::Income(e) | Record::Expense(e) => Some(e),
            Record::Invoice(_) => None,
        }
    }

    pub fn as_invoice(&self) -> Option<&Invoice> {
        match self {
            Record::Invoice(i) => Some(i),
            _ => None,
        }
    }

    pub(crate) fn as_entry_mut(&mut self) -> Option<&mut Entry> {
        match self {
            Record::Income(e) | Record::Expense(e) => Some(e),
            Record::Invoice(_) => None,
        }
    }

    pub(crate) fn as_invoice_mut(&mut self) -> Option<&mut Invoice> {
        match self {
            Record::Invoice(i) => Some(i),
            _ => None,
        }
    }

    /// Assigns `value` to the field identified by `key`. Columns that this kind of record does not
    /// have are ignored.
    pub fn set_field(&mut self, key: &FieldKey, value: impl Into<String>) {
        let value = value.into();
        let accepted = match Field::from_key(key) {
            None => false,
            Some(field) => match self {
                Record::Income(e) | Record::Expense(e) => e.set_field(field, value),
                Record::Invoice(i) => i.set_field(field, value),
            },
        };
        if !accepted {
            trace!("Ignoring column '{key}' for a {} record", self.category());
        }
    }

    /// The text value of the field identified by `key`, `None` if this kind of record does not
    /// have that field.
    pub fn field(&self, key: &FieldKey) -> Option<String> {
        let field = Field::from_key(key)?;
        match self {
            Record::Income(e) | Record::Expense(e) => e.field(field),
            Record::Invoice(i) => i.field(field),
        }
    }

    /// Content equality, the identity used when merging. The id never takes part. Records of
    /// different categories are never the same. For invoices the status is not compared: an
    /// invoice that only differs by status is the same invoice.
    pub fn same_content(&self, other: &Record) -> bool {
        match (self, other) {
            (Record::Income(a), Record::Income(b)) => a.same_content(b),
            (Record::Expense(a), Record::Expense(b)) => a.same_content(b),
            (Record::Invoice(a), Record::Invoice(b)) => a.same_content(b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(status: InvoiceStatus, due_date: &str) -> Invoice {
        let mut i = Invoice::new("INV-001", "Acme", "2024-01-01", due_date, 500.0);
        i.status = status;
        i
    }

    #[test]
    fn test_same_content_ignores_id() {
        let a = Record::Income(Entry::new("2024-01-01", "Sale", "Sales", 100.0));
        let b = Record::Income(Entry::new("2024-01-01", "Sale", "Sales", 100.005));
        assert_ne!(a.id(), b.id());
        assert!(a.same_content(&b));
    }

    #[test]
    fn test_same_content_different_amount() {
        let a = Record::Expense(Entry::new("2024-01-01", "Paper", "Office Supplies", 10.0));
        let b = Record::Expense(Entry::new("2024-01-01", "Paper", "Office Supplies", 10.02));
        assert!(!a.same_content(&b));
    }

    #[test]
    fn test_same_content_never_across_categories() {
        let a = Record::Income(Entry::new("2024-01-01", "Refund", "Other", 10.0));
        let b = Record::Expense(Entry::new("2024-01-01", "Refund", "Other", 10.0));
        assert!(!a.same_content(&b));
    }

    #[test]
    fn test_same_content_ignores_invoice_status() {
        let a = Record::Invoice(invoice(InvoiceStatus::Pending, "2024-01-31"));
        let b = Record::Invoice(invoice(InvoiceStatus::Paid, "2024-01-31"));
        assert!(a.same_content(&b));
    }

    #[test]
    fn test_set_field_by_key() {
        let mut r = Record::blank(Category::Invoices, RecordId::from("x"));
        r.set_field(&FieldKey::new("Invoice #"), "INV-007");
        r.set_field(&FieldKey::new("Due Date"), "2/15/2024");
        r.set_field(&FieldKey::new("Status"), "PAID");
        r.set_field(&FieldKey::new("Amount"), "abc");
        r.set_field(&FieldKey::new("Description"), "ignored");
        let i = r.as_invoice().unwrap();
        assert_eq!(i.invoice_number(), "INV-007");
        assert_eq!(i.due_date(), "2024-02-15");
        assert_eq!(i.status(), InvoiceStatus::Paid);
        assert_eq!(i.amount(), Amount::ZERO);
        assert_eq!(r.field(&FieldKey::new("Description")), None);
    }

    #[test]
    fn test_status_parse_lenient() {
        assert_eq!(InvoiceStatus::parse_lenient(" Overdue "), InvoiceStatus::Overdue);
        assert_eq!(InvoiceStatus::parse_lenient(""), InvoiceStatus::Pending);
        assert_eq!(InvoiceStatus::parse_lenient("sent"), InvoiceStatus::Pending);
    }

    #[test]
    fn test_paid_cannot_go_back() {
        let mut i = invoice(InvoiceStatus::Paid, "2024-01-31");
        assert!(i.set_status(InvoiceStatus::Pending).is_err());
        assert!(i.set_status(InvoiceStatus::Overdue).is_err());
        assert_eq!(i.status(), InvoiceStatus::Paid);
        i.set_status(InvoiceStatus::Paid).unwrap();
    }

    #[test]
    fn test_status_only_moves_to_paid() {
        let mut overdue = invoice(InvoiceStatus::Overdue, "2024-01-31");
        assert!(overdue.set_status(InvoiceStatus::Pending).is_err());
        assert_eq!(overdue.status(), InvoiceStatus::Overdue);
        overdue.set_status(InvoiceStatus::Overdue).unwrap();

        let mut pending = invoice(InvoiceStatus::Pending, "2024-01-31");
        assert!(pending.set_status(InvoiceStatus::Overdue).is_err());
        assert_eq!(pending.status(), InvoiceStatus::Pending);

        overdue.set_status(InvoiceStatus::Paid).unwrap();
        pending.set_status(InvoiceStatus::Paid).unwrap();
        assert_eq!(overdue.status(), InvoiceStatus::Paid);
        assert_eq!(pending.status(), InvoiceStatus::Paid);
    }

    #[test]
    fn test_refresh_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();

        let mut late = invoice(InvoiceStatus::Pending, "2024-01-31");
        assert!(late.refresh_overdue(today));
        assert_eq!(late.status(), InvoiceStatus::Overdue);

        let mut due_today = invoice(InvoiceStatus::Pending, "2024-02-01");
        assert!(!due_today.refresh_overdue(today));
        assert_eq!(due_today.status(), InvoiceStatus::Pending);

        let mut paid = invoice(InvoiceStatus::Paid, "2024-01-01");
        assert!(!paid.refresh_overdue(today));
        assert_eq!(paid.status(), InvoiceStatus::Paid);

        let mut unreadable = invoice(InvoiceStatus::Pending, "soon");
        assert!(!unreadable.refresh_overdue(today));
    }

    #[test]
    fn test_overdue_can_be_paid() {
        let mut i = invoice(InvoiceStatus::Overdue, "2024-01-01");
        i.mark_paid();
        assert_eq!(i.status(), InvoiceStatus::Paid);
    }
}
