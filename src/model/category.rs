use serde::{Deserialize, Serialize};

/// The three record collections we keep. The serialized name is the identifier used consistently
/// between the local database, the codec and the remote store.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Income,
    Expenses,
    Invoices,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

/// Headers written to the Income and Expenses sheets, in order.
pub(crate) const ENTRY_HEADERS: &[&str] = &[DATE_STR, DESCRIPTION_STR, CATEGORY_STR, AMOUNT_STR];

/// Headers written to the Invoices sheet, in order.
pub(crate) const INVOICE_HEADERS: &[&str] = &[
    INVOICE_NUMBER_STR,
    CLIENT_STR,
    DATE_STR,
    DUE_DATE_STR,
    AMOUNT_STR,
    STATUS_STR,
];

pub(crate) const DATE_STR: &str = "Date";
pub(crate) const DESCRIPTION_STR: &str = "Description";
pub(crate) const CATEGORY_STR: &str = "Category";
pub(crate) const AMOUNT_STR: &str = "Amount";
pub(crate) const INVOICE_NUMBER_STR: &str = "Invoice #";
pub(crate) const CLIENT_STR: &str = "Client";
pub(crate) const DUE_DATE_STR: &str = "Due Date";
pub(crate) const STATUS_STR: &str = "Status";

impl Category {
    /// All categories in the order in which they are synchronized.
    pub const ALL: [Category; 3] = [Category::Income, Category::Expenses, Category::Invoices];

    /// The fixed, ordered header row used when writing this category to a sheet.
    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            Category::Income | Category::Expenses => ENTRY_HEADERS,
            Category::Invoices => INVOICE_HEADERS,
        }
    }

    /// The name of the sheet tab unless configured otherwise.
    pub fn default_sheet_name(&self) -> &'static str {
        match self {
            Category::Income => "Income",
            Category::Expenses => "Expenses",
            Category::Invoices => "Invoices",
        }
    }
}
