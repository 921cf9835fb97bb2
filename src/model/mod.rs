//! Types that represent the core data model, such as `Record` and `Category`, and the `Grid` that
//! is exchanged with the remote store.
mod amount;
mod category;
mod field;
mod grid;
mod record;

pub use amount::{Amount, AmountError, EPSILON};
pub use category::Category;
pub use field::{Field, FieldKey, Header};
pub use grid::Grid;
pub use record::{Entry, Invoice, InvoiceStatus, Record, RecordId};

pub(crate) use grid::cell;
