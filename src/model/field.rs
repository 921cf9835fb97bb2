use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Represents a header in the Google sheet, for example, `Invoice #`
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header(String);

impl AsRef<str> for Header {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl<S: Into<String>> From<S> for Header {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl FromStr for Header {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}

impl Header {
    /// The normalized key of this header.
    pub fn key(&self) -> FieldKey {
        FieldKey::new(self)
    }
}

/// The canonical identifier of a column, derived from its header. This is the join key between
/// the headers found in the sheet and the fields of our records, so both directions (sheet to
/// record and record to sheet) must go through `FieldKey::new`.
///
/// The header is lowercased, all whitespace is removed and `#` becomes `number`.
///
/// ```
/// # use books_sync::model::FieldKey;
/// assert_eq!(FieldKey::new("Invoice #").as_ref(), "invoicenumber");
/// assert_eq!(FieldKey::new("Due Date").as_ref(), "duedate");
/// ```
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldKey(String);

impl FieldKey {
    pub fn new(header: impl AsRef<str>) -> Self {
        let key: String = header
            .as_ref()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        Self(key.replace('#', "number"))
    }
}

impl AsRef<str> for FieldKey {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The known fields of our records. The serialized name of each variant is its `FieldKey`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Date,
    Description,
    Category,
    Amount,
    InvoiceNumber,
    Client,
    DueDate,
    Status,
}

serde_plain::derive_display_from_serialize!(Field);
serde_plain::derive_fromstr_from_deserialize!(Field);

impl Field {
    /// Maps a normalized key to a known field. Returns `None` for columns we do not track.
    pub fn from_key(key: &FieldKey) -> Option<Field> {
        Field::from_str(key.as_ref()).ok()
    }

    pub fn key(&self) -> FieldKey {
        FieldKey(self.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_normalize_invoice_number() {
        assert_eq!(FieldKey::new("Invoice #").as_ref(), "invoicenumber");
    }

    #[test]
    fn test_normalize_due_date() {
        assert_eq!(FieldKey::new("Due Date").as_ref(), "duedate");
    }

    #[test]
    fn test_normalize_whitespace_everywhere() {
        assert_eq!(FieldKey::new("  Amount\t ").as_ref(), "amount");
        assert_eq!(FieldKey::new("Due\u{a0}Date").as_ref(), "duedate");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = FieldKey::new("Invoice #");
        let twice = FieldKey::new(once.as_ref());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_field_from_key() {
        assert_eq!(
            Field::from_key(&FieldKey::new("Invoice #")),
            Some(Field::InvoiceNumber)
        );
        assert_eq!(
            Field::from_key(&Header::from("Due Date").key()),
            Some(Field::DueDate)
        );
        assert_eq!(Field::from_key(&FieldKey::new("Notes")), None);
    }

    #[test]
    fn test_field_key_round_trip() {
        for field in [
            Field::Date,
            Field::Description,
            Field::Category,
            Field::Amount,
            Field::InvoiceNumber,
            Field::Client,
            Field::DueDate,
            Field::Status,
        ] {
            assert_eq!(Field::from_key(&field.key()), Some(field));
        }
    }
}
