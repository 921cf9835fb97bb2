//! Converts between the untyped `Grid` exchanged with the remote store and typed `Record`s.
//!
//! Headers are matched to record fields through `FieldKey` in both directions, so a sheet whose
//! header reads `invoice #` or `Invoice#` still lands in the right field. Columns we do not know
//! about are ignored and columns we expect but do not find are left at their defaults.

use crate::model::{cell, Category, FieldKey, Grid, Record, RecordId};
use tracing::{debug, trace};

/// Parses `grid` into records of `category`.
///
/// A grid with fewer than two rows (nothing, or only headers) yields no records. Zero-length rows,
/// which is how the Sheets API returns blank lines, are skipped. Every record receives a fresh
/// id that is unique within this call.
pub fn decode(grid: &Grid, category: Category) -> Vec<Record> {
    if grid.rows().len() < 2 {
        debug!("No {category} rows to decode");
        return Vec::new();
    }

    let keys: Vec<FieldKey> = grid.headers().iter().map(|h| h.key()).collect();
    let mut records = Vec::with_capacity(grid.len());
    for (ordinal, row) in grid.data_rows().iter().enumerate() {
        if row.is_empty() {
            trace!("Skipping blank {category} row {}", ordinal + 2);
            continue;
        }
        if row.len() > keys.len() {
            trace!(
                "{category} row {} has {} cells but there are only {} headers",
                ordinal + 2,
                row.len(),
                keys.len()
            );
        }
        let mut record = Record::blank(category, RecordId::generate_for_row(ordinal));
        for (ix, key) in keys.iter().enumerate() {
            record.set_field(key, cell(row, ix));
        }
        records.push(record);
    }
    debug!("Decoded {} {category} records", records.len());
    records
}

/// Renders `records` as a grid with the fixed header row of `category`. Ids are not written.
pub fn encode(records: &[Record], category: Category) -> Grid {
    let headers = category.headers();
    let keys: Vec<FieldKey> = headers.iter().map(FieldKey::new).collect();
    let mut grid = Grid::new(vec![headers.to_vec()]);
    for record in records {
        grid.push(
            keys.iter()
                .map(|key| record.field(key).unwrap_or_default())
                .collect(),
        );
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, Entry, Invoice, InvoiceStatus};
    use std::collections::HashSet;

    #[test]
    fn test_decode_needs_two_rows() {
        assert!(decode(&Grid::default(), Category::Income).is_empty());
        let headers_only = Grid::new(vec![vec!["Date", "Description", "Category", "Amount"]]);
        assert!(decode(&headers_only, Category::Income).is_empty());
    }

    #[test]
    fn test_decode_entries() {
        let grid = Grid::new(vec![
            vec!["Date", "Description", "Category", "Amount", "Notes"],
            vec!["2024-01-05", "Consulting", "Services", "$1,500.00", "paid by check"],
            vec![],
            vec!["1/9/2024", "Widget", "Sales"],
            vec!["2024-01-10", "Mystery", "Other", "abc"],
        ]);
        let records = decode(&grid, Category::Income);
        assert_eq!(records.len(), 3);

        let first = records[0].as_entry().unwrap();
        assert_eq!(first.date(), "2024-01-05");
        assert_eq!(first.description(), "Consulting");
        assert_eq!(first.category(), "Services");
        assert_eq!(first.amount(), Amount::new(1500.0));

        let second = records[1].as_entry().unwrap();
        assert_eq!(second.date(), "2024-01-09");
        assert_eq!(second.amount(), Amount::ZERO);

        let third = records[2].as_entry().unwrap();
        assert_eq!(third.amount(), Amount::ZERO);

        assert!(records.iter().all(|r| r.category() == Category::Income));
        let ids: HashSet<&RecordId> = records.iter().map(|r| r.id()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_decode_invoices_with_loose_headers() {
        let grid = Grid::new(vec![
            vec!["invoice #", "CLIENT", "Date", "Due  Date", "Amount", "Status"],
            vec!["INV-001", "Acme", "2024-01-01", "2024-01-31", "500", "Paid"],
            vec!["INV-002", "Globex", "2024-01-02", "2024-02-01", "250.5", ""],
        ]);
        let records = decode(&grid, Category::Invoices);
        assert_eq!(records.len(), 2);
        let a = records[0].as_invoice().unwrap();
        assert_eq!(a.invoice_number(), "INV-001");
        assert_eq!(a.client(), "Acme");
        assert_eq!(a.due_date(), "2024-01-31");
        assert_eq!(a.status(), InvoiceStatus::Paid);
        let b = records[1].as_invoice().unwrap();
        assert_eq!(b.status(), InvoiceStatus::Pending);
        assert_eq!(b.amount(), Amount::new(250.5));
    }

    #[test]
    fn test_encode_entries() {
        let records = vec![Record::Expense(Entry::new(
            "2024-02-01",
            "Paper",
            "Office Supplies",
            12.5,
        ))];
        let grid = encode(&records, Category::Expenses);
        assert_eq!(
            grid.rows(),
            &[
                vec!["Date", "Description", "Category", "Amount"],
                vec!["2024-02-01", "Paper", "Office Supplies", "12.50"],
            ]
        );
    }

    #[test]
    fn test_encode_invoices() {
        let mut invoice = Invoice::new("INV-003", "Initech", "2024-03-01", "2024-03-31", 99.999);
        invoice.mark_paid();
        let grid = encode(&[Record::Invoice(invoice)], Category::Invoices);
        assert_eq!(
            grid.rows(),
            &[
                vec!["Invoice #", "Client", "Date", "Due Date", "Amount", "Status"],
                vec!["INV-003", "Initech", "2024-03-01", "2024-03-31", "100.00", "paid"],
            ]
        );
    }

    #[test]
    fn test_encode_empty_has_headers() {
        let grid = encode(&[], Category::Invoices);
        assert_eq!(grid.rows().len(), 1);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_decode_encode_preserves_content() {
        let cases = vec![
            (
                Category::Income,
                vec![
                    Record::Income(Entry::new("2024-01-01", "Sale", "Sales", 100.005)),
                    Record::Income(Entry::new("1/5/2024", "", "Consulting", 0.0)),
                ],
            ),
            (
                Category::Expenses,
                vec![
                    Record::Expense(Entry::new("2024/02/03", "Paper", "Office Supplies", 12.5)),
                    Record::Expense(Entry::new("2024-02-04", "", "Refunds", -20.0)),
                ],
            ),
            (
                Category::Invoices,
                vec![
                    Record::Invoice(Invoice::new(
                        "INV-001",
                        "Acme",
                        "2024-01-01",
                        "2024-01-31",
                        100.005,
                    )),
                    Record::Invoice(Invoice::new("INV-002", "Globex", "2024-01-02", "", 0.0)),
                ],
            ),
        ];

        for (category, original) in cases {
            let decoded = decode(&encode(&original, category), category);
            assert_eq!(decoded.len(), original.len(), "{category}");
            for (a, b) in original.iter().zip(decoded.iter()) {
                assert!(a.same_content(b), "{category}: {a:?} != {b:?}");
                assert_ne!(a.id(), b.id());
            }
        }
    }
}
