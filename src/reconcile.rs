//! Merges the records we hold locally with the records fetched from the remote store.
//!
//! There is no shared identity between the two sides: ids are generated locally and the sheet has
//! none. Two records are therefore considered the same when their content is the same (see
//! `Record::same_content`). When a remote record matches one we already have, ours wins.

use crate::model::{Category, InvoiceStatus, Record, RecordId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An invoice that exists on both sides but with a different status. The local status was kept.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StatusConflict {
    pub id: RecordId,
    pub invoice_number: String,
    pub local: InvoiceStatus,
    pub remote: InvoiceStatus,
}

/// The outcome of `merge`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Merged {
    /// The local records, in their original order, followed by the remote records that were new.
    pub records: Vec<Record>,
    /// How many remote records were appended.
    pub added: usize,
    /// How many remote records were dropped because an equal record was already present.
    pub duplicates: usize,
    /// How many records, on either side, were dropped because they do not belong to the category.
    pub invalid: usize,
    pub status_conflicts: Vec<StatusConflict>,
}

/// Merges `remote` into `local`. Never removes a local record and never adds a record that is
/// already present, so merging the same remote data twice changes nothing.
///
/// Records that do not belong to `category` are logged and dropped from whichever side they came
/// from. The merge carries on with the rest.
pub fn merge(local: &[Record], remote: &[Record], category: Category) -> Merged {
    let mut merged = Merged::default();
    let local = valid_only(local, category, "local", &mut merged.invalid);
    let remote = valid_only(remote, category, "remote", &mut merged.invalid);

    merged.records = local.into_iter().cloned().collect();
    for item in remote {
        match merged.records.iter().find(|r| r.same_content(item)) {
            Some(existing) => {
                merged.duplicates += 1;
                if let Some(conflict) = status_conflict(existing, item) {
                    warn!(
                        "Invoice {} is {} locally but {} in the sheet, keeping {}",
                        conflict.invoice_number, conflict.local, conflict.remote, conflict.local
                    );
                    merged.status_conflicts.push(conflict);
                }
            }
            None => {
                merged.records.push(item.clone());
                merged.added += 1;
            }
        }
    }

    debug!(
        "Merged {category}: {} added, {} duplicates, {} invalid, {} total",
        merged.added,
        merged.duplicates,
        merged.invalid,
        merged.records.len()
    );
    merged
}

fn valid_only<'a>(
    records: &'a [Record],
    category: Category,
    side: &str,
    invalid: &mut usize,
) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|r| {
            let ok = r.category() == category;
            if !ok {
                warn!(
                    "Dropping {side} record {} because it is {} but we are merging {category}",
                    r.id(),
                    r.category()
                );
                *invalid += 1;
            }
            ok
        })
        .collect()
}

fn status_conflict(local: &Record, remote: &Record) -> Option<StatusConflict> {
    let (l, r) = (local.as_invoice()?, remote.as_invoice()?);
    if l.status() == r.status() {
        return None;
    }
    Some(StatusConflict {
        id: l.id().clone(),
        invoice_number: l.invoice_number().to_string(),
        local: l.status(),
        remote: r.status(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entry, Invoice};

    fn income(description: &str, amount: f64) -> Record {
        Record::Income(Entry::new("2024-01-01", description, "Sales", amount))
    }

    fn invoice(number: &str, status: InvoiceStatus) -> Record {
        let mut i = Invoice::new(number, "Acme", "2024-01-01", "2024-01-31", 500.0);
        i.status = status;
        Record::Invoice(i)
    }

    #[test]
    fn test_amounts_within_epsilon_are_one_record() {
        let local = vec![income("Sale", 100.0)];
        let remote = vec![income("Sale", 100.005)];
        let merged = merge(&local, &remote, Category::Income);
        assert_eq!(merged.records.len(), 1);
        assert_eq!(merged.records[0].id(), local[0].id());
        assert_eq!(merged.duplicates, 1);
        assert_eq!(merged.added, 0);
    }

    #[test]
    fn test_empty_local_takes_remote_in_order() {
        let remote = vec![
            invoice("INV-001", InvoiceStatus::Pending),
            invoice("INV-002", InvoiceStatus::Pending),
        ];
        let merged = merge(&[], &remote, Category::Invoices);
        assert_eq!(merged.added, 2);
        let numbers: Vec<&str> = merged
            .records
            .iter()
            .map(|r| r.as_invoice().unwrap().invoice_number())
            .collect();
        assert_eq!(numbers, vec!["INV-001", "INV-002"]);
    }

    #[test]
    fn test_status_conflict_local_wins_and_is_reported() {
        let local = vec![invoice("INV-001", InvoiceStatus::Pending)];
        let remote = vec![invoice("INV-001", InvoiceStatus::Paid)];
        let merged = merge(&local, &remote, Category::Invoices);
        assert_eq!(merged.records.len(), 1);
        assert_eq!(
            merged.records[0].as_invoice().unwrap().status(),
            InvoiceStatus::Pending
        );
        assert_eq!(
            merged.status_conflicts,
            vec![StatusConflict {
                id: local[0].id().clone(),
                invoice_number: "INV-001".to_string(),
                local: InvoiceStatus::Pending,
                remote: InvoiceStatus::Paid,
            }]
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let local = vec![income("A", 1.0), income("B", 2.0)];
        let remote = vec![income("B", 2.0), income("C", 3.0)];
        let once = merge(&local, &remote, Category::Income);
        let twice = merge(&once.records, &remote, Category::Income);
        assert_eq!(once.records, twice.records);
        assert_eq!(twice.added, 0);
    }

    #[test]
    fn test_invoice_merge_is_idempotent() {
        let local = vec![invoice("INV-001", InvoiceStatus::Pending)];
        let remote = vec![
            invoice("INV-001", InvoiceStatus::Paid),
            invoice("INV-002", InvoiceStatus::Overdue),
        ];
        let once = merge(&local, &remote, Category::Invoices);
        assert_eq!(once.added, 1);
        let twice = merge(&once.records, &remote, Category::Invoices);
        assert_eq!(once.records, twice.records);
        assert_eq!(twice.added, 0);
        assert_eq!(twice.duplicates, 2);
        assert_eq!(twice.status_conflicts, once.status_conflicts);
    }

    #[test]
    fn test_merge_keeps_local_and_bounds_size() {
        let local = vec![income("A", 1.0), income("A", 1.0), income("B", 2.0)];
        let remote = vec![income("C", 3.0), income("C", 3.0), income("A", 1.0)];
        let merged = merge(&local, &remote, Category::Income);
        assert!(merged.records.len() <= local.len() + remote.len());
        for (ix, record) in local.iter().enumerate() {
            assert_eq!(&merged.records[ix], record);
        }
        // The second remote C matches the first one, which was appended already.
        assert_eq!(merged.records.len(), 4);
        assert_eq!(merged.added, 1);
        assert_eq!(merged.duplicates, 2);
    }

    #[test]
    fn test_wrong_category_is_dropped() {
        let local = vec![income("A", 1.0), invoice("INV-001", InvoiceStatus::Pending)];
        let remote = vec![Record::Expense(Entry::new("2024-01-01", "B", "Rent", 2.0))];
        let merged = merge(&local, &remote, Category::Income);
        assert_eq!(merged.invalid, 2);
        assert_eq!(merged.records.len(), 1);
        assert_eq!(merged.records[0].id(), local[0].id());
    }
}
