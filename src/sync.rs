//! Drives the synchronization between the local database and the remote store.
//!
//! `sync_all` pulls: for each category it fetches the remote tab, decodes it, merges it into the
//! ledger and stores the result. `push_all` does the opposite and overwrites each remote tab with
//! the ledger's records.

use crate::api::RemoteStore;
use crate::codec;
use crate::error::{Error, ErrorType, IntoResult};
use crate::ledger::Ledger;
use crate::model::Category;
use crate::reconcile::{self, StatusConflict};
use crate::{Config, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// What happened to one category during `sync_all`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategorySync {
    /// Records found in the remote tab.
    pub remote: usize,
    /// Remote records that were new to us.
    pub added: usize,
    /// Records held after the merge.
    pub total: usize,
    /// Invoices whose status differs between the two sides. The local status was kept.
    pub status_conflicts: Vec<StatusConflict>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncResult {
    pub categories: BTreeMap<Category, CategorySync>,
    pub last_sync: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PushResult {
    /// The number of records written for each category.
    pub written: BTreeMap<Category, usize>,
}

/// Pulls every category from `store` and merges it into `ledger`, storing each merged category in
/// the database before moving on to the next one.
///
/// # Errors
/// - `NotConfigured` if `store` is not configured. Nothing is fetched.
/// - The first failing category stops the sync. Its error names the category. Categories that
///   were already stored stay stored, later categories are not touched and `last_sync` is not
///   updated.
pub async fn sync_all(
    config: &mut Config,
    store: &dyn RemoteStore,
    ledger: &mut Ledger,
) -> Result<SyncResult> {
    if !store.is_configured() {
        return Err(Error::msg(
            ErrorType::NotConfigured,
            "The remote store is not configured, set sheet_url and api_key in the config file",
        ));
    }

    let mut categories = BTreeMap::new();
    for category in Category::ALL {
        let summary = sync_category(config, store, ledger, category).await?;
        categories.insert(category, summary);
    }

    let last_sync = Utc::now();
    config
        .set_last_sync(last_sync)
        .await
        .pub_result(ErrorType::Config)?;
    info!("Sync complete");
    Ok(SyncResult {
        categories,
        last_sync,
    })
}

async fn sync_category(
    config: &Config,
    store: &dyn RemoteStore,
    ledger: &mut Ledger,
    category: Category,
) -> Result<CategorySync> {
    let grid = store.fetch(category).await?;
    let remote = codec::decode(&grid, category);
    let merged = reconcile::merge(ledger.records(category), &remote, category);

    config
        .db()
        .replace(category, &merged.records)
        .await
        .pub_result(ErrorType::Database)
        .map_err(|e| e.in_category(category))?;

    let summary = CategorySync {
        remote: remote.len(),
        added: merged.added,
        total: merged.records.len(),
        status_conflicts: merged.status_conflicts,
    };
    ledger.replace(category, merged.records);
    debug!(
        "Synced {category}: {} remote, {} added, {} total",
        summary.remote, summary.added, summary.total
    );
    Ok(summary)
}

/// Overwrites every remote tab with the records of `ledger`.
///
/// # Errors
/// The first failing category stops the push and its error names the category. Tabs that were
/// already written stay written.
pub async fn push_all(store: &dyn RemoteStore, ledger: &Ledger) -> Result<PushResult> {
    let mut written = BTreeMap::new();
    for category in Category::ALL {
        let records = ledger.records(category);
        let grid = codec::encode(records, category);
        store.write(category, &grid).await?;
        debug!("Pushed {} {category} records", records.len());
        written.insert(category, records.len());
    }
    info!("Push complete");
    Ok(PushResult { written })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TestStore, TestStoreState};
    use crate::model::{Entry, Grid, Invoice, InvoiceStatus, Record};
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_sync_seeded_store() {
        let env = TestEnv::new().await;
        let mut config = env.config();
        let store = env.store();
        let mut ledger = Ledger::default();

        let result = sync_all(&mut config, &store, &mut ledger).await.unwrap();

        let income = &result.categories[&Category::Income];
        assert_eq!(income.remote, 4);
        assert_eq!(income.added, 4);
        assert_eq!(result.categories[&Category::Invoices].total, 3);
        assert_eq!(ledger.records(Category::Expenses).len(), 4);

        // Everything was stored and the sync time recorded.
        let stored = config.db().load_ledger().await.unwrap();
        assert_eq!(stored, ledger);
        let reloaded = Config::load(config.root()).await.unwrap();
        assert_eq!(reloaded.last_sync(), Some(result.last_sync));
    }

    #[tokio::test]
    async fn test_sync_twice_adds_nothing() {
        let env = TestEnv::new().await;
        let mut config = env.config();
        let store = env.store();
        let mut ledger = Ledger::default();

        sync_all(&mut config, &store, &mut ledger).await.unwrap();
        let first = ledger.clone();
        let result = sync_all(&mut config, &store, &mut ledger).await.unwrap();

        assert!(result.categories.values().all(|c| c.added == 0));
        assert_eq!(first, ledger);
    }

    #[tokio::test]
    async fn test_sync_keeps_local_records() {
        let env = TestEnv::new().await;
        let mut config = env.config();
        let store = env.store();
        let local = Record::Income(Entry::new("2024-03-01", "Local only", "Sales", 10.0));
        let mut ledger = Ledger::default();
        ledger.add(local.clone());

        sync_all(&mut config, &store, &mut ledger).await.unwrap();

        let income = ledger.records(Category::Income);
        assert_eq!(income.len(), 5);
        assert_eq!(income[0], local);
    }

    #[tokio::test]
    async fn test_sync_not_configured_does_no_io() {
        let env = TestEnv::new().await;
        let mut config = env.config();
        let store = TestStore::new(config.spreadsheet_id(), false, false);
        let mut ledger = Ledger::default();

        let err = sync_all(&mut config, &store, &mut ledger)
            .await
            .unwrap_err();

        assert_eq!(err.error_type(), ErrorType::NotConfigured);
        assert_eq!(store.get_state().fetches, 0);
        assert_eq!(config.last_sync(), None);
    }

    #[tokio::test]
    async fn test_sync_failure_keeps_earlier_categories() {
        let env = TestEnv::new().await;
        let mut config = env.config();
        let mut state = TestStoreState::seeded();
        state.fail_fetch.insert(Category::Expenses);
        env.set_state(state);
        let store = env.store();
        let mut ledger = Ledger::default();

        let err = sync_all(&mut config, &store, &mut ledger)
            .await
            .unwrap_err();

        assert_eq!(err.error_type(), ErrorType::RemoteUnavailable);
        assert_eq!(err.category(), Some(Category::Expenses));
        let stored = config.db().load_ledger().await.unwrap();
        assert_eq!(stored.records(Category::Income).len(), 4);
        assert!(stored.records(Category::Expenses).is_empty());
        assert!(stored.records(Category::Invoices).is_empty());
        assert_eq!(env.get_state().fetches, 2);
        assert_eq!(Config::load(config.root()).await.unwrap().last_sync(), None);
    }

    #[tokio::test]
    async fn test_sync_reports_status_conflicts() {
        let env = TestEnv::new().await;
        let mut config = env.config();
        let store = env.store();
        // INV-001 is paid in the seed data.
        let mut ledger = Ledger::default();
        ledger.add(Record::Invoice(Invoice::new(
            "INV-001",
            "Acme Corp",
            "2024-01-15",
            "2024-02-14",
            2400.0,
        )));

        let result = sync_all(&mut config, &store, &mut ledger).await.unwrap();

        let invoices = &result.categories[&Category::Invoices];
        assert_eq!(invoices.total, 3);
        assert_eq!(invoices.status_conflicts.len(), 1);
        assert_eq!(invoices.status_conflicts[0].remote, InvoiceStatus::Paid);
        let kept = ledger.records(Category::Invoices)[0].as_invoice().unwrap();
        assert_eq!(kept.status(), InvoiceStatus::Pending);
    }

    #[tokio::test]
    async fn test_push_all_writes_every_category() {
        let env = TestEnv::new().await;
        let store = env.store();
        let mut ledger = Ledger::default();
        ledger.add(Record::Expense(Entry::new("2024-03-01", "Pens", "Office Supplies", 3.5)));

        let result = push_all(&store, &ledger).await.unwrap();

        assert_eq!(result.written[&Category::Expenses], 1);
        assert_eq!(result.written[&Category::Income], 0);
        let state = env.get_state();
        assert_eq!(
            state.sheets[&Category::Expenses],
            Grid::new(vec![
                vec!["Date", "Description", "Category", "Amount"],
                vec!["2024-03-01", "Pens", "Office Supplies", "3.50"],
            ])
        );
        assert_eq!(state.sheets[&Category::Income].len(), 0);
    }

    #[tokio::test]
    async fn test_push_failure_names_category() {
        let env = TestEnv::new().await;
        let mut state = TestStoreState::seeded();
        state.fail_write.insert(Category::Expenses);
        env.set_state(state);
        let store = env.store();

        let err = push_all(&store, &Ledger::default()).await.unwrap_err();

        assert_eq!(err.error_type(), ErrorType::RemoteRejected);
        assert_eq!(err.category(), Some(Category::Expenses));
        let state = env.get_state();
        assert_eq!(state.writes, 2);
        assert!(state.sheets[&Category::Income].is_empty());
        assert_eq!(state.sheets[&Category::Invoices].len(), 3);
    }
}
