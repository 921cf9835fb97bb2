//! Implements `RemoteStore` with in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets (see `BOOKS_IN_TEST_MODE`).

use crate::api::RemoteStore;
use crate::error::{Error, ErrorType, Res};
use crate::model::{Category, Grid};
use crate::{Config, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Cursor;
use std::sync::{LazyLock, Mutex, MutexGuard};
use tracing::{trace, warn};

/// The state of every test spreadsheet, keyed by spreadsheet id. The state outlives any one
/// `TestStore` so that a later command in the same process sees what an earlier one wrote.
static SPREADSHEETS: LazyLock<Mutex<HashMap<String, TestStoreState>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Everything the test store holds for one spreadsheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TestStoreState {
    /// The content of each tab.
    pub(crate) sheets: BTreeMap<Category, Grid>,
    /// Fetching these categories fails with `RemoteUnavailable`.
    pub(crate) fail_fetch: BTreeSet<Category>,
    /// Writing these categories fails with `RemoteRejected`.
    pub(crate) fail_write: BTreeSet<Category>,
    /// The number of fetch calls made, including failed ones.
    pub(crate) fetches: usize,
    /// The number of write calls made, including failed ones.
    pub(crate) writes: usize,
}

impl TestStoreState {
    /// A state holding the seed data of this module.
    pub(crate) fn seeded() -> Self {
        let mut sheets = BTreeMap::new();
        for (category, data) in [
            (Category::Income, INCOME_DATA),
            (Category::Expenses, EXPENSE_DATA),
            (Category::Invoices, INVOICE_DATA),
        ] {
            match load_csv(data) {
                Ok(grid) => {
                    sheets.insert(category, grid);
                }
                Err(e) => warn!("Unable to load the {category} seed data: {e:#}"),
            }
        }
        Self {
            sheets,
            ..Self::default()
        }
    }
}

/// An implementation of `RemoteStore` that does not use Google sheets.
pub(crate) struct TestStore {
    spreadsheet_id: String,
    configured: bool,
    writable: bool,
}

impl TestStore {
    /// A test store for `spreadsheet_id`. The first time a spreadsheet id is seen its state is
    /// seeded with the data in this module.
    pub(crate) fn new(spreadsheet_id: impl Into<String>, configured: bool, writable: bool) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            configured,
            writable,
        }
    }

    /// A test store that is configured exactly as far as `config` is.
    pub(crate) fn from_config(config: &Config) -> Self {
        Self::new(
            config.spreadsheet_id(),
            config.is_configured(),
            config.web_app_url().is_some(),
        )
    }

    #[cfg(test)]
    pub(crate) fn get_state(&self) -> TestStoreState {
        self.with_state(|state| state.clone())
    }

    #[cfg(test)]
    pub(crate) fn set_state(&self, state: TestStoreState) {
        self.with_state(|current| *current = state)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut TestStoreState) -> T) -> T {
        let mut map = lock();
        let state = map
            .entry(self.spreadsheet_id.clone())
            .or_insert_with(TestStoreState::seeded);
        f(state)
    }
}

fn lock() -> MutexGuard<'static, HashMap<String, TestStoreState>> {
    // A panic while holding the lock cannot leave the map half-updated, so poisoning is ignored.
    SPREADSHEETS.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait::async_trait]
impl RemoteStore for TestStore {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn fetch(&self, category: Category) -> Result<Grid> {
        trace!("test fetch {category}");
        self.with_state(|state| {
            state.fetches += 1;
            if !self.configured {
                return Err(Error::msg(
                    ErrorType::RemoteUnavailable,
                    "The test spreadsheet is not configured",
                )
                .in_category(category));
            }
            if state.fail_fetch.contains(&category) {
                return Err(Error::msg(
                    ErrorType::RemoteUnavailable,
                    "Simulated network failure",
                )
                .in_category(category));
            }
            Ok(state.sheets.get(&category).cloned().unwrap_or_default())
        })
    }

    async fn write(&self, category: Category, grid: &Grid) -> Result<()> {
        trace!("test write {category}");
        self.with_state(|state| {
            state.writes += 1;
            if !self.writable {
                return Err(
                    Error::msg(ErrorType::NotConfigured, "No web_app_url is configured")
                        .in_category(category),
                );
            }
            if state.fail_write.contains(&category) {
                return Err(
                    Error::msg(ErrorType::RemoteRejected, "Sheet is protected")
                        .in_category(category),
                );
            }
            state.sheets.insert(category, grid.clone());
            Ok(())
        })
    }
}

/// Loads a grid from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Res<Grid> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut grid = Grid::default();
    for result in rdr.records() {
        let record = result?;
        grid.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(grid)
}

/// Seed income data. Dates and amounts are formatted the way a sheet tends to show them.
const INCOME_DATA: &str = r##"Date,Description,Category,Amount
1/15/2024,Website redesign for Acme,Services,"$2,400.00"
1/22/2024,Consulting retainer,Services,$750.00
2/1/2024,Savings interest,Interest,$12.37
2/9/2024,Template sales,Sales,$189.99
"##;

/// Seed expense data.
const EXPENSE_DATA: &str = r##"Date,Description,Category,Amount
1/3/2024,Office rent January,Rent,"$1,200.00"
1/10/2024,Printer paper and toner,Office Supplies,$86.45
1/28/2024,Design software subscription,Software,$54.99
2/3/2024,Office rent February,Rent,"$1,200.00"
"##;

/// Seed invoice data.
const INVOICE_DATA: &str = r##"Invoice #,Client,Date,Due Date,Amount,Status
INV-001,Acme Corp,1/15/2024,2/14/2024,"$2,400.00",Paid
INV-002,Globex,2/1/2024,3/2/2024,$980.00,pending
INV-003,Initech,2/10/2024,3/11/2024,$1500,
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn new_store() -> TestStore {
        TestStore::new(Uuid::new_v4().to_string(), true, true)
    }

    #[test]
    fn test_seed_data_loads() {
        let state = TestStoreState::seeded();
        assert_eq!(state.sheets[&Category::Income].len(), 4);
        assert_eq!(state.sheets[&Category::Expenses].len(), 4);
        assert_eq!(state.sheets[&Category::Invoices].len(), 3);
        assert_eq!(
            state.sheets[&Category::Income].rows()[1][3],
            "$2,400.00"
        );
    }

    #[tokio::test]
    async fn test_write_then_fetch() {
        let store = new_store();
        let grid = Grid::new(vec![vec!["Date"], vec!["2024-01-01"]]);
        store.write(Category::Income, &grid).await.unwrap();
        assert_eq!(store.fetch(Category::Income).await.unwrap(), grid);
        let state = store.get_state();
        assert_eq!(state.fetches, 1);
        assert_eq!(state.writes, 1);
    }

    #[tokio::test]
    async fn test_state_is_shared_by_spreadsheet_id() {
        let a = new_store();
        let b = TestStore::new(a.spreadsheet_id.clone(), true, true);
        b.write(Category::Invoices, &Grid::default()).await.unwrap();
        assert_eq!(a.fetch(Category::Invoices).await.unwrap(), Grid::default());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = new_store();
        let mut state = store.get_state();
        state.fail_fetch.insert(Category::Expenses);
        state.fail_write.insert(Category::Invoices);
        store.set_state(state);

        let err = store.fetch(Category::Expenses).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::RemoteUnavailable);
        assert_eq!(err.category(), Some(Category::Expenses));
        assert!(store.fetch(Category::Income).await.is_ok());

        let err = store
            .write(Category::Invoices, &Grid::default())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::RemoteRejected);
    }

    #[tokio::test]
    async fn test_not_writable() {
        let store = TestStore::new(Uuid::new_v4().to_string(), true, false);
        let err = store
            .write(Category::Income, &Grid::default())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotConfigured);
    }
}
