use crate::commands::invoices::refresh_overdue;
use crate::commands::{load_ledger, Out};
use crate::dashboard::Dashboard;
use crate::{utils, Config, Result};

/// Summarizes the current month. Overdue invoices are refreshed first so that the pending count
/// only includes invoices that are not yet past due.
pub async fn dashboard(config: Config) -> Result<Out<Dashboard>> {
    let mut ledger = load_ledger(&config).await?;
    refresh_overdue(&config, &mut ledger).await?;
    let dashboard = Dashboard::new(&ledger, utils::today());
    Ok(Out::new(dashboard.render(), dashboard))
}
