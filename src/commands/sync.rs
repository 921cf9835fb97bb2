use crate::api::{self, Mode};
use crate::commands::{load_ledger, Out};
use crate::sync::{push_all, sync_all, PushResult, SyncResult};
use crate::{Config, Result};
use serde::{Deserialize, Serialize};

/// The structured output of `books sync`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncOut {
    pub sync: SyncResult,
    /// Present when the merged records were pushed back to the sheet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push: Option<PushResult>,
}

/// Merges the Google sheet into the local database and, when `push` is set, writes the merged
/// records back to the sheet.
///
/// # Errors
/// - `NotConfigured` if the sheet settings are missing, or if `push` is set and no web app URL is
///   configured.
/// - `RemoteUnavailable` or `RemoteRejected` when talking to the sheet fails. The error names the
///   category that failed.
/// - `Database` if the merged records cannot be stored.
pub async fn sync(mut config: Config, mode: Mode, push: bool) -> Result<Out<SyncOut>> {
    let store = api::store(&config, mode)?;
    let mut ledger = load_ledger(&config).await?;

    let sync = sync_all(&mut config, store.as_ref(), &mut ledger).await?;
    let added: usize = sync.categories.values().map(|c| c.added).sum();

    let push = if push {
        Some(push_all(store.as_ref(), &ledger).await?)
    } else {
        None
    };

    let mut message = format!("Sync complete, {added} new records from the sheet");
    if let Some(pushed) = &push {
        let written: usize = pushed.written.values().sum();
        message.push_str(&format!(", {written} records written to the sheet"));
    }
    Ok(Out::new(message, SyncOut { sync, push }))
}
