use crate::error::Res;
use anyhow::Context;
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const ISO_DATE: &str = "%Y-%m-%d";

/// Write a file.
pub(crate) async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Res<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Read a file to a `String`.
pub(crate) async fn read(path: &Path) -> Res<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Create a directory and its parents if they do not exist.
pub(crate) async fn make_dir(path: impl AsRef<Path>) -> Res<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Unable to create directory {}", path.display()))
}

/// Get the absolute path of something that exists.
pub(crate) async fn canonicalize(path: impl AsRef<Path>) -> Res<PathBuf> {
    let path = path.as_ref();
    tokio::fs::canonicalize(path)
        .await
        .with_context(|| format!("Unable to canonicalize {}", path.display()))
}

/// The local calendar date.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(ISO_DATE).to_string()
}

/// Generates a record id: `<unix millis>-<random>`, or `<unix millis>-<ordinal>-<random>` when
/// generating ids for a batch of rows.
pub(crate) fn generate_id(ordinal: Option<usize>) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random = Uuid::new_v4().simple().to_string();
    let suffix = random.get(..9).unwrap_or(&random);
    match ordinal {
        Some(n) => format!("{millis}-{n}-{suffix}"),
        None => format!("{millis}-{suffix}"),
    }
}

/// Spreadsheets like to reformat dates. This brings `M/D/YYYY`, `M/D/YY` and `YYYY/MM/DD` back
/// to `YYYY-MM-DD`. Anything that is not recognized is returned trimmed but otherwise unchanged.
pub(crate) fn normalize_date(s: &str) -> String {
    let trimmed = s.trim();
    match parse_slashed(trimmed) {
        Some(date) => format_date(date),
        None => trimmed.to_string(),
    }
}

/// Parses an ISO date, or any of the forms understood by `normalize_date`.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    NaiveDate::parse_from_str(trimmed, ISO_DATE)
        .ok()
        .or_else(|| parse_slashed(trimmed))
}

fn parse_slashed(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('/').collect();
    let [first, _, last] = parts.as_slice() else {
        return None;
    };
    // %Y would read "24" as the year 24.
    let format = match (first.len(), last.len()) {
        (4, _) => "%Y/%m/%d",
        (_, 4) => "%m/%d/%Y",
        (_, 2) => "%m/%d/%y",
        _ => return None,
    };
    NaiveDate::parse_from_str(s, format).ok()
}
