//! Implements `RemoteStore` over HTTP. Reads go to the Sheets v4 values endpoint using an API key.
//! Writes are POSTed to an Apps Script web app deployed on the sheet, because an API key alone
//! cannot write.

use crate::api::RemoteStore;
use crate::error::{Error, ErrorType, IntoResult, Res};
use crate::model::{cell, Category, Field, Grid};
use crate::{Config, Result};
use anyhow::Context;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const READ_RANGE: &str = "A:Z";
const TIMEOUT: Duration = Duration::from_secs(30);

pub(super) struct GoogleSheet {
    config: Config,
    client: reqwest::Client,
}

impl GoogleSheet {
    pub(super) fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .context("Unable to build the HTTP client")
            .pub_result(ErrorType::Internal)?;
        Ok(Self { config, client })
    }

    fn values_url(&self, category: Category) -> Res<Url> {
        let mut url = Url::parse(SHEETS_API_URL).context("Bad Sheets API URL")?;
        let range = format!("{}!{READ_RANGE}", self.config.sheet_name(category));
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("The Sheets API URL cannot have a path"))?
            .push(self.config.spreadsheet_id())
            .push("values")
            .push(&range);
        url.query_pairs_mut()
            .append_pair("key", self.config.api_key());
        Ok(url)
    }
}

/// The parts of the Sheets API `ValueRange` response that we use. `values` is missing entirely
/// when the tab is empty.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// The reply of the web app.
#[derive(Debug, Deserialize)]
struct WriteReply {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait::async_trait]
impl RemoteStore for GoogleSheet {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn fetch(&self, category: Category) -> Result<Grid> {
        if !self.is_configured() {
            return Err(Error::msg(
                ErrorType::RemoteUnavailable,
                "The spreadsheet id and API key must be configured to read from Google Sheets",
            )
            .in_category(category));
        }
        let url = self
            .values_url(category)
            .pub_result(ErrorType::Internal)
            .map_err(|e| e.in_category(category))?;
        trace!("fetch {category} from sheet '{}'", self.config.sheet_name(category));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Unable to reach Google Sheets")
            .pub_result(ErrorType::RemoteUnavailable)
            .map_err(|e| e.in_category(category))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::msg(
                ErrorType::RemoteUnavailable,
                format!("Google Sheets answered {status}: {body}"),
            )
            .in_category(category));
        }

        let range: ValueRange = response
            .json()
            .await
            .context("Unable to parse the Google Sheets response")
            .pub_result(ErrorType::RemoteUnavailable)
            .map_err(|e| e.in_category(category))?;

        let grid = Grid::new(
            range
                .values
                .iter()
                .map(|row| row.iter().map(cell_text).collect::<Vec<String>>()),
        );
        debug!("Fetched {} {category} rows", grid.len());
        Ok(grid)
    }

    async fn write(&self, category: Category, grid: &Grid) -> Result<()> {
        let web_app_url = self.config.web_app_url().ok_or_else(|| {
            Error::msg(
                ErrorType::NotConfigured,
                "No web_app_url is configured, writing to the sheet requires the Apps Script \
                web app",
            )
            .in_category(category)
        })?;

        let body = serde_json::json!({
            "action": "write",
            "sheet": self.config.sheet_name(category),
            "data": row_objects(grid),
        });
        trace!("write {} {category} rows to the web app", grid.len());

        let response = self
            .client
            .post(web_app_url)
            .json(&body)
            .send()
            .await
            .context("Unable to reach the web app")
            .pub_result(ErrorType::RemoteUnavailable)
            .map_err(|e| e.in_category(category))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::msg(
                ErrorType::RemoteRejected,
                format!("The web app answered {status}: {body}"),
            )
            .in_category(category));
        }

        let reply: WriteReply = response
            .json()
            .await
            .context("Unable to parse the web app response")
            .pub_result(ErrorType::RemoteUnavailable)
            .map_err(|e| e.in_category(category))?;

        if !reply.success {
            let message = reply
                .message
                .unwrap_or_else(|| "Failed to write data".to_string());
            return Err(Error::msg(ErrorType::RemoteRejected, message).in_category(category));
        }
        debug!("Wrote {} {category} rows", grid.len());
        Ok(())
    }
}

/// Cells are normally strings, but a sheet can send numbers or booleans.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Turns each data row into an object keyed by header, in column order. The web app uses the keys
/// of the first object as the header row. Amounts go out as numbers so that the sheet can add
/// them up.
fn row_objects(grid: &Grid) -> Vec<Map<String, Value>> {
    let headers = grid.headers();
    grid.data_rows()
        .iter()
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(ix, header)| {
                    let text = cell(row, ix);
                    let value = match Field::from_key(&header.key()) {
                        Some(Field::Amount) => text
                            .parse::<f64>()
                            .ok()
                            .and_then(serde_json::Number::from_f64)
                            .map(Value::Number)
                            .unwrap_or_else(|| Value::String(text.to_string())),
                        _ => Value::String(text.to_string()),
                    };
                    (header.as_ref().to_string(), value)
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteSettings;
    use tempfile::TempDir;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Value::String("a".into())), "a");
        assert_eq!(cell_text(&serde_json::json!(12.5)), "12.5");
        assert_eq!(cell_text(&serde_json::json!(true)), "true");
        assert_eq!(cell_text(&Value::Null), "");
    }

    #[test]
    fn test_value_range_without_values() {
        let range: ValueRange =
            serde_json::from_str(r#"{"range":"Income!A1:Z1000","majorDimension":"ROWS"}"#)
                .unwrap();
        assert!(range.values.is_empty());
    }

    #[test]
    fn test_row_objects_keep_column_order() {
        let grid = Grid::new(vec![
            vec!["Invoice #", "Client", "Amount", "Status"],
            vec!["INV-001", "Acme", "500.00", "paid"],
            vec!["INV-002"],
        ]);
        let objects = row_objects(&grid);
        assert_eq!(
            serde_json::to_string(&objects[0]).unwrap(),
            r#"{"Invoice #":"INV-001","Client":"Acme","Amount":500.0,"Status":"paid"}"#
        );
        assert_eq!(
            serde_json::to_string(&objects[1]).unwrap(),
            r#"{"Invoice #":"INV-002","Client":"","Amount":"","Status":""}"#
        );
    }

    #[tokio::test]
    async fn test_values_url() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(
            dir.path(),
            RemoteSettings {
                sheet_url: "SHEET123".to_string(),
                api_key: "KEY456".to_string(),
                web_app_url: None,
            },
        )
        .await
        .unwrap();
        let sheet = GoogleSheet::new(config).unwrap();
        let url = sheet.values_url(Category::Expenses).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/SHEET123/values/Expenses!A:Z?key=KEY456"
        );
    }

    #[tokio::test]
    async fn test_write_without_web_app_is_not_configured() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(
            dir.path(),
            RemoteSettings {
                sheet_url: "SHEET123".to_string(),
                api_key: "KEY456".to_string(),
                web_app_url: None,
            },
        )
        .await
        .unwrap();
        let sheet = GoogleSheet::new(config).unwrap();
        let err = sheet
            .write(Category::Income, &Grid::default())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotConfigured);
        assert_eq!(err.category(), Some(Category::Income));
    }
}
