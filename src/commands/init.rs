use crate::commands::Out;
use crate::config::RemoteSettings;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the books home directory with:
/// - an initial `config.json` holding the remote settings and default category labels
/// - an empty `books.sqlite` database
///
/// # Arguments
/// - `books_home` - The directory that will be the root of the data, e.g. `$HOME/books`
/// - `remote` - The Google sheet settings. Empty settings are fine, `sync` will report that it is
///   not configured until they are filled in.
///
/// # Errors
/// - Returns a `Config` error if the directory already holds a config file or if any file
///   operation fails.
pub async fn init(books_home: &Path, remote: RemoteSettings) -> Result<Out<()>> {
    let config = Config::create(books_home, remote)
        .await
        .context("Unable to create the books directory and configs")
        .pub_result(ErrorType::Config)?;
    let message = if config.is_configured() {
        format!("Created {}", config.root().display())
    } else {
        format!(
            "Created {}. Add sheet_url and api_key to {} to enable sync",
            config.root().display(),
            config.config_path().display()
        )
    };
    Ok(message.into())
}
