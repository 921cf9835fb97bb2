use books_sync::args::{Args, Command, EntryCommand, InvoiceCommand};
use books_sync::model::Category;
use books_sync::{commands, Config, Mode, RemoteSettings, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().books_home().path();

    // This allows for testing the program without hitting the Google APIs. When
    // BOOKS_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Test,
    // otherwise it will be Mode::Google.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => {
            let remote = RemoteSettings {
                sheet_url: init_args.sheet_url().to_string(),
                api_key: init_args.api_key().to_string(),
                web_app_url: init_args.web_app_url().map(str::to_string),
            };
            commands::init(home, remote).await?.print()
        }

        Command::Sync(sync_args) => {
            let config = Config::load(home).await?;
            commands::sync(config, mode, sync_args.push())
                .await?
                .print()
        }

        Command::Income(entry_args) => {
            entry_command(Config::load(home).await?, Category::Income, entry_args.command()).await?
        }

        Command::Expense(entry_args) => {
            entry_command(
                Config::load(home).await?,
                Category::Expenses,
                entry_args.command(),
            )
            .await?
        }

        Command::Invoice(invoice_args) => {
            let config = Config::load(home).await?;
            match invoice_args.command() {
                InvoiceCommand::Add(args) => {
                    commands::add_invoice(config, args.clone()).await?.print()
                }
                InvoiceCommand::Update(args) => {
                    commands::update_invoice(config, args.clone())
                        .await?
                        .print()
                }
                InvoiceCommand::Pay(args) => commands::pay_invoice(config, args.id()).await?.print(),
                InvoiceCommand::Delete(args) => {
                    commands::delete_invoice(config, args.id()).await?.print()
                }
                InvoiceCommand::List => commands::list_invoices(config).await?.print(),
            }
        }

        Command::Dashboard => commands::dashboard(Config::load(home).await?)
            .await?
            .print(),
    };
    Ok(())
}

async fn entry_command(config: Config, category: Category, command: &EntryCommand) -> Result<()> {
    match command {
        EntryCommand::Add(args) => commands::add_entry(config, category, args.clone())
            .await?
            .print(),
        EntryCommand::Update(args) => commands::update_entry(config, category, args.clone())
            .await?
            .print(),
        EntryCommand::Delete(args) => commands::delete_entry(config, category, args.id())
            .await?
            .print(),
        EntryCommand::List => commands::list_entries(config, category).await?.print(),
    }
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for the library and the binary only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
