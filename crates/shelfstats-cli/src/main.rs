//! shelfstats - reading statistics for a LiveLib bookshelf in the terminal.
//!
//! Loads the collection (cache first, then the reading site), applies the
//! bundled overrides and prints dashboard sections as text or JSON.

mod cli;
mod render;

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::Parser;
use shelfstats_core::auth::{CredentialSource, CredentialStore, HardcoverCredentials};
use shelfstats_core::dashboard::BookCard;
use shelfstats_core::models::Shelf;
use shelfstats_core::stats::{self, GroupKind};
use shelfstats_core::{App, Config, DataOrigin};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{BooksArgs, Cli, Command, CopyListArgs, CredentialsCommand, ExportArgs, YearArgs};

/// Log file name inside `--log-dir`
const LOG_FILE_NAME: &str = "shelfstats.log";

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` controls the level (default `warn`). The returned guard must be
/// held until exit so the file writer flushes.
fn init_tracing(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            Ok(None)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => match Config::config_path() {
            // A config file that exists but does not parse is fatal
            Ok(path) => Config::load_or_default(&path),
            Err(e) => {
                warn!(error = %e, "No config directory, using defaults");
                Ok(Config::default())
            }
        },
    }
}

fn year_or_current(args: &YearArgs) -> i32 {
    args.year.unwrap_or_else(|| Local::now().year())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref())?;
    info!("shelfstats starting");

    let config = load_config(cli.config.as_deref())?;
    let command = cli.command.unwrap_or(Command::Show(YearArgs::default()));

    if let Command::Credentials { command } = command {
        return credentials(command, &config);
    }

    let mut app = App::new(config)?;

    if let Command::Refresh = command {
        let state = app.refresh().await?;
        println!(
            "Fetched {} books: {} read, {} reading, {} to read",
            state.all_books.len(),
            state.shelves.read.len(),
            state.shelves.reading.len(),
            state.shelves.to_read.len()
        );
        return Ok(());
    }

    let origin = app.load().await?.origin;
    if origin == DataOrigin::Cache {
        info!("Using cached books; run `shelfstats refresh` for fresh data");
    }

    match command {
        Command::Show(args) => {
            let dashboard = app.build_dashboard(year_or_current(&args)).await?;
            print!("{}", render::dashboard(&dashboard));
        }
        Command::Books(args) => books(&app, args)?,
        Command::Book { title } => book(&mut app, &title).await?,
        Command::Series { cycles } => {
            let kind = if cycles { GroupKind::Cycle } else { GroupKind::Series };
            let read = app.collection(&Shelf::Read)?;
            print!("{}", render::groups(&stats::book_groups(read.books(), kind)));
        }
        Command::Charts => {
            let read = app.collection(&Shelf::Read)?;
            print!(
                "{}",
                render::charts(
                    &stats::timeline(read.books()),
                    &stats::rating_histogram(read.books()),
                    &stats::top_genres(read.books(), stats::TOP_GENRES),
                )
            );
        }
        Command::Progress => progress(&app).await?,
        Command::Export(args) => export(&app, args).await?,
        Command::CopyList(args) => copy_list(&app, args)?,
        Command::Refresh | Command::Credentials { .. } => {}
    }

    Ok(())
}

fn books(app: &App, args: BooksArgs) -> Result<()> {
    let mut collection = app.collection(&Shelf::from(args.shelf))?;

    if args.list_genres {
        for genre in collection.genres() {
            println!("{}", genre);
        }
        return Ok(());
    }

    if let Some(genre) = &args.genre {
        collection = collection.filter_genre(genre);
    }
    collection.sort_by(args.sort.parse()?);

    let shown = if args.all {
        collection.books()
    } else {
        collection.current_page = args.pages.saturating_sub(1);
        collection.visible()
    };

    if shown.is_empty() {
        println!("No books");
        return Ok(());
    }
    for book in shown {
        println!("{}", render::book_line(&BookCard::from_book(book)));
    }
    let remaining = collection.len() - shown.len();
    if remaining > 0 {
        println!("... {} more (use --pages or --all)", remaining);
    }
    Ok(())
}

async fn book(app: &mut App, title: &str) -> Result<()> {
    let book = app
        .find_book(title)?
        .ok_or_else(|| anyhow::anyhow!("No book matching '{}'", title))?;

    let mut card = BookCard::from_book(&book);
    card.annotation = match app.annotation(&book).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %format!("{:#}", e), "Could not load synopsis");
            None
        }
    };
    print!("{}", render::book_detail(&card));
    Ok(())
}

async fn progress(app: &App) -> Result<()> {
    if !app.credentials().is_configured() {
        println!("Progress service not configured (run `shelfstats credentials set`)");
        return Ok(());
    }
    let reading = app.collection(&Shelf::CurrentlyReading)?;
    let Some(book) = reading.books().first() else {
        println!("Nothing on the currently-reading shelf");
        return Ok(());
    };

    println!("{} - {}", book.title, book.display_author());
    match app.current_progress().await {
        Some(snapshot) if snapshot.has_progress() => print!("{}", render::progress_line(&snapshot)),
        _ => println!("  No progress available"),
    }
    Ok(())
}

async fn export(app: &App, args: ExportArgs) -> Result<()> {
    let dashboard = app.build_dashboard(year_or_current(&args.year)).await?;
    let json = serde_json::to_string_pretty(&dashboard)?;
    match args.out {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Dashboard exported");
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn copy_list(app: &App, args: CopyListArgs) -> Result<()> {
    let collection = app.collection(&Shelf::from(args.shelf))?;
    println!("{}", collection.copy_list(args.format.into()));
    Ok(())
}

fn credentials(command: CredentialsCommand, config: &Config) -> Result<()> {
    match command {
        CredentialsCommand::Set => {
            let api_key = rpassword::prompt_password("Progress-service API key: ")
                .context("Failed to read API key")?;
            print!("Progress-service user id: ");
            io::stdout().flush()?;
            let mut user_id = String::new();
            io::stdin()
                .read_line(&mut user_id)
                .context("Failed to read user id")?;

            let api_key = api_key.trim();
            let user_id = user_id.trim();
            if api_key.is_empty() || user_id.is_empty() {
                anyhow::bail!("Both the API key and the user id are required");
            }
            if user_id.parse::<i64>().is_err() {
                anyhow::bail!("The user id must be numeric");
            }
            CredentialStore::store_api_key(api_key)?;
            CredentialStore::store_user_id(user_id)?;
            println!("Credentials saved to the system keychain");
        }
        CredentialsCommand::Show => {
            let creds = HardcoverCredentials::resolve(config);
            let describe = |value: &Option<String>, source: Option<CredentialSource>| match (value, source) {
                (Some(_), Some(source)) => format!("set ({})", source),
                _ => "not set".to_string(),
            };
            println!("API key: {}", describe(&creds.api_key, creds.api_key_source));
            println!("User id: {}", describe(&creds.user_id, creds.user_id_source));
        }
        CredentialsCommand::Clear => {
            CredentialStore::clear()?;
            println!("Stored credentials removed");
        }
    }
    Ok(())
}
