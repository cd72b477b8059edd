use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use shelfstats_core::library::CopyFormat;
use shelfstats_core::models::Shelf;

#[derive(Debug, Parser)]
#[command(author, version, about = "Reading statistics for a LiveLib bookshelf")]
pub struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Also write logs to a file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the whole dashboard (default)
    Show(YearArgs),
    /// Fetch fresh data from the reading site and replace the cache
    Refresh,
    /// List books on a shelf
    Books(BooksArgs),
    /// Show one book, including its synopsis
    Book {
        /// Title, or part of it
        title: String,
    },
    /// Read books grouped by series or cycle
    Series {
        /// Group by numbered cycle instead of series name
        #[arg(long)]
        cycles: bool,
    },
    /// Timeline, rating and genre charts
    Charts,
    /// Reading progress of the current book
    Progress,
    /// Write the dashboard document as JSON
    Export(ExportArgs),
    /// Print a shelf as a plain-text list
    CopyList(CopyListArgs),
    /// Manage progress-service credentials in the OS keychain
    Credentials {
        #[command(subcommand)]
        command: CredentialsCommand,
    },
}

#[derive(Debug, Args, Default)]
pub struct YearArgs {
    /// Year for the reading challenge (defaults to the current year)
    #[arg(long)]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShelfArg {
    Read,
    Reading,
    ToRead,
}

impl From<ShelfArg> for Shelf {
    fn from(value: ShelfArg) -> Self {
        match value {
            ShelfArg::Read => Shelf::Read,
            ShelfArg::Reading => Shelf::CurrentlyReading,
            ShelfArg::ToRead => Shelf::ToRead,
        }
    }
}

#[derive(Debug, Args)]
pub struct BooksArgs {
    #[arg(long, value_enum, default_value_t = ShelfArg::Read)]
    pub shelf: ShelfArg,

    /// date|rating|title|pages, with -asc or -desc
    #[arg(long, default_value = "date-desc")]
    pub sort: String,

    /// Only books tagged with this genre
    #[arg(long)]
    pub genre: Option<String>,

    /// How many pages of 12 to show
    #[arg(long, default_value_t = 1)]
    pub pages: usize,

    /// Show every book
    #[arg(long)]
    pub all: bool,

    /// List the genres available for --genre and exit
    #[arg(long)]
    pub list_genres: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output file; stdout when omitted
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub year: YearArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Simple,
    Ratings,
    Dates,
}

impl From<FormatArg> for CopyFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Simple => CopyFormat::Simple,
            FormatArg::Ratings => CopyFormat::WithRatings,
            FormatArg::Dates => CopyFormat::WithDates,
        }
    }
}

#[derive(Debug, Args)]
pub struct CopyListArgs {
    #[arg(long, value_enum, default_value_t = FormatArg::Simple)]
    pub format: FormatArg,

    #[arg(long, value_enum, default_value_t = ShelfArg::Read)]
    pub shelf: ShelfArg,
}

#[derive(Debug, Subcommand)]
pub enum CredentialsCommand {
    /// Prompt for the API key and user id and store them
    Set,
    /// Show where each credential is resolved from
    Show,
    /// Remove stored credentials
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["shelfstats"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_books_args() {
        let cli = Cli::try_parse_from([
            "shelfstats", "books", "--shelf", "to-read", "--sort", "title-asc", "--all",
        ])
        .unwrap();
        let Some(Command::Books(args)) = cli.command else {
            panic!("expected books command");
        };
        assert_eq!(Shelf::from(args.shelf), Shelf::ToRead);
        assert_eq!(args.sort, "title-asc");
        assert!(args.all);
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["shelfstats", "charts", "--config", "/tmp/c.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
    }

    #[test]
    fn test_copy_list_format() {
        let cli = Cli::try_parse_from(["shelfstats", "copy-list", "--format", "dates"]).unwrap();
        let Some(Command::CopyList(args)) = cli.command else {
            panic!("expected copy-list command");
        };
        assert_eq!(CopyFormat::from(args.format), CopyFormat::WithDates);
    }
}
