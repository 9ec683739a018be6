pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::SourceKind;

#[derive(Parser)]
#[command(name = "lifeprogress")]
#[command(about = "Rotating quotes, history and almanac entries for the Life Progress dashboard", long_about = None)]
pub struct Cli {
    /// Database file (default: <data dir>/lifeprogress/lifeprogress.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the content for the selected source, letting a started refill finish (up to 15s)
    Show {
        /// Ask for a fresh item instead of the next pooled one
        #[arg(short, long)]
        refresh: bool,
    },
    /// Print or change the selected content source
    Source {
        /// quote, history or almanac
        kind: Option<SourceKind>,
    },
    /// Fill the quote pool up to capacity and wait for it
    Refill {
        #[arg(short, long, default_value_t = SourceKind::Quote)]
        source: SourceKind,
    },
    /// Inspect or clear a source's cache
    Cache {
        kind: SourceKind,

        /// Remove the cache record
        #[arg(long)]
        clear: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_show_refresh() {
        let cli = Cli::try_parse_from(["lifeprogress", "show", "--refresh"]).unwrap();
        assert!(matches!(cli.command, Commands::Show { refresh: true }));
    }

    #[test]
    fn test_parse_source_kind() {
        let cli = Cli::try_parse_from(["lifeprogress", "source", "almanac"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Source {
                kind: Some(SourceKind::Almanac)
            }
        ));

        assert!(Cli::try_parse_from(["lifeprogress", "source", "weather"]).is_err());
    }

    #[test]
    fn test_refill_defaults_to_quote() {
        let cli = Cli::try_parse_from(["lifeprogress", "--db", "/tmp/x.db", "refill"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(
            cli.command,
            Commands::Refill {
                source: SourceKind::Quote
            }
        ));
    }
}
