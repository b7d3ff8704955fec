use clap::{Parser, Subcommand};
use fairway::orchestration::RunMode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Season-long golf pick 'em ledger")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Port number (defaults to PORT or 8080)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Pull data from the golf data source
    Sync {
        /// schedule, field, live, live-with-wd, withdrawals, results, earnings or all
        #[arg(short, long)]
        mode: RunMode,
    },
    /// Reconcile one tournament, or every pending one of the season
    Reconcile {
        /// Local tournament id
        #[arg(short, long)]
        tournament: Option<i64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sync_mode() {
        let cli = Cli::try_parse_from(["fairway", "sync", "--mode", "live-with-wd"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Sync {
                mode: RunMode::LiveWithWd
            }
        );
        assert!(Cli::try_parse_from(["fairway", "sync", "--mode", "hourly"]).is_err());
    }

    #[test]
    fn test_parse_reconcile() {
        let cli = Cli::try_parse_from(["fairway", "reconcile", "-t", "12"]).unwrap();
        assert_eq!(cli.command, Command::Reconcile { tournament: Some(12) });

        let cli = Cli::try_parse_from(["fairway", "reconcile"]).unwrap();
        assert_eq!(cli.command, Command::Reconcile { tournament: None });
    }
}
