use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Swiss tournament scoring and ranking engine")]
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
        /// Port number (optional, defaults to 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Drop and recreate the database schema
    #[command(name = "init-db")]
    InitDb,
    /// Print a ranking table built from finished tournaments
    Rankings {
        /// Restrict to one store; global when omitted
        #[arg(short, long)]
        store: Option<i64>,
        /// all, YYYY or YYYY-MM
        #[arg(short, long, default_value = "all")]
        window: String,
    },
    /// Print the live standings of a tournament
    Standings {
        tournament_id: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rankings_flags() {
        let cli = Cli::try_parse_from(["swiss_ranking", "rankings", "--store", "4", "--window", "2026-03"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Rankings {
                store: Some(4),
                window: "2026-03".into()
            }
        );
    }

    #[test]
    fn test_parse_init_db_and_defaults() {
        let cli = Cli::try_parse_from(["swiss_ranking", "init-db"]).unwrap();
        assert_eq!(cli.command, Command::InitDb);

        let cli = Cli::try_parse_from(["swiss_ranking", "serve"]).unwrap();
        assert_eq!(cli.command, Command::Serve { port: 3000 });
    }
}
