use anyhow::Result;

use swiss_ranking::cli::Command;
use swiss_ranking::{handle_init_db, handle_rankings, handle_serve, handle_standings, interpret};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Serve { port } => handle_serve(*port),
        Command::InitDb => handle_init_db(),
        Command::Rankings { store, window } => handle_rankings(*store, window),
        Command::Standings { tournament_id } => handle_standings(*tournament_id),
    }
}
