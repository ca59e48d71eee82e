pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod errors;
pub mod lifecycle;
pub mod pairing;
pub mod ranking;
pub mod services;
pub mod standings;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use cli::Cli;

use crate::cli::Command;
use crate::config::AppConfig;
use crate::ranking::{RankingCache, RankingScope, RankingWindow};
use crate::services::{RankingService, ServerService, TournamentService};

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_serve(port: u16) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let config = AppConfig::new();
        let service = ServerService::new(port, config);
        service.run().await
    })
}

pub fn handle_init_db() -> Result<()> {
    let config = AppConfig::new();
    let pool = database::create_pool(&config.database.path)?;
    let mut conn = database::get_connection(&pool)?;
    database::setup::reset_database(&mut conn)?;
    log::info!("Initialized database at {}", config.database.path);
    Ok(())
}

pub fn handle_rankings(store: Option<i64>, window: &str) -> Result<()> {
    let config = AppConfig::new();
    let window: RankingWindow = window.parse().map_err(|e: String| anyhow!(e))?;
    let scope = store.map(RankingScope::Store).unwrap_or(RankingScope::Global);

    let pool = open_database(&config)?;
    let service = RankingService::new(pool, Arc::new(RankingCache::new()));
    let entries = service.rankings(scope, window)?;

    println!("Ranking: {} / {}", scope, window);
    println!("{:>4}  {:>8}  {:>7}  {:>6}  {:>9}  {:>6}", "rank", "player", "points", "played", "W-L-D", "win%");
    for e in entries.iter() {
        println!(
            "{:>4}  {:>8}  {:>7.1}  {:>6}  {:>9}  {:>5.1}%",
            e.rank,
            e.player_id,
            e.points,
            e.tournaments_played,
            format!("{}-{}-{}", e.wins, e.losses, e.draws),
            e.win_rate * 100.0
        );
    }
    Ok(())
}

pub fn handle_standings(tournament_id: i64) -> Result<()> {
    let config = AppConfig::new();
    let pool = open_database(&config)?;
    let service = TournamentService::new(pool, config, Arc::new(RankingCache::new()));

    let tournament = service.tournament(tournament_id)?;
    let standings = service.standings(tournament_id)?;

    println!(
        "{} ({}, round {} of {})",
        tournament.details.name,
        tournament.status(),
        tournament.current_round(),
        tournament.details.total_rounds
    );
    println!("{:>4}  {:>8}  {:>7}  {:>9}  {:>4}  {:>6}", "rank", "player", "points", "W-L-D", "byes", "opp%");
    for s in &standings {
        println!(
            "{:>4}  {:>8}  {:>7.1}  {:>9}  {:>4}  {:>5.1}%",
            s.rank,
            s.player_id,
            s.points,
            format!("{}-{}-{}", s.wins, s.losses, s.draws),
            s.byes,
            s.opponent_win_rate * 100.0
        );
    }
    Ok(())
}

fn open_database(config: &AppConfig) -> Result<database::DbPool> {
    let pool = database::create_pool(&config.database.path)?;
    database::setup::ensure_schema(&mut database::get_connection(&pool)?)?;
    Ok(pool)
}
