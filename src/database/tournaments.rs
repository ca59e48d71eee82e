use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Transaction};

use super::connection::DbConn;
use super::models::{result_columns, MatchRow, RoundRow, TournamentRow};
use crate::domain::{
    PlayerId, RuleSetId, Round, Tournament, TournamentDetails, TournamentId, TournamentStatus,
};
use crate::errors::{load_context, save_context, EngineError};
use crate::lifecycle::LifecycleState;

const COLUMNS: &str = "id, name, location, store_id, starts_at, capacity, total_rounds, round_time_limit_minutes, entry_fee, prize, format, ruleset_id, status, current_round";

/// Stores a new open tournament and returns its id.
pub fn insert(
    conn: &mut DbConn,
    details: &TournamentDetails,
    ruleset_id: RuleSetId,
) -> Result<TournamentId> {
    let sql = "INSERT INTO tournaments (name, location, store_id, starts_at, capacity, total_rounds, round_time_limit_minutes, entry_fee, prize, format, ruleset_id, status, current_round) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0) RETURNING id";

    conn.query_row(
        sql,
        params![
            details.name,
            details.location,
            details.store_id,
            details.starts_at,
            details.capacity,
            details.total_rounds,
            details.round_time_limit_minutes,
            details.entry_fee,
            details.prize,
            details.format,
            ruleset_id,
            TournamentStatus::Open.as_str()
        ],
        |row| row.get(0),
    )
    .context("Failed to insert new tournament")
}

/// Loads the full aggregate: roster, rounds and matches.
pub fn find_by_id(conn: &mut DbConn, id: TournamentId) -> Result<Option<Tournament>> {
    let Some(header) = find_header(conn, id)? else {
        return Ok(None);
    };

    let players = load_players(conn, id)?;
    let rounds = load_rounds(conn, id)?;
    let status = header.status()?;
    let round_closed = rounds.last().is_some_and(|r| r.finalized);

    Ok(Some(Tournament {
        id: header.id,
        details: header.details,
        ruleset_id: header.ruleset_id,
        state: LifecycleState::restore(status, header.current_round, round_closed),
        players,
        rounds,
    }))
}

pub fn get(conn: &mut DbConn, id: TournamentId) -> Result<Tournament> {
    find_by_id(conn, id)?.ok_or_else(|| EngineError::NotFound(format!("tournament {}", id)).into())
}

pub fn list_ids_by_status(conn: &mut DbConn, status: TournamentStatus) -> Result<Vec<TournamentId>> {
    let sql = "SELECT id FROM tournaments WHERE status = ?1 ORDER BY starts_at, id";

    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map(params![status.as_str()], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to list tournaments by status")?;

    Ok(ids)
}

/// Replaces the persisted state of `tournament` in one transaction.
pub fn save(conn: &mut DbConn, tournament: &Tournament) -> Result<()> {
    let tx = conn
        .transaction()
        .with_context(|| save_context("tournament", tournament.id))?;

    let updated = tx.execute(
        "UPDATE tournaments SET status = ?1, current_round = ?2 WHERE id = ?3",
        params![
            tournament.status().as_str(),
            tournament.current_round(),
            tournament.id
        ],
    )?;
    if updated == 0 {
        return Err(EngineError::NotFound(format!("tournament {}", tournament.id)).into());
    }

    replace_players(&tx, tournament.id, &tournament.players)?;
    replace_rounds(&tx, tournament.id, &tournament.rounds)?;

    tx.commit()
        .with_context(|| save_context("tournament", tournament.id))
}

fn replace_players(tx: &Transaction, id: TournamentId, players: &[PlayerId]) -> Result<()> {
    tx.execute(
        "DELETE FROM registrations WHERE tournament_id = ?1",
        params![id],
    )?;

    let mut stmt = tx.prepare(
        "INSERT INTO registrations (tournament_id, player_id, position) VALUES (?1, ?2, ?3)",
    )?;
    for (position, player_id) in players.iter().enumerate() {
        stmt.execute(params![id, player_id, position as i64])
            .with_context(|| format!("Failed to register player {}", player_id))?;
    }
    Ok(())
}

fn replace_rounds(tx: &Transaction, id: TournamentId, rounds: &[Round]) -> Result<()> {
    tx.execute("DELETE FROM matches WHERE tournament_id = ?1", params![id])?;
    tx.execute("DELETE FROM rounds WHERE tournament_id = ?1", params![id])?;

    let mut round_stmt = tx.prepare(
        "INSERT INTO rounds (tournament_id, number, finalized, started_at) VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut match_stmt = tx.prepare(
        "INSERT INTO matches (tournament_id, round_number, table_number, player1, player2, result_kind, winner, reported_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;

    for round in rounds {
        round_stmt.execute(params![id, round.number, round.finalized, round.started_at])?;
        for m in &round.matches {
            let (kind, winner) = result_columns(m.result);
            match_stmt
                .execute(params![
                    id,
                    round.number,
                    m.table,
                    m.player1,
                    m.player2,
                    kind,
                    winner,
                    m.reported_at
                ])
                .with_context(|| {
                    format!("Failed to save round {} table {}", round.number, m.table)
                })?;
        }
    }
    Ok(())
}

fn find_header(conn: &mut DbConn, id: TournamentId) -> Result<Option<TournamentRow>> {
    let sql = format!("SELECT {} FROM tournaments WHERE id = ?1", COLUMNS);

    conn.query_row(&sql, params![id], parse_tournament_row)
        .optional()
        .with_context(|| load_context("tournament", id))
}

fn load_players(conn: &mut DbConn, id: TournamentId) -> Result<Vec<PlayerId>> {
    let sql = "SELECT player_id FROM registrations WHERE tournament_id = ?1 ORDER BY position";

    let mut stmt = conn.prepare(sql)?;
    let players = stmt
        .query_map(params![id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| load_context("registrations of tournament", id))?;

    Ok(players)
}

fn load_rounds(conn: &mut DbConn, id: TournamentId) -> Result<Vec<Round>> {
    let round_rows = {
        let sql = "SELECT number, finalized, started_at FROM rounds WHERE tournament_id = ?1 ORDER BY number";
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![id], parse_round_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| load_context("rounds of tournament", id))?;
        rows
    };

    let match_rows = {
        let sql = "SELECT round_number, table_number, player1, player2, result_kind, winner, reported_at FROM matches WHERE tournament_id = ?1 ORDER BY round_number, table_number";
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![id], parse_match_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| load_context("matches of tournament", id))?;
        rows
    };

    let mut rounds: Vec<Round> = round_rows
        .into_iter()
        .map(|r| Round {
            number: r.number,
            matches: Vec::new(),
            finalized: r.finalized,
            started_at: r.started_at,
        })
        .collect();

    for row in match_rows {
        let number = row.round_number;
        let round = rounds
            .iter_mut()
            .find(|r| r.number == number)
            .ok_or_else(|| {
                EngineError::DataIntegrityViolation(format!(
                    "tournament {} has matches for missing round {}",
                    id, number
                ))
            })?;
        round.matches.push(row.into_match()?);
    }

    Ok(rounds)
}

fn parse_tournament_row(row: &rusqlite::Row) -> rusqlite::Result<TournamentRow> {
    Ok(TournamentRow {
        id: row.get(0)?,
        details: TournamentDetails {
            name: row.get(1)?,
            location: row.get(2)?,
            store_id: row.get(3)?,
            starts_at: row.get(4)?,
            capacity: row.get(5)?,
            total_rounds: row.get(6)?,
            round_time_limit_minutes: row.get(7)?,
            entry_fee: row.get(8)?,
            prize: row.get(9)?,
            format: row.get(10)?,
        },
        ruleset_id: row.get(11)?,
        status: row.get(12)?,
        current_round: row.get(13)?,
    })
}

fn parse_round_row(row: &rusqlite::Row) -> rusqlite::Result<RoundRow> {
    Ok(RoundRow {
        number: row.get(0)?,
        finalized: row.get(1)?,
        started_at: row.get(2)?,
    })
}

fn parse_match_row(row: &rusqlite::Row) -> rusqlite::Result<MatchRow> {
    Ok(MatchRow {
        round_number: row.get(0)?,
        table: row.get(1)?,
        player1: row.get(2)?,
        player2: row.get(3)?,
        result_kind: row.get(4)?,
        winner: row.get(5)?,
        reported_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineSettings;
    use crate::database::{create_memory_pool, get_connection, rulesets, setup::ensure_schema};
    use crate::domain::{MatchResult, PointTable};
    use crate::lifecycle::RoundContext;
    use chrono::{TimeZone, Utc};

    fn details() -> TournamentDetails {
        TournamentDetails {
            name: "Sunday Draft".into(),
            location: "Main floor".into(),
            store_id: 4,
            starts_at: Utc.with_ymd_and_hms(2026, 5, 3, 12, 0, 0).unwrap(),
            capacity: 8,
            total_rounds: 3,
            round_time_limit_minutes: 50,
            entry_fee: 15.5,
            prize: "Store credit".into(),
            format: "draft".into(),
        }
    }

    #[test]
    fn test_saved_aggregate_loads_back_equal() {
        let pool = create_memory_pool().unwrap();
        let mut conn = get_connection(&pool).unwrap();
        ensure_schema(&mut conn).unwrap();

        let ruleset = rulesets::insert(&mut conn, 1, "Standard", PointTable::standard()).unwrap();
        let id = insert(&mut conn, &details(), ruleset.id()).unwrap();
        let mut tournament = get(&mut conn, id).unwrap();
        assert_eq!(tournament.state, LifecycleState::Open);
        assert_eq!(tournament.details, details());

        for player in [30, 10, 20] {
            tournament.register(player).unwrap();
        }
        let settings = EngineSettings::default();
        let ctx = RoundContext {
            ruleset: &ruleset,
            settings: &settings,
            now: Utc.with_ymd_and_hms(2026, 5, 3, 12, 5, 0).unwrap(),
        };
        tournament.start(&ctx).unwrap();
        tournament
            .record_result(1, 1, MatchResult::Winner(10), ctx.now)
            .unwrap();
        tournament.close_round(&ctx).unwrap();
        save(&mut conn, &tournament).unwrap();

        let loaded = get(&mut conn, id).unwrap();
        assert_eq!(loaded, tournament);
        assert_eq!(
            loaded.state,
            LifecycleState::InProgress {
                round: 1,
                round_closed: true
            }
        );
        assert_eq!(loaded.players, vec![30, 10, 20]);
        assert_eq!(
            list_ids_by_status(&mut conn, TournamentStatus::InProgress).unwrap(),
            vec![id]
        );
    }

    #[test]
    fn test_missing_tournament() {
        let pool = create_memory_pool().unwrap();
        let mut conn = get_connection(&pool).unwrap();
        ensure_schema(&mut conn).unwrap();

        assert!(find_by_id(&mut conn, 9).unwrap().is_none());
        let err = get(&mut conn, 9).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::NotFound(_))
        ));
    }
}
