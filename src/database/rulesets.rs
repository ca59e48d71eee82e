use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::connection::DbConn;
use super::models::RuleSetRow;
use crate::domain::{PointTable, RuleSetId, ScoreRuleSet, TournamentStatus};
use crate::errors::{load_context, save_context, EngineError};

const COLUMNS: &str =
    "id, tcg_id, name, version, win, loss, draw, opponent_on_win, opponent_on_loss, opponent_on_draw";

/// Stores a new ruleset at version 1.
pub fn insert(conn: &mut DbConn, tcg_id: i64, name: &str, points: PointTable) -> Result<ScoreRuleSet> {
    ScoreRuleSet::new(0, tcg_id, name, 1, points)?;
    insert_version(conn, tcg_id, name, 1, points)
}

fn insert_version(
    conn: &mut DbConn,
    tcg_id: i64,
    name: &str,
    version: u32,
    points: PointTable,
) -> Result<ScoreRuleSet> {
    let sql = format!(
        "INSERT INTO rulesets (tcg_id, name, version, win, loss, draw, opponent_on_win, opponent_on_loss, opponent_on_draw) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) RETURNING {}",
        COLUMNS
    );

    let row = conn
        .query_row(
            &sql,
            params![
                tcg_id,
                name,
                version,
                points.win,
                points.loss,
                points.draw,
                points.opponent_on_win,
                points.opponent_on_loss,
                points.opponent_on_draw
            ],
            parse_ruleset_row,
        )
        .context("Failed to insert new ruleset")?;
    row.into_ruleset()
}

pub fn find_by_id(conn: &mut DbConn, id: RuleSetId) -> Result<Option<ScoreRuleSet>> {
    find_in(conn, id)
}

fn find_in(conn: &Connection, id: RuleSetId) -> Result<Option<ScoreRuleSet>> {
    let sql = format!("SELECT {} FROM rulesets WHERE id = ?1", COLUMNS);

    conn.query_row(&sql, params![id], parse_ruleset_row)
        .optional()
        .with_context(|| load_context("ruleset", id))?
        .map(RuleSetRow::into_ruleset)
        .transpose()
}

pub fn get(conn: &mut DbConn, id: RuleSetId) -> Result<ScoreRuleSet> {
    find_by_id(conn, id)?.ok_or_else(|| EngineError::NotFound(format!("ruleset {}", id)).into())
}

pub fn list_all(conn: &mut DbConn) -> Result<Vec<ScoreRuleSet>> {
    let sql = format!("SELECT {} FROM rulesets ORDER BY tcg_id, name, version", COLUMNS);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_ruleset_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter().map(RuleSetRow::into_ruleset).collect()
}

/// Overwrites the point values in place.
///
/// Fails with [`EngineError::RuleSetInUse`] once any tournament scored with
/// this ruleset has left registration. The check and the write share one
/// immediate transaction, so no tournament can start between them.
pub fn update(conn: &mut DbConn, id: RuleSetId, points: PointTable) -> Result<ScoreRuleSet> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .with_context(|| save_context("ruleset", id))?;

    let current = find_in(&tx, id)?
        .ok_or_else(|| EngineError::NotFound(format!("ruleset {}", id)))?;
    let updated = ScoreRuleSet::new(id, current.tcg_id(), current.name(), current.version(), points)?;

    if count_started_tournaments(&tx, id)? > 0 {
        return Err(EngineError::RuleSetInUse(id).into());
    }

    let sql = "UPDATE rulesets SET win = ?1, loss = ?2, draw = ?3, opponent_on_win = ?4, opponent_on_loss = ?5, opponent_on_draw = ?6 WHERE id = ?7";
    tx.execute(
        sql,
        params![
            points.win,
            points.loss,
            points.draw,
            points.opponent_on_win,
            points.opponent_on_loss,
            points.opponent_on_draw,
            id
        ],
    )
    .with_context(|| save_context("ruleset", id))?;
    tx.commit().with_context(|| save_context("ruleset", id))?;

    log::info!("Updated ruleset {} ({} v{})", id, updated.name(), updated.version());
    Ok(updated)
}

/// Stores `points` as the next version of ruleset `id`, leaving it untouched.
pub fn revise(conn: &mut DbConn, id: RuleSetId, points: PointTable) -> Result<ScoreRuleSet> {
    let current = get(conn, id)?;
    current.next_version(0, points)?;

    let latest = latest_version(conn, current.tcg_id(), current.name())?;
    let revised = insert_version(conn, current.tcg_id(), current.name(), latest + 1, points)?;

    log::info!(
        "Revised ruleset {} as {} ({} v{})",
        id,
        revised.id(),
        revised.name(),
        revised.version()
    );
    Ok(revised)
}

fn latest_version(conn: &mut DbConn, tcg_id: i64, name: &str) -> Result<u32> {
    let sql = "SELECT MAX(version) FROM rulesets WHERE tcg_id = ?1 AND name = ?2";

    let latest: Option<u32> = conn
        .query_row(sql, params![tcg_id, name], |row| row.get(0))
        .context("Failed to query latest ruleset version")?;
    Ok(latest.unwrap_or(0))
}

fn count_started_tournaments(conn: &Connection, id: RuleSetId) -> Result<i64> {
    let sql = "SELECT COUNT(*) FROM tournaments WHERE ruleset_id = ?1 AND status != ?2";

    conn.query_row(sql, params![id, TournamentStatus::Open.as_str()], |row| row.get(0))
        .context("Failed to count tournaments using ruleset")
}

fn parse_ruleset_row(row: &rusqlite::Row) -> rusqlite::Result<RuleSetRow> {
    Ok(RuleSetRow {
        id: row.get(0)?,
        tcg_id: row.get(1)?,
        name: row.get(2)?,
        version: row.get(3)?,
        points: PointTable {
            win: row.get(4)?,
            loss: row.get(5)?,
            draw: row.get(6)?,
            opponent_on_win: row.get(7)?,
            opponent_on_loss: row.get(8)?,
            opponent_on_draw: row.get(9)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{create_memory_pool, get_connection, setup::ensure_schema, DbPool};

    fn setup() -> (DbPool, DbConn) {
        let pool = create_memory_pool().unwrap();
        let mut conn = get_connection(&pool).unwrap();
        ensure_schema(&mut conn).unwrap();
        (pool, conn)
    }

    fn engine_error(err: &anyhow::Error) -> Option<&EngineError> {
        err.downcast_ref::<EngineError>()
    }

    #[test]
    fn test_insert_and_find() {
        let (_pool, mut conn) = setup();
        let stored = insert(&mut conn, 7, "Standard", PointTable::standard()).unwrap();

        assert_eq!(stored.version(), 1);
        let found = find_by_id(&mut conn, stored.id()).unwrap().unwrap();
        assert_eq!(found, stored);
        assert!(find_by_id(&mut conn, stored.id() + 1).unwrap().is_none());
    }

    #[test]
    fn test_insert_rejects_invalid_points() {
        let (_pool, mut conn) = setup();
        let points = PointTable {
            win: -3.0,
            ..PointTable::standard()
        };

        let err = insert(&mut conn, 7, "Broken", points).unwrap_err();
        assert!(matches!(engine_error(&err), Some(EngineError::InvalidRuleSet(_))));
        assert!(list_all(&mut conn).unwrap().is_empty());
    }

    #[test]
    fn test_update_blocked_by_started_tournament() {
        let (_pool, mut conn) = setup();
        let ruleset = insert(&mut conn, 7, "Standard", PointTable::standard()).unwrap();
        let draw_two = PointTable {
            draw: 2.0,
            ..PointTable::standard()
        };
        update(&mut conn, ruleset.id(), draw_two).unwrap();

        conn.execute(
            "INSERT INTO tournaments (name, location, store_id, starts_at, capacity, total_rounds, round_time_limit_minutes, entry_fee, prize, format, ruleset_id, status, current_round) VALUES ('Cup', 'Hall', 1, '2026-01-01T10:00:00Z', 8, 3, 50, 0, '', 'standard', ?1, 'in_progress', 1)",
            params![ruleset.id()],
        )
        .unwrap();

        let err = update(&mut conn, ruleset.id(), PointTable::standard()).unwrap_err();
        assert_eq!(engine_error(&err), Some(&EngineError::RuleSetInUse(ruleset.id())));
        assert_eq!(get(&mut conn, ruleset.id()).unwrap().points().draw, 2.0);
    }

    #[test]
    fn test_revise_creates_next_version() {
        let (_pool, mut conn) = setup();
        let first = insert(&mut conn, 7, "Standard", PointTable::standard()).unwrap();
        let points = PointTable {
            draw: 0.5,
            ..PointTable::standard()
        };

        let second = revise(&mut conn, first.id(), points).unwrap();
        let third = revise(&mut conn, first.id(), points).unwrap();

        assert_eq!(second.version(), 2);
        assert_eq!(third.version(), 3);
        assert_ne!(second.id(), first.id());
        assert_eq!(get(&mut conn, first.id()).unwrap(), first);
        assert_eq!(list_all(&mut conn).unwrap().len(), 3);
    }

    #[test]
    fn test_missing_ruleset_is_not_found() {
        let (_pool, mut conn) = setup();
        let err = update(&mut conn, 42, PointTable::standard()).unwrap_err();
        assert!(matches!(engine_error(&err), Some(EngineError::NotFound(_))));
    }

    #[test]
    fn test_update_waits_for_a_start_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rulesets.db");
        let pool = crate::database::create_pool(path.to_str().unwrap()).unwrap();
        let mut starter = get_connection(&pool).unwrap();
        ensure_schema(&mut starter).unwrap();
        let ruleset = insert(&mut starter, 7, "Standard", PointTable::standard()).unwrap();

        let tx = starter
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .unwrap();
        tx.execute(
            "INSERT INTO tournaments (name, location, store_id, starts_at, capacity, total_rounds, round_time_limit_minutes, entry_fee, prize, format, ruleset_id, status, current_round) VALUES ('Cup', 'Hall', 1, '2026-01-01T10:00:00Z', 8, 3, 50, 0, '', 'standard', ?1, 'in_progress', 1)",
            params![ruleset.id()],
        )
        .unwrap();

        let outcome = std::thread::scope(|s| {
            let editor = s.spawn(|| {
                let mut conn = get_connection(&pool).unwrap();
                let draw_two = PointTable {
                    draw: 2.0,
                    ..PointTable::standard()
                };
                update(&mut conn, ruleset.id(), draw_two)
            });
            std::thread::sleep(std::time::Duration::from_millis(100));
            tx.commit().unwrap();
            editor.join().unwrap()
        });

        let err = outcome.unwrap_err();
        assert_eq!(engine_error(&err), Some(&EngineError::RuleSetInUse(ruleset.id())));
        assert_eq!(get(&mut starter, ruleset.id()).unwrap().points().draw, 1.0);
    }
}
