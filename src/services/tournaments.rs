use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;

use crate::config::AppConfig;
use crate::database::{self, rulesets, tournaments, DbPool};
use crate::domain::{
    Match, MatchResult, PlayerId, PointTable, RuleSetId, Round, ScoreRuleSet, Tournament,
    TournamentDetails, TournamentId,
};
use crate::errors::EngineResult;
use crate::lifecycle::{RoundAdvance, RoundContext};
use crate::ranking::{RankingCache, TournamentResult};
use crate::standings::Standing;

/// Runs tournament operations against the database.
///
/// Every mutation of a tournament loads it, applies one operation and saves it
/// while holding that tournament's lock, so concurrent requests for the same
/// tournament are serialized. Different tournaments never share a lock.
pub struct TournamentService {
    pool: DbPool,
    config: AppConfig,
    locks: Mutex<HashMap<TournamentId, Arc<Mutex<()>>>>,
    rankings: Arc<RankingCache>,
}

impl TournamentService {
    pub fn new(pool: DbPool, config: AppConfig, rankings: Arc<RankingCache>) -> Self {
        Self {
            pool,
            config,
            locks: Mutex::new(HashMap::new()),
            rankings,
        }
    }

    pub fn create_ruleset(&self, tcg_id: i64, name: &str, points: PointTable) -> Result<ScoreRuleSet> {
        let mut conn = database::get_connection(&self.pool)?;
        let ruleset = rulesets::insert(&mut conn, tcg_id, name, points)?;
        info!("Created ruleset {} ({})", ruleset.id(), ruleset.name());
        Ok(ruleset)
    }

    pub fn ruleset(&self, id: RuleSetId) -> Result<ScoreRuleSet> {
        let mut conn = database::get_connection(&self.pool)?;
        rulesets::get(&mut conn, id)
    }

    pub fn list_rulesets(&self) -> Result<Vec<ScoreRuleSet>> {
        let mut conn = database::get_connection(&self.pool)?;
        rulesets::list_all(&mut conn)
    }

    pub fn update_ruleset(&self, id: RuleSetId, points: PointTable) -> Result<ScoreRuleSet> {
        let mut conn = database::get_connection(&self.pool)?;
        rulesets::update(&mut conn, id, points)
    }

    pub fn revise_ruleset(&self, id: RuleSetId, points: PointTable) -> Result<ScoreRuleSet> {
        let mut conn = database::get_connection(&self.pool)?;
        rulesets::revise(&mut conn, id, points)
    }

    pub fn create_tournament(
        &self,
        details: TournamentDetails,
        ruleset_id: RuleSetId,
    ) -> Result<Tournament> {
        let mut conn = database::get_connection(&self.pool)?;
        rulesets::get(&mut conn, ruleset_id)?;
        let mut tournament = Tournament::create(0, details, ruleset_id)?;

        tournament.id = tournaments::insert(&mut conn, &tournament.details, ruleset_id)?;
        info!(
            "Created tournament {} '{}' ({} rounds, {} seats)",
            tournament.id,
            tournament.details.name,
            tournament.details.total_rounds,
            tournament.details.capacity
        );
        Ok(tournament)
    }

    pub fn tournament(&self, id: TournamentId) -> Result<Tournament> {
        let mut conn = database::get_connection(&self.pool)?;
        tournaments::get(&mut conn, id)
    }

    pub fn register(&self, id: TournamentId, player_id: PlayerId) -> Result<Tournament> {
        self.mutate(id, |t, _| {
            t.register(player_id)?;
            Ok(t.clone())
        })
    }

    pub fn unregister(&self, id: TournamentId, player_id: PlayerId) -> Result<Tournament> {
        self.mutate(id, |t, _| {
            t.unregister(player_id)?;
            Ok(t.clone())
        })
    }

    pub fn start(&self, id: TournamentId) -> Result<Round> {
        self.mutate(id, |t, ctx| t.start(ctx).cloned())
    }

    pub fn record_result(
        &self,
        id: TournamentId,
        round: u32,
        table: u32,
        result: MatchResult,
    ) -> Result<Match> {
        self.mutate(id, |t, ctx| {
            t.record_result(round, table, result, ctx.now).cloned()
        })
    }

    pub fn correct_result(
        &self,
        id: TournamentId,
        round: u32,
        table: u32,
        result: MatchResult,
    ) -> Result<Match> {
        self.mutate(id, |t, ctx| {
            t.correct_result(round, table, result, ctx.now).cloned()
        })
    }

    pub fn close_round(&self, id: TournamentId) -> Result<Vec<Standing>> {
        self.mutate(id, |t, ctx| t.close_round(ctx))
    }

    pub fn advance_round(&self, id: TournamentId) -> Result<RoundAdvance> {
        let (advance, store_id, starts_at) = self.mutate(id, |t, ctx| {
            let advance = t.advance_round(ctx)?;
            Ok((advance, t.details.store_id, t.details.starts_at))
        })?;

        if let RoundAdvance::Finished { .. } = advance {
            self.rankings.invalidate(store_id, starts_at);
        }
        Ok(advance)
    }

    pub fn cancel(&self, id: TournamentId) -> Result<Tournament> {
        self.mutate(id, |t, _| {
            t.cancel()?;
            Ok(t.clone())
        })
    }

    /// Live standings over the finalized rounds.
    pub fn standings(&self, id: TournamentId) -> Result<Vec<Standing>> {
        Ok(self.result(id)?.standings)
    }

    pub fn result(&self, id: TournamentId) -> Result<TournamentResult> {
        let mut conn = database::get_connection(&self.pool)?;
        let tournament = tournaments::get(&mut conn, id)?;
        let ruleset = rulesets::get(&mut conn, tournament.ruleset_id)?;
        Ok(tournament.result(&ruleset)?)
    }

    fn mutate<T, F>(&self, id: TournamentId, operation: F) -> Result<T>
    where
        F: FnOnce(&mut Tournament, &RoundContext<'_>) -> EngineResult<T>,
    {
        let lock = self.lock_for(id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut conn = database::get_connection(&self.pool)?;
        let mut tournament = tournaments::get(&mut conn, id)?;
        let ruleset = rulesets::get(&mut conn, tournament.ruleset_id)?;
        let ctx = RoundContext {
            ruleset: &ruleset,
            settings: &self.config.engine,
            now: Utc::now(),
        };

        let output = operation(&mut tournament, &ctx)?;
        tournaments::save(&mut conn, &tournament)
            .with_context(|| format!("Failed to persist tournament {}", id))?;
        Ok(output)
    }

    fn lock_for(&self, id: TournamentId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(id).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{create_memory_pool, get_connection, setup::ensure_schema};
    use crate::domain::TournamentStatus;
    use crate::errors::EngineError;
    use crate::lifecycle::LifecycleState;
    use crate::ranking::{RankingScope, RankingWindow};
    use chrono::TimeZone;

    fn service() -> TournamentService {
        let pool = create_memory_pool().unwrap();
        ensure_schema(&mut get_connection(&pool).unwrap()).unwrap();
        TournamentService::new(pool, AppConfig::default(), Arc::new(RankingCache::new()))
    }

    fn details(total_rounds: u32) -> TournamentDetails {
        TournamentDetails {
            name: "Weekly".into(),
            location: "Store".into(),
            store_id: 2,
            starts_at: Utc.with_ymd_and_hms(2026, 2, 6, 18, 0, 0).unwrap(),
            capacity: 16,
            total_rounds,
            round_time_limit_minutes: 45,
            entry_fee: 5.0,
            prize: String::new(),
            format: "standard".into(),
        }
    }

    fn engine_error(err: &anyhow::Error) -> Option<&EngineError> {
        err.downcast_ref::<EngineError>()
    }

    #[test]
    fn test_failed_operation_leaves_stored_state_unchanged() {
        let service = service();
        let ruleset = service.create_ruleset(1, "Standard", PointTable::standard()).unwrap();
        let t = service.create_tournament(details(2), ruleset.id()).unwrap();
        service.register(t.id, 1).unwrap();

        let err = service.start(t.id).unwrap_err();
        assert_eq!(
            engine_error(&err),
            Some(&EngineError::PairingInfeasible { active: 1 })
        );
        assert_eq!(service.tournament(t.id).unwrap().status(), TournamentStatus::Open);
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let service = service();
        let err = service.create_tournament(details(2), 99).unwrap_err();
        assert!(matches!(engine_error(&err), Some(EngineError::NotFound(_))));

        let err = service.start(42).unwrap_err();
        assert!(matches!(engine_error(&err), Some(EngineError::NotFound(_))));
    }

    #[test]
    fn test_finishing_invalidates_cached_rankings() {
        let service = service();
        let ruleset = service.create_ruleset(1, "Standard", PointTable::standard()).unwrap();
        let t = service.create_tournament(details(1), ruleset.id()).unwrap();
        service.register(t.id, 1).unwrap();
        service.register(t.id, 2).unwrap();

        let round = service.start(t.id).unwrap();
        assert_eq!(round.matches.len(), 1);
        service
            .record_result(t.id, 1, 1, MatchResult::Winner(2))
            .unwrap();
        service.close_round(t.id).unwrap();

        service
            .rankings
            .get_or_rebuild(RankingScope::Global, RankingWindow::AllTime, || Ok(Vec::new()))
            .unwrap();
        service
            .rankings
            .get_or_rebuild(RankingScope::Store(3), RankingWindow::AllTime, || Ok(Vec::new()))
            .unwrap();
        assert_eq!(service.rankings.len(), 2);

        let advance = service.advance_round(t.id).unwrap();
        assert!(matches!(advance, RoundAdvance::Finished { .. }));
        assert_eq!(service.rankings.len(), 1);
    }

    #[test]
    fn test_ruleset_in_use_after_start() {
        let service = service();
        let ruleset = service.create_ruleset(1, "Standard", PointTable::standard()).unwrap();
        let t = service.create_tournament(details(3), ruleset.id()).unwrap();
        service.register(t.id, 1).unwrap();
        service.register(t.id, 2).unwrap();
        service.start(t.id).unwrap();

        let err = service
            .update_ruleset(ruleset.id(), PointTable::standard())
            .unwrap_err();
        assert_eq!(engine_error(&err), Some(&EngineError::RuleSetInUse(ruleset.id())));

        let revised = service
            .revise_ruleset(ruleset.id(), PointTable::standard())
            .unwrap();
        assert_eq!(revised.version(), 2);
    }

    fn started(service: &TournamentService, players: &[PlayerId]) -> TournamentId {
        let ruleset = service.create_ruleset(1, "Standard", PointTable::standard()).unwrap();
        let t = service.create_tournament(details(3), ruleset.id()).unwrap();
        for &p in players {
            service.register(t.id, p).unwrap();
        }
        service.start(t.id).unwrap();
        t.id
    }

    #[test]
    fn test_concurrent_reports_on_one_table_keep_the_first() {
        let service = service();
        let id = started(&service, &[1, 2]);

        let outcomes: Vec<Result<Match>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let service = &service;
                    s.spawn(move || {
                        let winner = if i % 2 == 0 { 1 } else { 2 };
                        service.record_result(id, 1, 1, MatchResult::Winner(winner))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let accepted: Vec<&Match> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
        assert_eq!(accepted.len(), 1);
        for err in outcomes.iter().filter_map(|o| o.as_ref().err()) {
            assert_eq!(
                engine_error(err),
                Some(&EngineError::MatchAlreadyReported { round: 1, table: 1 })
            );
        }

        let stored = service.tournament(id).unwrap();
        assert_eq!(stored.round(1).unwrap().matches[0].result, accepted[0].result);
    }

    #[test]
    fn test_close_racing_a_late_result_stays_consistent() {
        let service = service();

        for _ in 0..5 {
            let id = started(&service, &[1, 2, 3, 4]);
            service
                .record_result(id, 1, 1, MatchResult::Winner(1))
                .unwrap();

            let (closed, reported) = std::thread::scope(|s| {
                let close = s.spawn(|| service.close_round(id));
                let report = s.spawn(|| service.record_result(id, 1, 2, MatchResult::Winner(3)));
                (close.join().unwrap(), report.join().unwrap())
            });
            assert!(reported.is_ok());

            let stored = service.tournament(id).unwrap();
            let round = stored.round(1).unwrap();
            assert!(round.unreported_tables().is_empty());
            match closed {
                Ok(_) => {
                    assert!(round.finalized);
                    assert_eq!(
                        stored.state,
                        LifecycleState::InProgress {
                            round: 1,
                            round_closed: true
                        }
                    );
                }
                Err(err) => {
                    assert_eq!(
                        engine_error(&err),
                        Some(&EngineError::IncompleteRound {
                            round: 1,
                            missing: vec![2]
                        })
                    );
                    assert!(!round.finalized);
                    assert_eq!(
                        stored.state,
                        LifecycleState::InProgress {
                            round: 1,
                            round_closed: false
                        }
                    );
                }
            }
        }
    }
}

