use std::sync::Arc;

use anyhow::Result;
use log::debug;

use crate::database::{self, rulesets, tournaments, DbConn, DbPool};
use crate::domain::TournamentStatus;
use crate::ranking::{rebuild_rankings, RankingCache, RankingEntry, RankingScope, RankingWindow, TournamentResult};

/// Serves ranking tables from the cache, rebuilding from finished tournaments on a miss.
pub struct RankingService {
    pool: DbPool,
    cache: Arc<RankingCache>,
}

impl RankingService {
    pub fn new(pool: DbPool, cache: Arc<RankingCache>) -> Self {
        Self { pool, cache }
    }

    pub fn rankings(
        &self,
        scope: RankingScope,
        window: RankingWindow,
    ) -> Result<Arc<Vec<RankingEntry>>> {
        self.cache.get_or_rebuild(scope, window, || {
            let mut conn = database::get_connection(&self.pool)?;
            let results = load_finished_results(&mut conn)?;
            debug!(
                "Cache miss for {} ranking of {}, folding {} finished tournaments",
                window,
                scope,
                results.len()
            );
            Ok(rebuild_rankings(scope, window, &results)?)
        })
    }
}

/// Final standings of every finished tournament, oldest first.
pub fn load_finished_results(conn: &mut DbConn) -> Result<Vec<TournamentResult>> {
    let ids = tournaments::list_ids_by_status(conn, TournamentStatus::Finished)?;

    let mut results = Vec::with_capacity(ids.len());
    for id in ids {
        let tournament = tournaments::get(conn, id)?;
        let ruleset = rulesets::get(conn, tournament.ruleset_id)?;
        results.push(tournament.result(&ruleset)?);
    }
    Ok(results)
}
