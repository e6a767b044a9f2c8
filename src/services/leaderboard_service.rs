use std::sync::Arc;

use tracing::warn;

use crate::db::repositories::SettingsRepository;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::stats::{LeaderboardEntry, SchoolStats};
use crate::services::gateway::GatewayClient;

const KEY_LEADERBOARD_CACHE: &str = "cache.leaderboard";
const KEY_STATS_CACHE: &str = "cache.school_stats";

/// Read-only school-wide views. Each successful fetch refreshes a local
/// snapshot; when the remote fails the snapshot is served instead, so
/// these screens keep working offline.
#[derive(Clone)]
pub struct LeaderboardService {
    db_pool: DbPool,
    gateway: Arc<GatewayClient>,
}

impl LeaderboardService {
    pub fn new(db_pool: DbPool, gateway: Arc<GatewayClient>) -> Self {
        Self { db_pool, gateway }
    }

    pub async fn leaderboard(&self) -> AppResult<Vec<LeaderboardEntry>> {
        match self.gateway.leaderboard().await {
            Ok(leaders) => {
                let conn = self.db_pool.get_connection()?;
                SettingsRepository::upsert_json(&conn, KEY_LEADERBOARD_CACHE, &leaders)?;
                Ok(leaders)
            }
            Err(err) => {
                warn!(
                    target: "app::leaderboard",
                    error = %err,
                    "leaderboard fetch failed, serving cached snapshot"
                );
                let conn = self.db_pool.get_connection()?;
                let cached =
                    SettingsRepository::get_json::<Vec<LeaderboardEntry>>(&conn, KEY_LEADERBOARD_CACHE)?;
                Ok(cached.unwrap_or_default())
            }
        }
    }

    pub async fn school_stats(&self) -> AppResult<SchoolStats> {
        match self.gateway.school_stats().await {
            Ok(stats) => {
                let conn = self.db_pool.get_connection()?;
                SettingsRepository::upsert_json(&conn, KEY_STATS_CACHE, &stats)?;
                Ok(stats)
            }
            Err(err) => {
                warn!(
                    target: "app::leaderboard",
                    error = %err,
                    "stats fetch failed, serving cached snapshot"
                );
                let conn = self.db_pool.get_connection()?;
                let cached = SettingsRepository::get_json::<SchoolStats>(&conn, KEY_STATS_CACHE)?;
                Ok(cached.unwrap_or_default())
            }
        }
    }
}
