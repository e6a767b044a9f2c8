use std::path::Path;
use std::sync::Arc;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::services::{
    ActivityService, FeedService, GatewayClient, GatewayOptions, LeaderboardService, MapService,
    RewardsService, ScannerService, SessionService,
};
use crate::utils::logger;

/// Wires the whole service graph over one data directory. Front ends
/// hold a single AppState and call into the services directly.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub session: SessionService,
    pub activity: ActivityService,
    pub rewards: RewardsService,
    pub map: MapService,
    pub leaderboard: LeaderboardService,
    pub feed: FeedService,
    pub scanner: ScannerService,
}

impl AppState {
    pub fn new(data_dir: &Path) -> AppResult<Self> {
        logger::init_logging(&data_dir.join("logs"))?;
        Self::with_gateway(data_dir, GatewayOptions::from_env())
    }

    /// Same wiring with an explicit gateway configuration. Tests point
    /// this at a mock server with short timeouts.
    pub fn with_gateway(data_dir: &Path, gateway_options: GatewayOptions) -> AppResult<Self> {
        let db_pool = DbPool::new(data_dir.join("saveraks.db"))?;
        let gateway = Arc::new(GatewayClient::new(gateway_options)?);

        let session = SessionService::new(db_pool.clone(), Arc::clone(&gateway));
        let activity = ActivityService::new(db_pool.clone(), Arc::clone(&gateway), session.clone());
        let rewards = RewardsService::new(session.clone(), activity.clone());
        let map = MapService::new(db_pool.clone(), session.clone(), activity.clone());
        let leaderboard = LeaderboardService::new(db_pool.clone(), Arc::clone(&gateway));
        let feed = FeedService::new(db_pool.clone(), session.clone());
        let scanner = ScannerService::new(db_pool.clone())?;

        Ok(Self {
            db_pool,
            session,
            activity,
            rewards,
            map,
            leaderboard,
            feed,
            scanner,
        })
    }
}
