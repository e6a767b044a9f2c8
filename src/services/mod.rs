pub mod activity_service;
pub mod feed_service;
pub mod gateway;
pub mod leaderboard_service;
pub mod leveling;
pub mod map_service;
pub mod prompts;
pub mod rewards_service;
pub mod scan_cache;
pub mod scanner_service;
pub mod session_service;

pub use activity_service::ActivityService;
pub use feed_service::FeedService;
pub use gateway::{GatewayClient, GatewayOptions};
pub use leaderboard_service::LeaderboardService;
pub use map_service::MapService;
pub use rewards_service::RewardsService;
pub use scanner_service::ScannerService;
pub use session_service::SessionService;
