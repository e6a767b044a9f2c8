pub mod activity_repository;
pub mod feed_repository;
pub mod pin_repository;
pub mod scan_cache_repository;
pub mod settings_repository;

pub use activity_repository::ActivityRepository;
pub use feed_repository::FeedRepository;
pub use pin_repository::PinRepository;
pub use scan_cache_repository::ScanCacheRepository;
pub use settings_repository::SettingsRepository;
