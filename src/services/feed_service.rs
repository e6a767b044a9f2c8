use chrono::Utc;
use uuid::Uuid;

use crate::db::repositories::FeedRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::activity::ActivityEntry;
use crate::models::stats::FeedItem;
use crate::services::session_service::SessionService;

const DEFAULT_FEED_LIMIT: usize = 50;

/// Local-only activity feed. Cards are generated from the user's own
/// logged actions and never leave the device.
#[derive(Clone)]
pub struct FeedService {
    db_pool: DbPool,
    session: SessionService,
}

impl FeedService {
    pub fn new(db_pool: DbPool, session: SessionService) -> Self {
        Self { db_pool, session }
    }

    /// Publishes a feed card for a logged activity.
    pub fn publish(&self, entry: &ActivityEntry) -> AppResult<FeedItem> {
        let user = self.session.current_user()?.ok_or(AppError::NoSession)?;

        let item = FeedItem {
            id: Uuid::new_v4().to_string(),
            user_name: user.name,
            kind: entry.kind.as_str().to_string(),
            description: entry.label.clone(),
            likes: 0,
            image_url: None,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.db_pool.get_connection()?;
        FeedRepository::insert(&conn, &item)?;
        Ok(item)
    }

    pub fn recent(&self) -> AppResult<Vec<FeedItem>> {
        let conn = self.db_pool.get_connection()?;
        FeedRepository::list_recent(&conn, DEFAULT_FEED_LIMIT)
    }

    pub fn like(&self, item_id: &str) -> AppResult<i64> {
        let conn = self.db_pool.get_connection()?;
        FeedRepository::increment_likes(&conn, item_id)
    }
}
