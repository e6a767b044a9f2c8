use chrono::{Duration, Utc};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::db::repositories::scan_cache_repository::{ScanCacheRepository, ScanCacheRow};
use crate::db::DbPool;
use crate::error::AppResult;

/// TTL cache for scanner responses, keyed by operation and image
/// fingerprint. Re-scanning the same photo costs nothing.
#[derive(Clone)]
pub struct ScanCache {
    db_pool: DbPool,
    ttl: Duration,
}

impl ScanCache {
    pub fn new(db_pool: DbPool, ttl: Duration) -> Self {
        Self { db_pool, ttl }
    }

    pub fn get(&self, operation: &str, content_hash: &str) -> AppResult<Option<JsonValue>> {
        let conn = self.db_pool.get_connection()?;
        let now = Utc::now().to_rfc3339();
        let row = ScanCacheRepository::get_fresh(&conn, &cache_key(operation, content_hash), &now)?;

        match row {
            Some(row) => {
                debug!(
                    target: "app::scan::cache",
                    operation,
                    hit_count = row.hit_count + 1,
                    "scan cache hit"
                );
                Ok(serde_json::from_str(&row.response_json).ok())
            }
            None => Ok(None),
        }
    }

    pub fn put(&self, operation: &str, content_hash: &str, response: &JsonValue) -> AppResult<()> {
        let conn = self.db_pool.get_connection()?;
        let now = Utc::now();
        let row = ScanCacheRow {
            cache_key: cache_key(operation, content_hash),
            operation: operation.to_string(),
            content_hash: content_hash.to_string(),
            response_json: serde_json::to_string(response)?,
            created_at: now.to_rfc3339(),
            expires_at: (now + self.ttl).to_rfc3339(),
            hit_count: 0,
        };
        ScanCacheRepository::put(&conn, &row)
    }

    pub fn purge_expired(&self) -> AppResult<usize> {
        let conn = self.db_pool.get_connection()?;
        let removed = ScanCacheRepository::purge_expired(&conn, &Utc::now().to_rfc3339())?;
        if removed > 0 {
            debug!(target: "app::scan::cache", removed, "purged expired scan cache rows");
        }
        Ok(removed)
    }
}

fn cache_key(operation: &str, content_hash: &str) -> String {
    format!("{operation}:{content_hash}")
}
