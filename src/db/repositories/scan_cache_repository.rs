use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct ScanCacheRow {
    pub cache_key: String,
    pub operation: String,
    pub content_hash: String,
    pub response_json: String,
    pub created_at: String,
    pub expires_at: String,
    pub hit_count: i64,
}

impl TryFrom<&Row<'_>> for ScanCacheRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            cache_key: row.get("cache_key")?,
            operation: row.get("operation")?,
            content_hash: row.get("content_hash")?,
            response_json: row.get("response_json")?,
            created_at: row.get("created_at")?,
            expires_at: row.get("expires_at")?,
            hit_count: row.get("hit_count")?,
        })
    }
}

pub struct ScanCacheRepository;

impl ScanCacheRepository {
    /// Returns the cached response if one exists and has not expired,
    /// bumping the hit counter.
    pub fn get_fresh(conn: &Connection, cache_key: &str, now: &str) -> AppResult<Option<ScanCacheRow>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT cache_key, operation, content_hash, response_json,
                       created_at, expires_at, hit_count
                FROM scan_cache
                WHERE cache_key = :cache_key AND expires_at > :now
            "#,
        )?;

        let row = stmt
            .query_row(
                named_params! {":cache_key": cache_key, ":now": now},
                |row| ScanCacheRow::try_from(row),
            )
            .optional()?;

        if row.is_some() {
            conn.execute(
                "UPDATE scan_cache SET hit_count = hit_count + 1 WHERE cache_key = ?1",
                [cache_key],
            )?;
        }

        Ok(row)
    }

    pub fn put(conn: &Connection, row: &ScanCacheRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO scan_cache
                    (cache_key, operation, content_hash, response_json,
                     created_at, expires_at, hit_count)
                VALUES
                    (:cache_key, :operation, :content_hash, :response_json,
                     :created_at, :expires_at, 0)
                ON CONFLICT(cache_key) DO UPDATE SET
                    response_json = excluded.response_json,
                    created_at = excluded.created_at,
                    expires_at = excluded.expires_at
            "#,
            named_params! {
                ":cache_key": row.cache_key,
                ":operation": row.operation,
                ":content_hash": row.content_hash,
                ":response_json": row.response_json,
                ":created_at": row.created_at,
                ":expires_at": row.expires_at,
            },
        )?;

        Ok(())
    }

    pub fn purge_expired(conn: &Connection, now: &str) -> AppResult<usize> {
        let removed = conn.execute("DELETE FROM scan_cache WHERE expires_at <= ?1", [now])?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbPool;
    use tempfile::TempDir;

    fn row(key: &str, expires_at: &str) -> ScanCacheRow {
        ScanCacheRow {
            cache_key: key.into(),
            operation: "environment".into(),
            content_hash: "abc123".into(),
            response_json: r#"{"category":"waste"}"#.into(),
            created_at: "2025-06-01T08:00:00Z".into(),
            expires_at: expires_at.into(),
            hit_count: 0,
        }
    }

    #[test]
    fn expired_entries_are_invisible_and_purgeable() {
        let dir = TempDir::new().unwrap();
        let pool = DbPool::new(dir.path().join("test.db")).unwrap();
        let conn = pool.get_connection().unwrap();

        ScanCacheRepository::put(&conn, &row("k1", "2025-06-02T00:00:00Z")).unwrap();
        ScanCacheRepository::put(&conn, &row("k2", "2025-06-30T00:00:00Z")).unwrap();

        let now = "2025-06-10T00:00:00Z";
        assert!(ScanCacheRepository::get_fresh(&conn, "k1", now).unwrap().is_none());
        assert!(ScanCacheRepository::get_fresh(&conn, "k2", now).unwrap().is_some());

        assert_eq!(ScanCacheRepository::purge_expired(&conn, now).unwrap(), 1);
    }

    #[test]
    fn hits_increment_the_counter() {
        let dir = TempDir::new().unwrap();
        let pool = DbPool::new(dir.path().join("test.db")).unwrap();
        let conn = pool.get_connection().unwrap();

        ScanCacheRepository::put(&conn, &row("k1", "2025-06-30T00:00:00Z")).unwrap();
        let now = "2025-06-10T00:00:00Z";
        ScanCacheRepository::get_fresh(&conn, "k1", now).unwrap();
        let second = ScanCacheRepository::get_fresh(&conn, "k1", now).unwrap().unwrap();
        assert_eq!(second.hit_count, 1);
    }
}
