use std::convert::TryFrom;

use rusqlite::{named_params, Connection, Row};
use serde_json::Value as JsonValue;

use crate::error::AppResult;
use crate::models::activity::{ActionKind, ActivityEntry};

impl TryFrom<&Row<'_>> for ActivityEntry {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        let kind_raw: String = row.get("kind")?;
        let kind = ActionKind::parse(&kind_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown action kind: {kind_raw}").into(),
            )
        })?;

        let ai_data_raw: Option<String> = row.get("ai_data")?;
        let ai_data = ai_data_raw.and_then(|raw| serde_json::from_str::<JsonValue>(&raw).ok());

        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            kind,
            category: row.get("category")?,
            label: row.get("label")?,
            points: row.get("points")?,
            mime_type: row.get("mime_type")?,
            has_evidence: row.get::<_, i64>("has_evidence")? != 0,
            ai_data,
            remote_ack: row.get::<_, i64>("remote_ack")? != 0,
            created_at: row.get("created_at")?,
        })
    }
}

pub struct ActivityRepository;

impl ActivityRepository {
    pub fn insert(conn: &Connection, entry: &ActivityEntry) -> AppResult<()> {
        let ai_data = match &entry.ai_data {
            Some(value) => Some(serde_json::to_string(value)?),
            None => None,
        };

        conn.execute(
            r#"
                INSERT INTO activity_log
                    (id, user_id, kind, category, label, points,
                     mime_type, has_evidence, ai_data, remote_ack, created_at)
                VALUES
                    (:id, :user_id, :kind, :category, :label, :points,
                     :mime_type, :has_evidence, :ai_data, :remote_ack, :created_at)
            "#,
            named_params! {
                ":id": entry.id,
                ":user_id": entry.user_id,
                ":kind": entry.kind.as_str(),
                ":category": entry.category,
                ":label": entry.label,
                ":points": entry.points,
                ":mime_type": entry.mime_type,
                ":has_evidence": entry.has_evidence as i64,
                ":ai_data": ai_data,
                ":remote_ack": entry.remote_ack as i64,
                ":created_at": entry.created_at,
            },
        )?;

        Ok(())
    }

    pub fn list_for_user(
        conn: &Connection,
        user_id: &str,
        limit: usize,
    ) -> AppResult<Vec<ActivityEntry>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT id, user_id, kind, category, label, points,
                       mime_type, has_evidence, ai_data, remote_ack, created_at
                FROM activity_log
                WHERE user_id = :user_id
                ORDER BY created_at DESC, id DESC
                LIMIT :limit
            "#,
        )?;

        let rows = stmt
            .query_map(
                named_params! {":user_id": user_id, ":limit": limit as i64},
                |row| ActivityEntry::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Sum of declared points for entries the remote never acknowledged.
    /// This is the local correction applied on top of remote totals.
    pub fn unacked_points(conn: &Connection, user_id: &str) -> AppResult<i64> {
        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(points), 0) FROM activity_log
             WHERE user_id = ?1 AND remote_ack = 0",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    pub fn count_for_user(conn: &Connection, user_id: &str) -> AppResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM activity_log WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
