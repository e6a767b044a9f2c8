use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;
use crate::models::pin::{MapPin, PinKind, PinStatus};

impl TryFrom<&Row<'_>> for MapPin {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        let kind_raw: String = row.get("kind")?;
        let status_raw: String = row.get("status")?;

        let kind = PinKind::parse(&kind_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown pin kind: {kind_raw}").into(),
            )
        })?;
        let status = PinStatus::parse(&status_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown pin status: {status_raw}").into(),
            )
        })?;

        Ok(Self {
            id: row.get("id")?,
            x: row.get("x")?,
            y: row.get("y")?,
            kind,
            description: row.get("description")?,
            status,
            reported_by: row.get("reported_by")?,
            created_at: row.get("created_at")?,
            resolved_at: row.get("resolved_at")?,
        })
    }
}

const PIN_COLUMNS: &str =
    "id, x, y, kind, description, status, reported_by, created_at, resolved_at";

pub struct PinRepository;

impl PinRepository {
    pub fn insert(conn: &Connection, pin: &MapPin) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO map_pins
                    (id, x, y, kind, description, status, reported_by, created_at, resolved_at)
                VALUES
                    (:id, :x, :y, :kind, :description, :status, :reported_by, :created_at, :resolved_at)
            "#,
            named_params! {
                ":id": pin.id,
                ":x": pin.x,
                ":y": pin.y,
                ":kind": pin.kind.as_str(),
                ":description": pin.description,
                ":status": pin.status.as_str(),
                ":reported_by": pin.reported_by,
                ":created_at": pin.created_at,
                ":resolved_at": pin.resolved_at,
            },
        )?;

        Ok(())
    }

    pub fn get(conn: &Connection, id: &str) -> AppResult<Option<MapPin>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {PIN_COLUMNS} FROM map_pins WHERE id = ?1"
        ))?;
        let pin = stmt
            .query_row([id], |row| MapPin::try_from(row))
            .optional()?;
        Ok(pin)
    }

    pub fn list(conn: &Connection) -> AppResult<Vec<MapPin>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {PIN_COLUMNS} FROM map_pins ORDER BY created_at DESC, id DESC"
        ))?;
        let pins = stmt
            .query_map([], |row| MapPin::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pins)
    }

    pub fn list_open(conn: &Connection) -> AppResult<Vec<MapPin>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {PIN_COLUMNS} FROM map_pins
             WHERE status = 'OPEN'
             ORDER BY created_at DESC, id DESC"
        ))?;
        let pins = stmt
            .query_map([], |row| MapPin::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pins)
    }

    /// Marks a pin resolved. No-op when already resolved, so resolution
    /// stays idempotent and one-way.
    pub fn mark_resolved(conn: &Connection, id: &str, resolved_at: &str) -> AppResult<bool> {
        let changed = conn.execute(
            "UPDATE map_pins SET status = 'RESOLVED', resolved_at = :resolved_at
             WHERE id = :id AND status = 'OPEN'",
            named_params! {":id": id, ":resolved_at": resolved_at},
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbPool;
    use tempfile::TempDir;

    fn pin(id: &str) -> MapPin {
        MapPin {
            id: id.into(),
            x: 42.5,
            y: 17.0,
            kind: PinKind::FullBin,
            description: "Bin overflowing behind building 3".into(),
            status: PinStatus::Open,
            reported_by: Some("u1".into()),
            created_at: "2025-06-01T08:00:00Z".into(),
            resolved_at: None,
        }
    }

    #[test]
    fn resolve_is_one_way_and_idempotent() {
        let dir = TempDir::new().unwrap();
        let pool = DbPool::new(dir.path().join("test.db")).unwrap();
        let conn = pool.get_connection().unwrap();

        PinRepository::insert(&conn, &pin("p1")).unwrap();

        assert!(PinRepository::mark_resolved(&conn, "p1", "2025-06-02T09:00:00Z").unwrap());
        assert!(!PinRepository::mark_resolved(&conn, "p1", "2025-06-03T09:00:00Z").unwrap());

        let stored = PinRepository::get(&conn, "p1").unwrap().unwrap();
        assert_eq!(stored.status, PinStatus::Resolved);
        assert_eq!(stored.resolved_at.as_deref(), Some("2025-06-02T09:00:00Z"));
    }

    #[test]
    fn list_open_excludes_resolved_pins() {
        let dir = TempDir::new().unwrap();
        let pool = DbPool::new(dir.path().join("test.db")).unwrap();
        let conn = pool.get_connection().unwrap();

        PinRepository::insert(&conn, &pin("p1")).unwrap();
        PinRepository::insert(&conn, &pin("p2")).unwrap();
        PinRepository::mark_resolved(&conn, "p1", "2025-06-02T09:00:00Z").unwrap();

        let open = PinRepository::list_open(&conn).unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, "p2");
        assert_eq!(PinRepository::list(&conn).unwrap().len(), 2);
    }
}
