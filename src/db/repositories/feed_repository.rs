use std::convert::TryFrom;

use rusqlite::{named_params, Connection, Row};

use crate::error::AppResult;
use crate::models::stats::FeedItem;

impl TryFrom<&Row<'_>> for FeedItem {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            user_name: row.get("user_name")?,
            kind: row.get("kind")?,
            description: row.get("description")?,
            likes: row.get("likes")?,
            image_url: row.get("image_url")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub struct FeedRepository;

impl FeedRepository {
    pub fn insert(conn: &Connection, item: &FeedItem) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO feed_items
                    (id, user_name, kind, description, likes, image_url, created_at)
                VALUES
                    (:id, :user_name, :kind, :description, :likes, :image_url, :created_at)
            "#,
            named_params! {
                ":id": item.id,
                ":user_name": item.user_name,
                ":kind": item.kind,
                ":description": item.description,
                ":likes": item.likes,
                ":image_url": item.image_url,
                ":created_at": item.created_at,
            },
        )?;

        Ok(())
    }

    pub fn list_recent(conn: &Connection, limit: usize) -> AppResult<Vec<FeedItem>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT id, user_name, kind, description, likes, image_url, created_at
                FROM feed_items
                ORDER BY created_at DESC, id DESC
                LIMIT :limit
            "#,
        )?;

        let items = stmt
            .query_map(named_params! {":limit": limit as i64}, |row| {
                FeedItem::try_from(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    pub fn increment_likes(conn: &Connection, id: &str) -> AppResult<i64> {
        conn.execute(
            "UPDATE feed_items SET likes = likes + 1 WHERE id = ?1",
            [id],
        )?;
        let likes: i64 = conn.query_row(
            "SELECT likes FROM feed_items WHERE id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(likes)
    }
}
