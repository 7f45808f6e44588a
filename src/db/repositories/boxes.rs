use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, to_u32},
    models::{BoxPatch, NewBox, WritingBox},
};
use crate::store::StoreError;

fn row_to_box(row: &Row) -> Result<WritingBox> {
    let perspective_index: i64 = row.get("perspective_index")?;
    let duration_seconds: Option<i64> = row.get("duration_seconds")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(WritingBox {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        perspective_index: to_u32(perspective_index, "perspective_index")?,
        content: row.get("content")?,
        duration_seconds: duration_seconds
            .map(|secs| to_u32(secs, "duration_seconds"))
            .transpose()?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    /// Inserts all boxes of a session in one transaction.
    pub async fn insert_box_rows(&self, boxes: Vec<NewBox>) -> Result<Vec<WritingBox>> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let now = Utc::now();
            let mut inserted = Vec::with_capacity(boxes.len());

            for new_box in boxes {
                let record = WritingBox {
                    id: Uuid::new_v4().to_string(),
                    session_id: new_box.session_id,
                    perspective_index: new_box.perspective_index,
                    content: new_box.content,
                    duration_seconds: new_box.duration_seconds,
                    created_at: now,
                    updated_at: now,
                };
                tx.execute(
                    "INSERT INTO boxes (id, session_id, perspective_index, content, duration_seconds, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        record.id,
                        record.session_id,
                        record.perspective_index,
                        record.content,
                        record.duration_seconds,
                        format_datetime(&record.created_at),
                        format_datetime(&record.updated_at),
                    ],
                )?;
                inserted.push(record);
            }

            tx.commit()?;
            Ok(inserted)
        })
        .await
    }

    pub async fn get_boxes_for_session(&self, session_id: &str) -> Result<Vec<WritingBox>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, perspective_index, content, duration_seconds, created_at, updated_at
                 FROM boxes
                 WHERE session_id = ?1
                 ORDER BY perspective_index ASC",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut boxes = Vec::new();
            while let Some(row) = rows.next()? {
                boxes.push(row_to_box(row)?);
            }
            Ok(boxes)
        })
        .await
    }

    pub async fn patch_box(&self, box_id: &str, patch: BoxPatch) -> Result<()> {
        let box_id = box_id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE boxes
                 SET content = COALESCE(?1, content),
                     duration_seconds = COALESCE(?2, duration_seconds),
                     updated_at = ?3
                 WHERE id = ?4",
                params![
                    patch.content,
                    patch.duration_seconds,
                    format_datetime(&Utc::now()),
                    box_id,
                ],
            )?;
            if rows_affected == 0 {
                return Err(StoreError::not_found("boxes", box_id).into());
            }
            Ok(())
        })
        .await
    }
}
