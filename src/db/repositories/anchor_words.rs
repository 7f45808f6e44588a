use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, to_u32, to_u8},
    models::{AnchorWord, NewAnchorWord},
};
use crate::store::StoreError;

fn row_to_anchor_word(row: &Row) -> Result<AnchorWord> {
    let source_box: Option<i64> = row.get("source_box")?;
    let position: i64 = row.get("position")?;
    let created_at: String = row.get("created_at")?;

    Ok(AnchorWord {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        word: row.get("word")?,
        source_box: source_box
            .map(|index| to_u32(index, "source_box"))
            .transpose()?,
        position: to_u8(position, "position")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    pub async fn insert_anchor_word_row(&self, anchor: NewAnchorWord) -> Result<AnchorWord> {
        self.execute(move |conn| {
            let record = AnchorWord {
                id: Uuid::new_v4().to_string(),
                session_id: anchor.session_id,
                word: anchor.word,
                source_box: anchor.source_box,
                position: anchor.position,
                created_at: Utc::now(),
            };
            conn.execute(
                "INSERT INTO anchor_words (id, session_id, word, source_box, position, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.session_id,
                    record.word,
                    record.source_box,
                    record.position,
                    format_datetime(&record.created_at),
                ],
            )?;
            Ok(record)
        })
        .await
    }

    pub async fn get_anchor_words_for_session(&self, session_id: &str) -> Result<Vec<AnchorWord>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, word, source_box, position, created_at
                 FROM anchor_words
                 WHERE session_id = ?1
                 ORDER BY position ASC",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut anchors = Vec::new();
            while let Some(row) = rows.next()? {
                anchors.push(row_to_anchor_word(row)?);
            }
            Ok(anchors)
        })
        .await
    }

    pub async fn rename_anchor_word(&self, anchor_id: &str, word: &str) -> Result<()> {
        let anchor_id = anchor_id.to_string();
        let word = word.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE anchor_words SET word = ?1 WHERE id = ?2",
                params![word, anchor_id],
            )?;
            if rows_affected == 0 {
                return Err(StoreError::not_found("anchor_words", anchor_id).into());
            }
            Ok(())
        })
        .await
    }

    /// Rhymes hanging off the anchor are removed by ON DELETE CASCADE.
    pub async fn delete_anchor_word_row(&self, anchor_id: &str) -> Result<()> {
        let anchor_id = anchor_id.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM anchor_words WHERE id = ?1", params![anchor_id])?;
            Ok(())
        })
        .await
    }
}
