use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, parse_rhyme_source, parse_rhyme_type, to_u32},
    models::{NewRhyme, Rhyme},
};

fn row_to_rhyme(row: &Row) -> Result<Rhyme> {
    let rhyme_type: String = row.get("rhyme_type")?;
    let source: String = row.get("source")?;
    let position: i64 = row.get("position")?;
    let created_at: String = row.get("created_at")?;

    Ok(Rhyme {
        id: row.get("id")?,
        anchor_word_id: row.get("anchor_word_id")?,
        word: row.get("word")?,
        rhyme_type: parse_rhyme_type(&rhyme_type)?,
        source: parse_rhyme_source(&source)?,
        position: to_u32(position, "position")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    pub async fn insert_rhyme_row(&self, rhyme: NewRhyme) -> Result<Rhyme> {
        self.execute(move |conn| {
            let record = Rhyme {
                id: Uuid::new_v4().to_string(),
                anchor_word_id: rhyme.anchor_word_id,
                word: rhyme.word,
                rhyme_type: rhyme.rhyme_type,
                source: rhyme.source,
                position: rhyme.position,
                created_at: Utc::now(),
            };
            conn.execute(
                "INSERT INTO rhymes (id, anchor_word_id, word, rhyme_type, source, position, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id,
                    record.anchor_word_id,
                    record.word,
                    record.rhyme_type.as_str(),
                    record.source.as_str(),
                    record.position,
                    format_datetime(&record.created_at),
                ],
            )?;
            Ok(record)
        })
        .await
    }

    /// Rhymes for every listed anchor, ordered by position.
    pub async fn get_rhymes_for_anchors(&self, anchor_word_ids: &[String]) -> Result<Vec<Rhyme>> {
        if anchor_word_ids.is_empty() {
            return Ok(Vec::new());
        }

        let anchor_word_ids = anchor_word_ids.to_vec();
        self.execute(move |conn| {
            let placeholders = vec!["?"; anchor_word_ids.len()].join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT id, anchor_word_id, word, rhyme_type, source, position, created_at
                 FROM rhymes
                 WHERE anchor_word_id IN ({placeholders})
                 ORDER BY position ASC"
            ))?;

            let mut rows = stmt.query(params_from_iter(anchor_word_ids.iter()))?;
            let mut rhymes = Vec::new();
            while let Some(row) = rows.next()? {
                rhymes.push(row_to_rhyme(row)?);
            }
            Ok(rhymes)
        })
        .await
    }

    pub async fn delete_rhyme_row(&self, rhyme_id: &str) -> Result<()> {
        let rhyme_id = rhyme_id.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM rhymes WHERE id = ?1", params![rhyme_id])?;
            Ok(())
        })
        .await
    }
}
