use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, to_u32},
    models::{Draft, NewDraft},
};
use crate::store::StoreError;

fn row_to_draft(row: &Row) -> Result<Draft> {
    let version: i64 = row.get("version")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Draft {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        content: row.get("content")?,
        version: to_u32(version, "version")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    pub async fn insert_draft_row(&self, draft: NewDraft) -> Result<Draft> {
        self.execute(move |conn| {
            let now = Utc::now();
            let record = Draft {
                id: Uuid::new_v4().to_string(),
                session_id: draft.session_id,
                content: draft.content,
                version: draft.version,
                created_at: now,
                updated_at: now,
            };
            conn.execute(
                "INSERT INTO drafts (id, session_id, content, version, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.session_id,
                    record.content,
                    record.version,
                    format_datetime(&record.created_at),
                    format_datetime(&record.updated_at),
                ],
            )?;
            Ok(record)
        })
        .await
    }

    /// Drafts of a session, newest version first.
    pub async fn get_drafts_for_session(&self, session_id: &str) -> Result<Vec<Draft>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, content, version, created_at, updated_at
                 FROM drafts
                 WHERE session_id = ?1
                 ORDER BY version DESC",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut drafts = Vec::new();
            while let Some(row) = rows.next()? {
                drafts.push(row_to_draft(row)?);
            }
            Ok(drafts)
        })
        .await
    }

    pub async fn update_draft_content(&self, draft_id: &str, content: &str) -> Result<()> {
        let draft_id = draft_id.to_string();
        let content = content.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE drafts SET content = ?1, updated_at = ?2 WHERE id = ?3",
                params![content, format_datetime(&Utc::now()), draft_id],
            )?;
            if rows_affected == 0 {
                return Err(StoreError::not_found("drafts", draft_id).into());
            }
            Ok(())
        })
        .await
    }
}
