use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{
        encode_perspectives, format_datetime, parse_datetime, parse_perspectives, parse_status,
    },
    models::{NewSession, Session, SessionPatch},
};
use crate::store::StoreError;

const SESSION_COLUMNS: &str =
    "id, user_id, title, spark, perspectives, status, created_at, updated_at";

fn row_to_session(row: &Row) -> Result<Session> {
    let perspectives: String = row.get("perspectives")?;
    let status: String = row.get("status")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Session {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        spark: row.get("spark")?,
        perspectives: parse_perspectives(&perspectives)?,
        status: parse_status(&status)?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    pub async fn insert_session_row(&self, session: NewSession) -> Result<Session> {
        self.execute(move |conn| {
            let now = Utc::now();
            let record = Session {
                id: Uuid::new_v4().to_string(),
                user_id: session.user_id,
                title: None,
                spark: session.spark,
                perspectives: session.perspectives,
                status: session.status,
                created_at: now,
                updated_at: now,
            };

            conn.execute(
                "INSERT INTO sessions (id, user_id, title, spark, perspectives, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    record.user_id,
                    record.title,
                    record.spark,
                    encode_perspectives(&record.perspectives)?,
                    record.status.as_str(),
                    format_datetime(&record.created_at),
                    format_datetime(&record.updated_at),
                ],
            )?;
            Ok(record)
        })
        .await
    }

    pub async fn get_session_for_user(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>> {
        let user_id = user_id.to_string();
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1 AND user_id = ?2"
            ))?;
            let session = stmt
                .query_row(params![session_id, user_id], |row| Ok(row_to_session(row)))
                .optional()?
                .transpose()?;
            Ok(session)
        })
        .await
    }

    pub async fn list_sessions_for_user(&self, user_id: &str) -> Result<Vec<Session>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE user_id = ?1
                 ORDER BY updated_at DESC"
            ))?;

            let mut rows = stmt.query(params![user_id])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
        .await
    }

    pub async fn patch_session(&self, session_id: &str, patch: SessionPatch) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut updates = Vec::new();
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(title) = patch.title {
                updates.push("title = ?");
                params_vec.push(Box::new(title));
            }
            if let Some(status) = patch.status {
                updates.push("status = ?");
                params_vec.push(Box::new(status.as_str()));
            }

            updates.push("updated_at = ?");
            params_vec.push(Box::new(format_datetime(&Utc::now())));
            params_vec.push(Box::new(session_id.clone()));

            let query = format!("UPDATE sessions SET {} WHERE id = ?", updates.join(", "));
            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();

            let rows_affected = conn.execute(&query, params_refs.as_slice())?;
            if rows_affected == 0 {
                return Err(StoreError::not_found("sessions", session_id).into());
            }
            Ok(())
        })
        .await
    }

    /// Boxes, anchor words, rhymes and drafts go with it via ON DELETE CASCADE.
    pub async fn delete_session_row(&self, session_id: &str) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
            Ok(())
        })
        .await
    }
}
