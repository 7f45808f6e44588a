use serde::Serialize;

use crate::db::models::Draft;

/// The session's working draft. Only the newest version is edited; the row
/// is created lazily by the first save.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftState {
    pub id: Option<String>,
    pub content: String,
    pub version: u32,
}

impl DraftState {
    /// Expects rows ordered by version, newest first.
    pub fn from_rows(rows: Vec<Draft>) -> Self {
        rows.into_iter()
            .next()
            .map(|row| Self {
                id: Some(row.id),
                content: row.content,
                version: row.version,
            })
            .unwrap_or_default()
    }

    pub fn set_content(&mut self, content: &str) {
        self.content = content.to_string();
    }

    pub fn confirm_insert(&mut self, row: &Draft) {
        self.id = Some(row.id.clone());
        self.version = row.version;
    }
}
