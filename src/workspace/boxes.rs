//! Freewriting box state: content per perspective plus the elapsed time the
//! freewrite timer has reported for it.

use serde::Serialize;

use crate::db::models::{BoxPatch, WritingBox};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxState {
    pub id: String,
    pub perspective_index: u32,
    pub content: String,
    pub duration_seconds: u32,
}

impl From<WritingBox> for BoxState {
    fn from(row: WritingBox) -> Self {
        Self {
            id: row.id,
            perspective_index: row.perspective_index,
            content: row.content,
            duration_seconds: row.duration_seconds.unwrap_or(0),
        }
    }
}

#[derive(Debug, Default)]
pub struct BoxEditor {
    boxes: Vec<BoxState>,
}

impl BoxEditor {
    pub fn from_rows(rows: Vec<WritingBox>) -> Self {
        let mut boxes: Vec<BoxState> = rows.into_iter().map(BoxState::from).collect();
        boxes.sort_by_key(|state| state.perspective_index);
        Self { boxes }
    }

    pub fn boxes(&self) -> &[BoxState] {
        &self.boxes
    }

    pub fn get(&self, box_id: &str) -> Option<&BoxState> {
        self.boxes.iter().find(|state| state.id == box_id)
    }

    pub fn for_perspective(&self, perspective_index: u32) -> Option<&BoxState> {
        self.boxes
            .iter()
            .find(|state| state.perspective_index == perspective_index)
    }

    /// Returns false when no such box is loaded.
    pub fn set_content(&mut self, box_id: &str, content: &str) -> bool {
        match self.boxes.iter_mut().find(|state| state.id == box_id) {
            Some(state) => {
                state.content = content.to_string();
                true
            }
            None => false,
        }
    }

    /// In-memory only; elapsed time reaches the store through
    /// [`BoxEditor::completion_patch`].
    pub fn record_elapsed(&mut self, perspective_index: u32, elapsed_seconds: u32) -> bool {
        match self
            .boxes
            .iter_mut()
            .find(|state| state.perspective_index == perspective_index)
        {
            Some(state) => {
                state.duration_seconds = elapsed_seconds;
                true
            }
            None => false,
        }
    }

    /// Full write of content and duration for the box of a perspective.
    pub fn completion_patch(&self, perspective_index: u32) -> Option<(String, BoxPatch)> {
        self.for_perspective(perspective_index).map(|state| {
            (
                state.id.clone(),
                BoxPatch {
                    content: Some(state.content.clone()),
                    duration_seconds: Some(state.duration_seconds),
                },
            )
        })
    }
}
