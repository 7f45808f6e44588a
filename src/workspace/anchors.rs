//! The nine anchor word slots.
//!
//! Two views are kept per slot: `local`, which is what the user typed, and
//! `confirmed`, the last row the store acknowledged. Commits decide between
//! insert, update and delete from `confirmed` only, so a slot that was filled
//! and emptied again before its commit ran never touches the store.

use serde::Serialize;

use super::entity::EntityRef;
use crate::db::models::{AnchorWord, ANCHOR_SLOTS};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorSlot {
    pub id: EntityRef,
    pub word: String,
    pub source_box: Option<u32>,
}

impl From<&AnchorWord> for AnchorSlot {
    fn from(row: &AnchorWord) -> Self {
        Self {
            id: EntityRef::Confirmed(row.id.clone()),
            word: row.word.clone(),
            source_box: row.source_box,
        }
    }
}

/// Remote write a slot needs to match its latest text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorCommit {
    Noop,
    Insert { word: String },
    Update { id: String, word: String },
    Delete { id: String },
}

#[derive(Debug, Default)]
pub struct AnchorSlots {
    local: [Option<AnchorSlot>; ANCHOR_SLOTS],
    confirmed: [Option<AnchorWord>; ANCHOR_SLOTS],
}

impl AnchorSlots {
    /// Rows with a position outside the slot range are returned unplaced.
    pub fn from_rows(rows: Vec<AnchorWord>) -> (Self, Vec<AnchorWord>) {
        let mut slots = Self::default();
        let mut unplaced = Vec::new();
        for row in rows {
            let position = usize::from(row.position);
            if position >= ANCHOR_SLOTS || slots.confirmed[position].is_some() {
                unplaced.push(row);
                continue;
            }
            slots.local[position] = Some(AnchorSlot::from(&row));
            slots.confirmed[position] = Some(row);
        }
        (slots, unplaced)
    }

    pub fn slot(&self, position: u8) -> Option<&AnchorSlot> {
        self.local.get(usize::from(position))?.as_ref()
    }

    pub fn slots(&self) -> Vec<Option<AnchorSlot>> {
        self.local.to_vec()
    }

    pub fn confirmed(&self, position: u8) -> Option<&AnchorWord> {
        self.confirmed.get(usize::from(position))?.as_ref()
    }

    /// Anchor words the store knows about, in slot order.
    pub fn confirmed_words(&self) -> Vec<AnchorWord> {
        self.confirmed.iter().flatten().cloned().collect()
    }

    pub fn is_confirmed(&self, anchor_id: &str) -> bool {
        self.confirmed.iter().flatten().any(|row| row.id == anchor_id)
    }

    /// Applies the user's text to the local slot. An empty slot gets a
    /// placeholder; a placeholder emptied again disappears; a confirmed slot
    /// keeps its identity until its delete is acknowledged.
    pub fn edit(&mut self, position: u8, text: &str) {
        let slot = &mut self.local[usize::from(position)];
        let blank = text.trim().is_empty();
        match slot {
            None if blank => {}
            None => {
                *slot = Some(AnchorSlot {
                    id: EntityRef::pending(),
                    word: text.to_string(),
                    source_box: None,
                });
            }
            Some(current) if blank && current.id.is_pending() => *slot = None,
            Some(current) => current.word = text.to_string(),
        }
    }

    pub fn plan(&self, position: u8, text: &str) -> AnchorCommit {
        let word = text.trim();
        match (&self.confirmed[usize::from(position)], word.is_empty()) {
            (Some(row), true) => AnchorCommit::Delete { id: row.id.clone() },
            (None, true) => AnchorCommit::Noop,
            (Some(row), false) if row.word == word => AnchorCommit::Noop,
            (Some(row), false) => AnchorCommit::Update {
                id: row.id.clone(),
                word: word.to_string(),
            },
            (None, false) => AnchorCommit::Insert {
                word: word.to_string(),
            },
        }
    }

    /// Swaps the placeholder's identity for the stored row's.
    pub fn confirm_insert(&mut self, row: AnchorWord) {
        let position = usize::from(row.position);
        if let Some(slot) = &mut self.local[position] {
            slot.id = EntityRef::Confirmed(row.id.clone());
        }
        self.confirmed[position] = Some(row);
    }

    pub fn confirm_update(&mut self, position: u8, word: &str) {
        if let Some(row) = &mut self.confirmed[usize::from(position)] {
            row.word = word.to_string();
        }
    }

    /// Clears the slot, unless the user has typed into it again since, in
    /// which case the text stays as a fresh placeholder.
    pub fn confirm_delete(&mut self, position: u8) -> Option<AnchorWord> {
        let position = usize::from(position);
        let removed = self.confirmed[position].take();
        let keep_text = self.local[position]
            .as_ref()
            .map_or(false, |slot| !slot.word.trim().is_empty());
        if keep_text {
            if let Some(slot) = &mut self.local[position] {
                slot.id = EntityRef::pending();
            }
        } else {
            self.local[position] = None;
        }
        removed
    }
}
