//! Rhyme palette: per-anchor lists of rhymes ordered by position.

use std::collections::HashMap;

use crate::db::models::Rhyme;

#[derive(Debug, Default)]
pub struct RhymePalette {
    by_anchor: HashMap<String, Vec<Rhyme>>,
    // Inserts still on the wire, per anchor. They hold their positions so
    // concurrent adds never request the same one.
    reserved: HashMap<String, u32>,
}

impl RhymePalette {
    pub fn from_rows(rows: Vec<Rhyme>) -> Self {
        let mut palette = Self::default();
        for row in rows {
            palette.insert_sorted(row);
        }
        palette
    }

    pub fn rhymes_for(&self, anchor_id: &str) -> &[Rhyme] {
        self.by_anchor
            .get(anchor_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Position for the next insert: the list length plus inserts in flight.
    pub fn reserve_position(&mut self, anchor_id: &str) -> u32 {
        let listed = self.rhymes_for(anchor_id).len() as u32;
        let reserved = self.reserved.entry(anchor_id.to_string()).or_insert(0);
        let position = listed + *reserved;
        *reserved += 1;
        position
    }

    pub fn release(&mut self, anchor_id: &str) {
        if let Some(reserved) = self.reserved.get_mut(anchor_id) {
            *reserved = reserved.saturating_sub(1);
            if *reserved == 0 {
                self.reserved.remove(anchor_id);
            }
        }
    }

    /// Adds an acknowledged row and releases its reservation.
    pub fn append(&mut self, row: Rhyme) {
        self.release(&row.anchor_word_id);
        self.insert_sorted(row);
    }

    pub fn remove(&mut self, anchor_id: &str, rhyme_id: &str) -> Option<Rhyme> {
        let list = self.by_anchor.get_mut(anchor_id)?;
        let index = list.iter().position(|rhyme| rhyme.id == rhyme_id)?;
        Some(list.remove(index))
    }

    pub fn drop_anchor(&mut self, anchor_id: &str) {
        self.by_anchor.remove(anchor_id);
        self.reserved.remove(anchor_id);
    }

    fn insert_sorted(&mut self, row: Rhyme) {
        let list = self.by_anchor.entry(row.anchor_word_id.clone()).or_default();
        let index = list.partition_point(|existing| existing.position <= row.position);
        list.insert(index, row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{RhymeSource, RhymeType};
    use chrono::Utc;

    fn rhyme(id: &str, anchor: &str, word: &str, position: u32) -> Rhyme {
        Rhyme {
            id: id.to_string(),
            anchor_word_id: anchor.to_string(),
            word: word.to_string(),
            rhyme_type: RhymeType::Perfect,
            source: RhymeSource::Manual,
            position,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn concurrent_adds_get_distinct_positions() {
        let mut palette = RhymePalette::from_rows(vec![rhyme("r0", "a1", "night", 0)]);

        assert_eq!(palette.reserve_position("a1"), 1);
        assert_eq!(palette.reserve_position("a1"), 2);
        assert_eq!(palette.reserve_position("a2"), 0);

        // Acknowledgements arriving out of order still list by position.
        palette.append(rhyme("r2", "a1", "bright", 2));
        palette.append(rhyme("r1", "a1", "kite", 1));
        let words: Vec<_> = palette.rhymes_for("a1").iter().map(|r| r.word.as_str()).collect();
        assert_eq!(words, ["night", "kite", "bright"]);
        assert_eq!(palette.reserve_position("a1"), 3);
    }

    #[test]
    fn failed_insert_frees_its_position() {
        let mut palette = RhymePalette::default();
        assert_eq!(palette.reserve_position("a1"), 0);
        palette.release("a1");
        assert_eq!(palette.reserve_position("a1"), 0);
    }

    #[test]
    fn remove_and_drop_anchor() {
        let mut palette = RhymePalette::from_rows(vec![
            rhyme("r0", "a1", "night", 0),
            rhyme("r1", "a1", "kite", 1),
        ]);
        assert_eq!(palette.remove("a1", "r0").map(|r| r.word), Some("night".into()));
        assert!(palette.remove("a1", "r0").is_none());
        assert_eq!(palette.rhymes_for("a1").len(), 1);

        palette.drop_anchor("a1");
        assert!(palette.rhymes_for("a1").is_empty());
    }
}
