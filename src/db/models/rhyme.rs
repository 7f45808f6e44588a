//! Rhyme palette models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RhymeType {
    Perfect,
    Near,
    Consonance,
    Assonance,
}

impl RhymeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RhymeType::Perfect => "perfect",
            RhymeType::Near => "near",
            RhymeType::Consonance => "consonance",
            RhymeType::Assonance => "assonance",
        }
    }
}

impl Default for RhymeType {
    fn default() -> Self {
        RhymeType::Perfect
    }
}

/// Where a rhyme came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RhymeSource {
    Box,
    Suggested,
    Manual,
}

impl RhymeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RhymeSource::Box => "box",
            RhymeSource::Suggested => "suggested",
            RhymeSource::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rhyme {
    pub id: String,
    pub anchor_word_id: String,
    pub word: String,
    pub rhyme_type: RhymeType,
    pub source: RhymeSource,
    pub position: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRhyme {
    pub anchor_word_id: String,
    pub word: String,
    pub rhyme_type: RhymeType,
    pub source: RhymeSource,
    pub position: u32,
}
