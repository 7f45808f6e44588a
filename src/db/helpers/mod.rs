use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::db::models::{Perspective, RhymeSource, RhymeType, SessionStatus};

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} contains out-of-range value {value}"))
}

pub fn to_u8(value: i64, field: &str) -> Result<u8> {
    u8::try_from(value).map_err(|_| anyhow!("{field} contains out-of-range value {value}"))
}

/// Fixed-width UTC timestamps, so `ORDER BY` on the text column is
/// chronological.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_status(value: &str) -> Result<SessionStatus> {
    match value {
        "active" => Ok(SessionStatus::Active),
        "completed" => Ok(SessionStatus::Completed),
        "archived" => Ok(SessionStatus::Archived),
        other => Err(anyhow!("unknown session status {other}")),
    }
}

pub fn parse_rhyme_type(value: &str) -> Result<RhymeType> {
    match value {
        "perfect" => Ok(RhymeType::Perfect),
        "near" => Ok(RhymeType::Near),
        "consonance" => Ok(RhymeType::Consonance),
        "assonance" => Ok(RhymeType::Assonance),
        other => Err(anyhow!("unknown rhyme type {other}")),
    }
}

pub fn parse_rhyme_source(value: &str) -> Result<RhymeSource> {
    match value {
        "box" => Ok(RhymeSource::Box),
        "suggested" => Ok(RhymeSource::Suggested),
        "manual" => Ok(RhymeSource::Manual),
        other => Err(anyhow!("unknown rhyme source {other}")),
    }
}

pub fn parse_perspectives(value: &str) -> Result<Vec<Perspective>> {
    serde_json::from_str(value).context("failed to parse perspectives")
}

pub fn encode_perspectives(perspectives: &[Perspective]) -> Result<String> {
    serde_json::to_string(perspectives).context("failed to encode perspectives")
}
