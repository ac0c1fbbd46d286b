use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::PrayerName;

/// Where an open makeup obligation was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QazaSource {
    /// A persisted `qaza_prayers` row.
    Explicit { id: i64 },
    /// A past prayer row that was never marked performed.
    Auto,
}

impl QazaSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            QazaSource::Explicit { .. } => "explicit",
            QazaSource::Auto => "auto",
        }
    }
}

/// A stored `qaza_prayers` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QazaEntry {
    pub id: i64,
    pub prayer_name: PrayerName,
    pub missed_date: String,
    pub is_compensated: bool,
    pub compensated_at: Option<NaiveDateTime>,
    pub notes: String,
}

/// One line of the merged backlog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QazaItem {
    pub date: NaiveDate,
    pub prayer_name: PrayerName,
    pub notes: String,
    pub source: QazaSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QazaGroup {
    pub date: NaiveDate,
    pub items: Vec<QazaItem>,
}
