use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The five obligatory prayers. Storage keys are the Turkish labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrayerName {
    Sabah,
    Ogle,
    Ikindi,
    Aksam,
    Yatsi,
}

/// Fixed circular order of the day. Sabah's predecessor is the previous
/// night's Yatsı.
pub const PRAYER_CYCLE: [PrayerName; 5] = [
    PrayerName::Sabah,
    PrayerName::Ogle,
    PrayerName::Ikindi,
    PrayerName::Aksam,
    PrayerName::Yatsi,
];

pub fn predecessor(index: usize) -> usize {
    (index + PRAYER_CYCLE.len() - 1) % PRAYER_CYCLE.len()
}

impl PrayerName {
    pub fn all() -> &'static [PrayerName] {
        &PRAYER_CYCLE
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrayerName::Sabah => "Sabah",
            PrayerName::Ogle => "Öğle",
            PrayerName::Ikindi => "İkindi",
            PrayerName::Aksam => "Akşam",
            PrayerName::Yatsi => "Yatsı",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            PrayerName::Sabah => 0,
            PrayerName::Ogle => 1,
            PrayerName::Ikindi => 2,
            PrayerName::Aksam => 3,
            PrayerName::Yatsi => 4,
        }
    }

    /// The prayer whose time has just elapsed when this one begins.
    pub fn previous(&self) -> PrayerName {
        PRAYER_CYCLE[predecessor(self.index())]
    }
}

impl std::fmt::Display for PrayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PrayerName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sabah" | "fajr" | "imsak" => Ok(PrayerName::Sabah),
            "öğle" | "ogle" | "dhuhr" | "zuhr" => Ok(PrayerName::Ogle),
            "i\u{307}kindi" | "ikindi" | "asr" => Ok(PrayerName::Ikindi),
            "akşam" | "aksam" | "maghrib" => Ok(PrayerName::Aksam),
            "yatsı" | "yatsi" | "isha" => Ok(PrayerName::Yatsi),
            _ => Err(anyhow::anyhow!("Unknown prayer: {}", s)),
        }
    }
}

/// One entry of a day's time table. Sunrise is shown but never tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DaySlot {
    Prayer(PrayerName),
    Sunrise,
}

impl DaySlot {
    pub fn label(&self) -> &'static str {
        match self {
            DaySlot::Prayer(p) => p.as_str(),
            DaySlot::Sunrise => "Güneş",
        }
    }

    pub fn prayer(&self) -> Option<PrayerName> {
        match self {
            DaySlot::Prayer(p) => Some(*p),
            DaySlot::Sunrise => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedSlot {
    pub slot: DaySlot,
    pub time: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrayerStatus {
    Pending,
    Performed,
    PerformedCongregation,
    Missed,
}

impl PrayerStatus {
    pub fn is_performed(&self) -> bool {
        matches!(
            self,
            PrayerStatus::Performed | PrayerStatus::PerformedCongregation
        )
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            PrayerStatus::Pending => "○",
            PrayerStatus::Performed => "✓",
            PrayerStatus::PerformedCongregation => "✓✓",
            PrayerStatus::Missed => "✗",
        }
    }
}

/// A tracked (date, prayer) row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrayerRecord {
    pub id: i64,
    pub prayer_name: PrayerName,
    pub date: String,
    pub scheduled_time: NaiveTime,
    pub is_performed: bool,
    pub is_congregation: bool,
    pub performed_at: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predecessor_wraps_sabah_to_yatsi() {
        assert_eq!(PrayerName::Sabah.previous(), PrayerName::Yatsi);
        assert_eq!(PrayerName::Ogle.previous(), PrayerName::Sabah);
        assert_eq!(PrayerName::Yatsi.previous(), PrayerName::Aksam);
        assert_eq!(predecessor(0), 4);
    }

    #[test]
    fn parses_turkish_and_ascii_names() {
        assert_eq!("Öğle".parse::<PrayerName>().unwrap(), PrayerName::Ogle);
        assert_eq!("yatsi".parse::<PrayerName>().unwrap(), PrayerName::Yatsi);
        assert_eq!("Akşam".parse::<PrayerName>().unwrap(), PrayerName::Aksam);
        assert_eq!("fajr".parse::<PrayerName>().unwrap(), PrayerName::Sabah);
        assert!("güneş".parse::<PrayerName>().is_err());
    }

    #[test]
    fn labels_round_trip_through_storage_keys() {
        for p in PrayerName::all() {
            assert_eq!(p.as_str().parse::<PrayerName>().unwrap(), *p);
        }
    }
}
