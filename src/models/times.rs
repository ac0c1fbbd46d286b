use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::{DaySlot, PrayerName, TimedSlot};

/// Where the user is. Supplied by config, consumed by the cache and scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Raw answer of the timings provider for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct Timings {
    pub fajr: NaiveTime,
    pub sunrise: NaiveTime,
    pub dhuhr: NaiveTime,
    pub asr: NaiveTime,
    pub maghrib: NaiveTime,
    pub isha: NaiveTime,
    /// Coordinates the provider resolved, when it reports them.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A day's times as served by the cache, echoing the lookup key.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTimes {
    pub date: String,
    pub city: String,
    pub country: String,
    pub fajr: NaiveTime,
    pub sunrise: NaiveTime,
    pub dhuhr: NaiveTime,
    pub asr: NaiveTime,
    pub maghrib: NaiveTime,
    pub isha: NaiveTime,
}

impl DailyTimes {
    pub fn time_of(&self, prayer: PrayerName) -> NaiveTime {
        match prayer {
            PrayerName::Sabah => self.fajr,
            PrayerName::Ogle => self.dhuhr,
            PrayerName::Ikindi => self.asr,
            PrayerName::Aksam => self.maghrib,
            PrayerName::Yatsi => self.isha,
        }
    }

    /// The six display slots in time-of-day order, sunrise included.
    pub fn slots(&self) -> Vec<TimedSlot> {
        vec![
            TimedSlot { slot: DaySlot::Prayer(PrayerName::Sabah), time: self.fajr },
            TimedSlot { slot: DaySlot::Sunrise, time: self.sunrise },
            TimedSlot { slot: DaySlot::Prayer(PrayerName::Ogle), time: self.dhuhr },
            TimedSlot { slot: DaySlot::Prayer(PrayerName::Ikindi), time: self.asr },
            TimedSlot { slot: DaySlot::Prayer(PrayerName::Aksam), time: self.maghrib },
            TimedSlot { slot: DaySlot::Prayer(PrayerName::Yatsi), time: self.isha },
        ]
    }
}
