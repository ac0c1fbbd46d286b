pub mod prayer;
pub mod qaza;
pub mod stats;
pub mod times;

pub use prayer::{DaySlot, PrayerName, PrayerRecord, PrayerStatus, TimedSlot};
pub use qaza::{QazaEntry, QazaGroup, QazaItem, QazaSource};
pub use stats::{Achievement, AchievementInputs, DailyCount, StreakStats, WeekComparison};
pub use times::{DailyTimes, Location, Timings};
