//! Per-(date, prayer) status: Pending → Performed / PerformedCongregation / Missed.

pub mod board;
pub mod qaza;

use chrono::{NaiveDate, NaiveDateTime};

use crate::db::repository::{PrayerRepo, QazaRepo};
use crate::db::Store;
use crate::error::{Result, VakitError};
use crate::models::{PrayerName, PrayerRecord, PrayerStatus};
use crate::prayer_times::window::{effective_prayer_date, format_date};

pub use board::DayBoard;
pub use qaza::QazaTracker;

pub struct PrayerStatusLedger<'a> {
    store: &'a Store,
}

fn status_of(record: &PrayerRecord, open_qaza: &[PrayerName]) -> PrayerStatus {
    if record.is_performed {
        if record.is_congregation {
            PrayerStatus::PerformedCongregation
        } else {
            PrayerStatus::Performed
        }
    } else if open_qaza.contains(&record.prayer_name) {
        PrayerStatus::Missed
    } else {
        PrayerStatus::Pending
    }
}

impl<'a> PrayerStatusLedger<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Tracked rows of a day with their derived status, in prayer order.
    pub fn day(&self, date: NaiveDate) -> Result<Vec<(PrayerRecord, PrayerStatus)>> {
        let conn = self.store.conn();
        let date_str = format_date(date);
        let open = QazaRepo::open_for_date(conn, &date_str)?;
        Ok(PrayerRepo::get_by_date(conn, &date_str)?
            .into_iter()
            .map(|r| {
                let status = status_of(&r, &open);
                (r, status)
            })
            .collect())
    }

    #[cfg(test)]
    pub fn status(&self, date: NaiveDate, prayer: PrayerName) -> Result<PrayerStatus> {
        self.day(date)?
            .into_iter()
            .find(|(r, _)| r.prayer_name == prayer)
            .map(|(_, s)| s)
            .ok_or_else(|| VakitError::NotTracked {
                prayer: prayer.to_string(),
                date: format_date(date),
            })
    }

    /// Only the current prayer day takes direct status changes.
    fn ensure_writable(&self, date: NaiveDate, prayer: PrayerName, now: NaiveDateTime) -> Result<String> {
        let date_str = format_date(date);
        if date != effective_prayer_date(now) {
            return Err(VakitError::DayClosed { date: date_str });
        }
        if !PrayerRepo::exists(self.store.conn(), &date_str, prayer)? {
            return Err(VakitError::NotTracked {
                prayer: prayer.to_string(),
                date: date_str,
            });
        }
        Ok(date_str)
    }

    /// Pending | Missed → Performed[Congregation]. Any open qaza for the key
    /// is dropped.
    pub fn confirm(
        &self,
        date: NaiveDate,
        prayer: PrayerName,
        congregation: bool,
        now: NaiveDateTime,
    ) -> Result<()> {
        let date_str = self.ensure_writable(date, prayer, now)?;

        let tx = self.store.conn().unchecked_transaction()?;
        PrayerRepo::set_performed(&tx, &date_str, prayer, congregation, now)?;
        let cleared = QazaRepo::clear_open(&tx, &date_str, prayer)?;
        tx.commit()?;

        log::info!(
            "{} {} performed{} (cleared {} qaza)",
            date_str,
            prayer,
            if congregation { " in congregation" } else { "" },
            cleared
        );
        Ok(())
    }

    /// Pending | Performed → Missed, making sure exactly one open qaza exists.
    pub fn mark_missed(&self, date: NaiveDate, prayer: PrayerName, now: NaiveDateTime) -> Result<()> {
        let date_str = self.ensure_writable(date, prayer, now)?;

        let tx = self.store.conn().unchecked_transaction()?;
        PrayerRepo::set_not_performed(&tx, &date_str, prayer)?;
        let created = QazaRepo::ensure_open(&tx, &date_str, prayer, "")?;
        tx.commit()?;

        log::info!("{} {} missed (new qaza: {})", date_str, prayer, created);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::QazaEntry;
    use crate::prayer_times::cache::tests::{konya, FakeProvider};
    use crate::prayer_times::PrayerTimesCache;

    pub(crate) fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    pub(crate) fn at(d: u32, h: u32) -> NaiveDateTime {
        day(d).and_hms_opt(h, 0, 0).unwrap()
    }

    /// Store with materialized rows for the given January days.
    pub(crate) fn seeded(days: &[u32]) -> Store {
        let store = Store::open_in_memory().unwrap();
        let provider = FakeProvider::new();
        let cache = PrayerTimesCache::new(&store, &provider);
        for d in days {
            cache.get_times(day(*d), &konya(), false).unwrap();
        }
        store
    }

    fn open_for(store: &Store, date: &str, prayer: PrayerName) -> Vec<QazaEntry> {
        QazaRepo::open_entries(store.conn())
            .unwrap()
            .into_iter()
            .filter(|e| e.missed_date == date && e.prayer_name == prayer)
            .collect()
    }

    #[test]
    fn pending_until_touched() {
        let store = seeded(&[27]);
        let ledger = PrayerStatusLedger::new(&store);
        assert_eq!(ledger.status(day(27), PrayerName::Ogle).unwrap(), PrayerStatus::Pending);
    }

    #[test]
    fn confirm_with_congregation() {
        let store = seeded(&[27]);
        let ledger = PrayerStatusLedger::new(&store);
        ledger.confirm(day(27), PrayerName::Ogle, true, at(27, 13)).unwrap();
        assert_eq!(
            ledger.status(day(27), PrayerName::Ogle).unwrap(),
            PrayerStatus::PerformedCongregation
        );
    }

    #[test]
    fn missed_twice_keeps_one_qaza() {
        let store = seeded(&[27]);
        let ledger = PrayerStatusLedger::new(&store);
        ledger.mark_missed(day(27), PrayerName::Aksam, at(27, 21)).unwrap();
        ledger.mark_missed(day(27), PrayerName::Aksam, at(27, 21)).unwrap();
        assert_eq!(ledger.status(day(27), PrayerName::Aksam).unwrap(), PrayerStatus::Missed);
        assert_eq!(open_for(&store, "27-01-2026", PrayerName::Aksam).len(), 1);
    }

    #[test]
    fn missed_then_confirmed_leaves_no_open_qaza() {
        let store = seeded(&[27]);
        let ledger = PrayerStatusLedger::new(&store);
        ledger.mark_missed(day(27), PrayerName::Aksam, at(27, 21)).unwrap();
        ledger.confirm(day(27), PrayerName::Aksam, false, at(27, 22)).unwrap();
        assert!(open_for(&store, "27-01-2026", PrayerName::Aksam).is_empty());
        assert_eq!(ledger.status(day(27), PrayerName::Aksam).unwrap(), PrayerStatus::Performed);
    }

    #[test]
    fn performed_can_be_marked_missed() {
        let store = seeded(&[27]);
        let ledger = PrayerStatusLedger::new(&store);
        ledger.confirm(day(27), PrayerName::Sabah, true, at(27, 6)).unwrap();
        ledger.mark_missed(day(27), PrayerName::Sabah, at(27, 7)).unwrap();
        let (record, status) = ledger
            .day(day(27))
            .unwrap()
            .into_iter()
            .find(|(r, _)| r.prayer_name == PrayerName::Sabah)
            .unwrap();
        assert_eq!(status, PrayerStatus::Missed);
        assert!(!record.is_congregation);
        assert!(record.performed_at.is_none());
    }

    #[test]
    fn late_night_still_writes_yesterday() {
        let store = seeded(&[26, 27]);
        let ledger = PrayerStatusLedger::new(&store);
        // 02:00 on the 27th is still the 26th's prayer day
        ledger.confirm(day(26), PrayerName::Yatsi, false, at(27, 2)).unwrap();
        let err = ledger.confirm(day(27), PrayerName::Yatsi, false, at(27, 2)).unwrap_err();
        assert!(matches!(err, VakitError::DayClosed { .. }));
    }

    #[test]
    fn past_days_are_closed() {
        let store = seeded(&[25, 27]);
        let ledger = PrayerStatusLedger::new(&store);
        let err = ledger.confirm(day(25), PrayerName::Ogle, false, at(27, 13)).unwrap_err();
        assert!(matches!(err, VakitError::DayClosed { .. }));
    }

    #[test]
    fn untracked_day_is_reported() {
        let store = Store::open_in_memory().unwrap();
        let ledger = PrayerStatusLedger::new(&store);
        let err = ledger.mark_missed(day(27), PrayerName::Ogle, at(27, 13)).unwrap_err();
        assert!(matches!(err, VakitError::NotTracked { .. }));
    }
}
