use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::Result;
use crate::ledger::PrayerStatusLedger;
use crate::models::{PrayerName, PrayerStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardEntry {
    pub prayer: PrayerName,
    pub time: NaiveTime,
    pub status: PrayerStatus,
}

/// In-memory view of one prayer day. Writes are applied locally first and
/// then persisted; a failed write reloads the board from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBoard {
    pub date: NaiveDate,
    pub entries: Vec<BoardEntry>,
}

impl DayBoard {
    pub fn load(ledger: &PrayerStatusLedger<'_>, date: NaiveDate) -> Result<Self> {
        let entries = ledger
            .day(date)?
            .into_iter()
            .map(|(record, status)| BoardEntry {
                prayer: record.prayer_name,
                time: record.scheduled_time,
                status,
            })
            .collect();
        Ok(Self { date, entries })
    }

    pub fn status_of(&self, prayer: PrayerName) -> Option<PrayerStatus> {
        self.entries
            .iter()
            .find(|e| e.prayer == prayer)
            .map(|e| e.status)
    }

    pub fn performed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.status.is_performed()).count()
    }

    fn set_local(&mut self, prayer: PrayerName, status: PrayerStatus) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.prayer == prayer) {
            entry.status = status;
        }
    }

    fn reconcile(&mut self, ledger: &PrayerStatusLedger<'_>) {
        match DayBoard::load(ledger, self.date) {
            Ok(fresh) => *self = fresh,
            Err(e) => log::error!("reload after failed write also failed: {}", e),
        }
    }

    pub fn confirm(
        &mut self,
        ledger: &PrayerStatusLedger<'_>,
        prayer: PrayerName,
        congregation: bool,
        now: NaiveDateTime,
    ) -> Result<()> {
        let optimistic = if congregation {
            PrayerStatus::PerformedCongregation
        } else {
            PrayerStatus::Performed
        };
        self.set_local(prayer, optimistic);

        if let Err(e) = ledger.confirm(self.date, prayer, congregation, now) {
            log::error!("confirm {} failed, reloading: {}", prayer, e);
            self.reconcile(ledger);
            return Err(e);
        }
        Ok(())
    }

    pub fn mark_missed(
        &mut self,
        ledger: &PrayerStatusLedger<'_>,
        prayer: PrayerName,
        now: NaiveDateTime,
    ) -> Result<()> {
        self.set_local(prayer, PrayerStatus::Missed);

        if let Err(e) = ledger.mark_missed(self.date, prayer, now) {
            log::error!("mark missed {} failed, reloading: {}", prayer, e);
            self.reconcile(ledger);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VakitError;
    use crate::ledger::tests::{at, day, seeded};

    #[test]
    fn successful_write_matches_storage() {
        let store = seeded(&[27]);
        let ledger = PrayerStatusLedger::new(&store);
        let mut board = DayBoard::load(&ledger, day(27)).unwrap();

        board.confirm(&ledger, PrayerName::Ikindi, false, at(27, 16)).unwrap();
        board.mark_missed(&ledger, PrayerName::Sabah, at(27, 16)).unwrap();

        assert_eq!(board, DayBoard::load(&ledger, day(27)).unwrap());
        assert_eq!(board.performed_count(), 1);
    }

    #[test]
    fn failed_write_reverts_optimistic_state() {
        let store = seeded(&[27]);
        store
            .conn()
            .execute_batch(
                "CREATE TRIGGER reject_updates BEFORE UPDATE ON prayers
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();
        let ledger = PrayerStatusLedger::new(&store);
        let mut board = DayBoard::load(&ledger, day(27)).unwrap();

        let err = board.confirm(&ledger, PrayerName::Ikindi, true, at(27, 16)).unwrap_err();

        assert!(matches!(err, VakitError::Persistence(_)));
        assert_eq!(board.status_of(PrayerName::Ikindi), Some(PrayerStatus::Pending));
    }

    #[test]
    fn rejected_transition_reverts_optimistic_state() {
        let store = seeded(&[26, 27]);
        let ledger = PrayerStatusLedger::new(&store);
        let mut board = DayBoard::load(&ledger, day(26)).unwrap();

        assert!(board.mark_missed(&ledger, PrayerName::Ogle, at(27, 12)).is_err());
        assert_eq!(board.status_of(PrayerName::Ogle), Some(PrayerStatus::Pending));
    }
}
