use chrono::{NaiveDate, NaiveDateTime};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use crate::db::repository::{PrayerRepo, QazaRepo};
use crate::db::Store;
use crate::error::Result;
use crate::models::{PrayerName, QazaGroup, QazaItem, QazaSource};
use crate::prayer_times::window::{format_date, parse_date};

/// Makeup backlog built from explicit qaza rows plus past prayers that were
/// never marked performed.
pub struct QazaTracker<'a> {
    store: &'a Store,
}

impl<'a> QazaTracker<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Merged backlog, newest date first. Explicit rows win over an
    /// auto-detected miss for the same (date, prayer).
    pub fn open_items(&self, today: NaiveDate) -> Result<Vec<QazaItem>> {
        let conn = self.store.conn();
        let mut seen: HashSet<(NaiveDate, PrayerName)> = HashSet::new();
        let mut merged = Vec::new();

        for entry in QazaRepo::open_entries(conn)? {
            let date = parse_date(&entry.missed_date)?;
            if seen.insert((date, entry.prayer_name)) {
                merged.push(QazaItem {
                    date,
                    prayer_name: entry.prayer_name,
                    notes: entry.notes,
                    source: QazaSource::Explicit { id: entry.id },
                });
            }
        }

        for (date, prayer) in PrayerRepo::unperformed(conn)? {
            if date < today && seen.insert((date, prayer)) {
                merged.push(QazaItem {
                    date,
                    prayer_name: prayer,
                    notes: String::new(),
                    source: QazaSource::Auto,
                });
            }
        }

        merged.sort_by_key(|item| (Reverse(item.date), item.prayer_name.index()));
        Ok(merged)
    }

    /// `open_items` grouped per missed date, newest group first.
    pub fn list_open_qaza(&self, today: NaiveDate) -> Result<Vec<QazaGroup>> {
        let mut groups: BTreeMap<Reverse<NaiveDate>, Vec<QazaItem>> = BTreeMap::new();
        for item in self.open_items(today)? {
            groups.entry(Reverse(item.date)).or_default().push(item);
        }
        Ok(groups
            .into_iter()
            .map(|(Reverse(date), items)| QazaGroup { date, items })
            .collect())
    }

    pub fn open_count(&self, today: NaiveDate) -> Result<usize> {
        Ok(self.open_items(today)?.len())
    }

    /// Record a makeup prayer. Closes the explicit row if there is one and
    /// always flips the underlying prayer row to performed. Safe to repeat.
    pub fn compensate(&self, item: &QazaItem, now: NaiveDateTime) -> Result<()> {
        let date_str = format_date(item.date);

        let tx = self.store.conn().unchecked_transaction()?;
        if let QazaSource::Explicit { id } = item.source {
            QazaRepo::mark_compensated(&tx, id, now)?;
        }
        PrayerRepo::mark_made_up(&tx, &date_str, item.prayer_name, now)?;
        tx.commit()?;

        log::info!(
            "compensated {} {} ({})",
            date_str,
            item.prayer_name,
            item.source.as_str()
        );
        Ok(())
    }

    /// Add an explicit entry by hand. Returns false if one was already open.
    pub fn add(&self, date: NaiveDate, prayer: PrayerName, notes: &str) -> Result<bool> {
        QazaRepo::ensure_open(self.store.conn(), &format_date(date), prayer, notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{at, day, seeded};
    use crate::ledger::PrayerStatusLedger;

    fn perform_all(store: &Store, d: u32) {
        let ledger = PrayerStatusLedger::new(store);
        for p in PrayerName::all() {
            ledger.confirm(day(d), *p, false, at(d, 22)).unwrap();
        }
    }

    fn snapshot(store: &Store) -> Vec<(String, String, i32, Option<String>)> {
        let mut stmt = store
            .conn()
            .prepare(
                "SELECT 'p', date || prayer_name, is_performed, performed_at FROM prayers
                 UNION ALL
                 SELECT 'q', missed_date || prayer_name, is_compensated, compensated_at FROM qaza_prayers
                 ORDER BY 1, 2",
            )
            .unwrap();
        stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn auto_detects_unperformed_past_prayers_only() {
        let store = seeded(&[26, 27]);
        perform_all(&store, 26);

        let tracker = QazaTracker::new(&store);
        // 27th is today: nothing there is overdue yet
        assert!(tracker.open_items(day(27)).unwrap().is_empty());
        // from the 28th on, all five of the 27th are
        let items = tracker.open_items(day(28)).unwrap();
        assert_eq!(items.len(), 5);
        assert!(items.iter().all(|i| i.source == QazaSource::Auto));
        assert_eq!(items[0].prayer_name, PrayerName::Sabah);
    }

    #[test]
    fn explicit_entry_wins_over_auto_duplicate() {
        let store = seeded(&[27]);
        PrayerStatusLedger::new(&store)
            .mark_missed(day(27), PrayerName::Aksam, at(27, 21))
            .unwrap();

        let items = QazaTracker::new(&store).open_items(day(28)).unwrap();
        assert_eq!(items.len(), 5);
        let aksam: Vec<_> = items
            .iter()
            .filter(|i| i.prayer_name == PrayerName::Aksam)
            .collect();
        assert_eq!(aksam.len(), 1);
        assert!(matches!(aksam[0].source, QazaSource::Explicit { .. }));
    }

    #[test]
    fn today_explicit_miss_is_listed() {
        let store = seeded(&[27]);
        PrayerStatusLedger::new(&store)
            .mark_missed(day(27), PrayerName::Ogle, at(27, 14))
            .unwrap();
        let items = QazaTracker::new(&store).open_items(day(27)).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].prayer_name, PrayerName::Ogle);
    }

    #[test]
    fn groups_are_newest_first() {
        let store = seeded(&[23, 25, 26]);
        perform_all(&store, 25);
        let tracker = QazaTracker::new(&store);
        tracker.add(day(2), PrayerName::Yatsi, "yolculuk").unwrap();

        let groups = tracker.list_open_qaza(day(27)).unwrap();
        let dates: Vec<NaiveDate> = groups.iter().map(|g| g.date).collect();
        assert_eq!(dates, vec![day(26), day(23), day(2)]);
        assert_eq!(groups[0].items.len(), 5);
        assert_eq!(groups[2].items[0].notes, "yolculuk");
    }

    #[test]
    fn compensating_auto_item_marks_prayer_performed() {
        let store = seeded(&[26]);
        let tracker = QazaTracker::new(&store);
        let item = tracker.open_items(day(27)).unwrap().remove(0);

        tracker.compensate(&item, at(27, 10)).unwrap();

        assert_eq!(tracker.open_count(day(27)).unwrap(), 4);
        let status = PrayerStatusLedger::new(&store)
            .status(day(26), item.prayer_name)
            .unwrap();
        assert!(status.is_performed());
    }

    #[test]
    fn compensate_is_idempotent() {
        let store = seeded(&[26]);
        PrayerStatusLedger::new(&store)
            .mark_missed(day(26), PrayerName::Ikindi, at(26, 17))
            .unwrap();
        let tracker = QazaTracker::new(&store);
        let item = tracker
            .open_items(day(27))
            .unwrap()
            .into_iter()
            .find(|i| i.prayer_name == PrayerName::Ikindi)
            .unwrap();
        assert!(matches!(item.source, QazaSource::Explicit { .. }));

        tracker.compensate(&item, at(27, 10)).unwrap();
        let once = snapshot(&store);
        tracker.compensate(&item, at(27, 11)).unwrap();

        assert_eq!(snapshot(&store), once);
        assert!(QazaRepo::open_entries(store.conn()).unwrap().is_empty());
    }
}
