use chrono::NaiveDate;

use crate::db::repository::{CacheRepo, PrayerRepo};
use crate::db::Store;
use crate::error::Result;
use crate::models::{DailyTimes, Location};
use crate::prayer_times::provider::TimingsProvider;
use crate::prayer_times::window::format_date;

/// Read-through cache keyed by (date, city) in front of a timings provider.
/// A miss also materializes the day's five tracking rows.
pub struct PrayerTimesCache<'a> {
    store: &'a Store,
    provider: &'a dyn TimingsProvider,
}

impl<'a> PrayerTimesCache<'a> {
    pub fn new(store: &'a Store, provider: &'a dyn TimingsProvider) -> Self {
        Self { store, provider }
    }

    pub fn get_times(
        &self,
        date: NaiveDate,
        location: &Location,
        force_refresh: bool,
    ) -> Result<DailyTimes> {
        let conn = self.store.conn();
        let date_str = format_date(date);

        if force_refresh {
            // must land before the fetch so a stale row can't be served back
            let removed = CacheRepo::delete(conn, &date_str, &location.city)?;
            log::info!(
                "forced refresh for {} / {}: dropped {} cached row(s)",
                date_str,
                location.city,
                removed
            );
        } else if let Some(cached) = CacheRepo::get(conn, &date_str, &location.city)? {
            log::debug!("cache hit for {} / {}", date_str, location.city);
            return Ok(cached);
        }

        log::info!("fetching times for {} / {}", date_str, location.city);
        let timings = self
            .provider
            .fetch_timings(date, location.latitude, location.longitude)?;

        let times = DailyTimes {
            date: date_str,
            city: location.city.clone(),
            country: location.country.clone(),
            fajr: timings.fajr,
            sunrise: timings.sunrise,
            dhuhr: timings.dhuhr,
            asr: timings.asr,
            maghrib: timings.maghrib,
            isha: timings.isha,
        };

        let tx = conn.unchecked_transaction()?;
        CacheRepo::store(
            &tx,
            &times,
            timings.latitude.unwrap_or(location.latitude),
            timings.longitude.unwrap_or(location.longitude),
        )?;
        PrayerRepo::ensure_rows(&tx, &times)?;
        tx.commit()?;

        Ok(times)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::VakitError;
    use crate::models::Timings;
    use chrono::NaiveTime;
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;

    /// Provider double: fixed timings, counts calls, can fail chosen dates.
    pub(crate) struct FakeProvider {
        pub calls: Cell<usize>,
        pub fail_on: RefCell<HashSet<NaiveDate>>,
        pub fajr: Cell<NaiveTime>,
    }

    impl FakeProvider {
        pub fn new() -> Self {
            Self {
                calls: Cell::new(0),
                fail_on: RefCell::new(HashSet::new()),
                fajr: Cell::new(hm(5, 30)),
            }
        }
    }

    pub(crate) fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    pub(crate) fn konya() -> Location {
        Location {
            city: "Konya".to_string(),
            country: "Turkey".to_string(),
            latitude: 37.87,
            longitude: 32.48,
        }
    }

    impl TimingsProvider for FakeProvider {
        fn fetch_timings(&self, date: NaiveDate, _lat: f64, _lon: f64) -> Result<Timings> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_on.borrow().contains(&date) {
                return Err(VakitError::Upstream("HTTP 503".to_string()));
            }
            Ok(Timings {
                fajr: self.fajr.get(),
                sunrise: hm(7, 0),
                dhuhr: hm(12, 30),
                asr: hm(15, 45),
                maghrib: hm(18, 20),
                isha: hm(19, 50),
                latitude: None,
                longitude: None,
            })
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 27).unwrap()
    }

    #[test]
    fn second_lookup_is_served_from_cache() {
        let store = Store::open_in_memory().unwrap();
        let provider = FakeProvider::new();
        let cache = PrayerTimesCache::new(&store, &provider);

        let first = cache.get_times(day(), &konya(), false).unwrap();
        let second = cache.get_times(day(), &konya(), false).unwrap();

        assert_eq!(provider.calls.get(), 1);
        assert_eq!(first, second);
        assert_eq!(second.date, "27-01-2026");
        assert_eq!(second.country, "Turkey");
    }

    #[test]
    fn forced_refresh_always_fetches_and_replaces_row() {
        let store = Store::open_in_memory().unwrap();
        let provider = FakeProvider::new();
        let cache = PrayerTimesCache::new(&store, &provider);

        cache.get_times(day(), &konya(), false).unwrap();
        provider.fajr.set(hm(5, 31));
        let refreshed = cache.get_times(day(), &konya(), true).unwrap();

        assert_eq!(provider.calls.get(), 2);
        assert_eq!(refreshed.fajr, hm(5, 31));
        assert_eq!(CacheRepo::count(store.conn()).unwrap(), 1);
        let cached = CacheRepo::get(store.conn(), "27-01-2026", "Konya").unwrap().unwrap();
        assert_eq!(cached.fajr, hm(5, 31));
    }

    #[test]
    fn miss_materializes_tracking_rows_once() {
        let store = Store::open_in_memory().unwrap();
        let provider = FakeProvider::new();
        let cache = PrayerTimesCache::new(&store, &provider);

        cache.get_times(day(), &konya(), false).unwrap();
        cache.get_times(day(), &konya(), true).unwrap();

        let rows = PrayerRepo::get_by_date(store.conn(), "27-01-2026").unwrap();
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| !r.is_performed));
    }

    #[test]
    fn upstream_failure_surfaces_and_writes_nothing() {
        let store = Store::open_in_memory().unwrap();
        let provider = FakeProvider::new();
        provider.fail_on.borrow_mut().insert(day());
        let cache = PrayerTimesCache::new(&store, &provider);

        let err = cache.get_times(day(), &konya(), false).unwrap_err();
        assert!(matches!(err, VakitError::Upstream(_)));
        assert_eq!(CacheRepo::count(store.conn()).unwrap(), 0);
        assert!(PrayerRepo::get_by_date(store.conn(), "27-01-2026").unwrap().is_empty());
    }
}
