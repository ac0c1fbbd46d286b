use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::str::FromStr;

use crate::db::TIMESTAMP_FORMAT;
use crate::error::{Result, VakitError};
use crate::models::{DailyTimes, PrayerName, PrayerRecord, QazaEntry};
use crate::prayer_times::window::parse_date;
use crate::utils::format::{format_time, parse_time};

fn prayer_from_db(s: &str) -> Result<PrayerName> {
    PrayerName::from_str(s).map_err(|_| VakitError::Corrupt(format!("prayer name '{}'", s)))
}

fn timestamp_from_db(s: Option<String>) -> Option<NaiveDateTime> {
    s.and_then(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).ok())
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

// ─── Cached prayer times ────────────────────────────────────────────────────

pub struct CacheRepo;

impl CacheRepo {
    pub fn get(conn: &Connection, date: &str, city: &str) -> Result<Option<DailyTimes>> {
        let row = conn
            .query_row(
                "SELECT date, city, country, fajr, sunrise, dhuhr, asr, maghrib, isha
                 FROM prayer_times_cache WHERE date = ?1 AND city = ?2 LIMIT 1",
                params![date, city],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        [
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                            row.get::<_, String>(5)?,
                            row.get::<_, String>(6)?,
                            row.get::<_, String>(7)?,
                            row.get::<_, String>(8)?,
                        ],
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((date, city, country, [fajr, sunrise, dhuhr, asr, maghrib, isha])) => {
                Ok(Some(DailyTimes {
                    date,
                    city,
                    country,
                    fajr: parse_time(&fajr)?,
                    sunrise: parse_time(&sunrise)?,
                    dhuhr: parse_time(&dhuhr)?,
                    asr: parse_time(&asr)?,
                    maghrib: parse_time(&maghrib)?,
                    isha: parse_time(&isha)?,
                }))
            }
        }
    }

    pub fn delete(conn: &Connection, date: &str, city: &str) -> Result<usize> {
        Ok(conn.execute(
            "DELETE FROM prayer_times_cache WHERE date = ?1 AND city = ?2",
            params![date, city],
        )?)
    }

    /// Insert-or-ignore keyed by (date, city); returns rows written.
    pub fn store(
        conn: &Connection,
        times: &DailyTimes,
        latitude: f64,
        longitude: f64,
    ) -> Result<usize> {
        Ok(conn.execute(
            "INSERT OR IGNORE INTO prayer_times_cache
                (date, city, country, fajr, sunrise, dhuhr, asr, maghrib, isha, latitude, longitude)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                times.date,
                times.city,
                times.country,
                format_time(times.fajr),
                format_time(times.sunrise),
                format_time(times.dhuhr),
                format_time(times.asr),
                format_time(times.maghrib),
                format_time(times.isha),
                latitude,
                longitude,
            ],
        )?)
    }

    #[cfg(test)]
    pub fn count(conn: &Connection) -> Result<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM prayer_times_cache", [], |row| row.get(0))?)
    }
}

// ─── Prayer repo ─────────────────────────────────────────────────────────────

pub struct PrayerRepo;

impl PrayerRepo {
    /// Ensure a tracking row exists for each obligatory prayer of the day.
    pub fn ensure_rows(conn: &Connection, times: &DailyTimes) -> Result<()> {
        for p in PrayerName::all() {
            conn.execute(
                "INSERT OR IGNORE INTO prayers (prayer_name, date, prayer_time, is_performed)
                 VALUES (?1, ?2, ?3, 0)",
                params![p.as_str(), times.date, format_time(times.time_of(*p))],
            )?;
        }
        Ok(())
    }

    pub fn get_by_date(conn: &Connection, date: &str) -> Result<Vec<PrayerRecord>> {
        let mut stmt = conn.prepare(
            "SELECT id, prayer_name, date, prayer_time, is_performed, is_congregation, performed_at
             FROM prayers WHERE date = ?1",
        )?;

        let rows = stmt.query_map(params![date], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i32>(4)?,
                row.get::<_, i32>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?;

        let mut result = Vec::new();
        for r in rows {
            let (id, name, date, time, performed, congregation, performed_at) = r?;
            result.push(PrayerRecord {
                id,
                prayer_name: prayer_from_db(&name)?,
                date,
                scheduled_time: parse_time(&time)?,
                is_performed: performed != 0,
                is_congregation: congregation != 0,
                performed_at: timestamp_from_db(performed_at),
            });
        }
        result.sort_by_key(|p| p.prayer_name.index());
        Ok(result)
    }

    pub fn exists(conn: &Connection, date: &str, prayer: PrayerName) -> Result<bool> {
        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM prayers WHERE date = ?1 AND prayer_name = ?2",
                params![date, prayer.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.is_some())
    }

    pub fn set_performed(
        conn: &Connection,
        date: &str,
        prayer: PrayerName,
        congregation: bool,
        at: NaiveDateTime,
    ) -> Result<usize> {
        Ok(conn.execute(
            "UPDATE prayers SET is_performed = 1, is_congregation = ?1, performed_at = ?2
             WHERE date = ?3 AND prayer_name = ?4",
            params![congregation as i32, format_timestamp(at), date, prayer.as_str()],
        )?)
    }

    pub fn set_not_performed(conn: &Connection, date: &str, prayer: PrayerName) -> Result<usize> {
        Ok(conn.execute(
            "UPDATE prayers SET is_performed = 0, is_congregation = 0, performed_at = NULL
             WHERE date = ?1 AND prayer_name = ?2",
            params![date, prayer.as_str()],
        )?)
    }

    /// Makeup write: flips the flag but keeps the first completion timestamp,
    /// so repeating it changes nothing.
    pub fn mark_made_up(
        conn: &Connection,
        date: &str,
        prayer: PrayerName,
        at: NaiveDateTime,
    ) -> Result<usize> {
        Ok(conn.execute(
            "UPDATE prayers SET is_performed = 1, performed_at = COALESCE(performed_at, ?1)
             WHERE date = ?2 AND prayer_name = ?3",
            params![format_timestamp(at), date, prayer.as_str()],
        )?)
    }

    /// Every unperformed row, with its parsed date.
    pub fn unperformed(conn: &Connection) -> Result<Vec<(NaiveDate, PrayerName)>> {
        let mut stmt = conn.prepare(
            "SELECT date, prayer_name FROM prayers WHERE is_performed = 0",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut result = Vec::new();
        for r in rows {
            let (date, name) = r?;
            result.push((parse_date(&date)?, prayer_from_db(&name)?));
        }
        Ok(result)
    }
}

// ─── Qaza repo ───────────────────────────────────────────────────────────────

pub struct QazaRepo;

impl QazaRepo {
    /// Open explicit entries, newest missed date first.
    pub fn open_entries(conn: &Connection) -> Result<Vec<QazaEntry>> {
        let mut stmt = conn.prepare(
            "SELECT id, prayer_name, missed_date, is_compensated, compensated_at, notes
             FROM qaza_prayers WHERE is_compensated = 0
             ORDER BY id DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i32>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut result = Vec::new();
        for r in rows {
            let (id, name, missed_date, compensated, compensated_at, notes) = r?;
            result.push(QazaEntry {
                id,
                prayer_name: prayer_from_db(&name)?,
                missed_date,
                is_compensated: compensated != 0,
                compensated_at: timestamp_from_db(compensated_at),
                notes: notes.unwrap_or_default(),
            });
        }
        // DD-MM-YYYY does not sort chronologically as text
        result.sort_by_cached_key(|e| std::cmp::Reverse(parse_date(&e.missed_date).ok()));
        Ok(result)
    }

    pub fn find_open(conn: &Connection, date: &str, prayer: PrayerName) -> Result<Option<i64>> {
        Ok(conn
            .query_row(
                "SELECT id FROM qaza_prayers
                 WHERE missed_date = ?1 AND prayer_name = ?2 AND is_compensated = 0
                 ORDER BY id LIMIT 1",
                params![date, prayer.as_str()],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Create an open entry unless one already exists. Returns true if created.
    pub fn ensure_open(
        conn: &Connection,
        date: &str,
        prayer: PrayerName,
        notes: &str,
    ) -> Result<bool> {
        if Self::find_open(conn, date, prayer)?.is_some() {
            return Ok(false);
        }
        conn.execute(
            "INSERT INTO qaza_prayers (prayer_name, missed_date, notes) VALUES (?1, ?2, ?3)",
            params![prayer.as_str(), date, notes],
        )?;
        Ok(true)
    }

    /// Drop open entries for a key, used when the prayer turns out performed
    /// on its own day.
    pub fn clear_open(conn: &Connection, date: &str, prayer: PrayerName) -> Result<usize> {
        Ok(conn.execute(
            "DELETE FROM qaza_prayers WHERE missed_date = ?1 AND prayer_name = ?2 AND is_compensated = 0",
            params![date, prayer.as_str()],
        )?)
    }

    pub fn mark_compensated(conn: &Connection, id: i64, at: NaiveDateTime) -> Result<usize> {
        Ok(conn.execute(
            "UPDATE qaza_prayers SET is_compensated = 1, compensated_at = ?1
             WHERE id = ?2 AND is_compensated = 0",
            params![format_timestamp(at), id],
        )?)
    }

    pub fn open_for_date(conn: &Connection, date: &str) -> Result<Vec<PrayerName>> {
        let mut stmt = conn.prepare(
            "SELECT prayer_name FROM qaza_prayers WHERE missed_date = ?1 AND is_compensated = 0",
        )?;
        let names = stmt
            .query_map(params![date], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        names.iter().map(|n| prayer_from_db(n)).collect()
    }
}

// ─── Stats repo ──────────────────────────────────────────────────────────────

pub struct StatsRepo;

impl StatsRepo {
    /// Dates on which all five prayers are performed, most recent first.
    pub fn full_day_dates(conn: &Connection) -> Result<Vec<NaiveDate>> {
        let mut stmt = conn.prepare(
            "SELECT date FROM prayers
             WHERE is_performed = 1
             GROUP BY date
             HAVING COUNT(*) = 5",
        )?;

        let dates = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut parsed = dates
            .iter()
            .map(|d| parse_date(d))
            .collect::<Result<Vec<_>>>()?;
        parsed.sort_by(|a, b| b.cmp(a));
        Ok(parsed)
    }

    pub fn performed_per_date(conn: &Connection) -> Result<HashMap<NaiveDate, u8>> {
        let mut stmt = conn.prepare(
            "SELECT date, COUNT(*) FROM prayers WHERE is_performed = 1 GROUP BY date",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut result = HashMap::new();
        for r in rows {
            let (date, count) = r?;
            result.insert(parse_date(&date)?, count.clamp(0, 5) as u8);
        }
        Ok(result)
    }

    pub fn count_congregation(conn: &Connection) -> Result<u32> {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM prayers WHERE is_performed = 1 AND is_congregation = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(n as u32)
    }

    pub fn count_performed(conn: &Connection, prayer: PrayerName) -> Result<u32> {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM prayers WHERE is_performed = 1 AND prayer_name = ?1",
            params![prayer.as_str()],
            |row| row.get(0),
        )?;
        Ok(n as u32)
    }
}

// ─── App settings ────────────────────────────────────────────────────────────

pub struct SettingsRepo;

impl SettingsRepo {
    pub const NOTIFICATION_ENABLED: &'static str = "notification_enabled";

    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        Ok(conn
            .query_row(
                "SELECT value FROM app_settings WHERE key = ?1",
                params![key],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten())
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO app_settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// Missing or unreadable values count as enabled.
    pub fn notification_enabled(conn: &Connection) -> Result<bool> {
        Ok(Self::get(conn, Self::NOTIFICATION_ENABLED)?.as_deref() != Some("0"))
    }

    pub fn set_notification_enabled(conn: &Connection, enabled: bool) -> Result<()> {
        Self::set(conn, Self::NOTIFICATION_ENABLED, if enabled { "1" } else { "0" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use chrono::NaiveTime;

    fn times(date: &str) -> DailyTimes {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        DailyTimes {
            date: date.to_string(),
            city: "Konya".to_string(),
            country: "Turkey".to_string(),
            fajr: t(5, 30),
            sunrise: t(7, 0),
            dhuhr: t(12, 30),
            asr: t(15, 45),
            maghrib: t(18, 20),
            isha: t(19, 50),
        }
    }

    #[test]
    fn ensure_rows_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let day = times("27-01-2026");
        PrayerRepo::ensure_rows(store.conn(), &day).unwrap();
        PrayerRepo::ensure_rows(store.conn(), &day).unwrap();

        let rows = PrayerRepo::get_by_date(store.conn(), "27-01-2026").unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].prayer_name, PrayerName::Sabah);
        assert_eq!(format_time(rows[4].scheduled_time), "19:50");
    }

    #[test]
    fn cache_store_ignores_duplicates() {
        let store = Store::open_in_memory().unwrap();
        let day = times("27-01-2026");
        assert_eq!(CacheRepo::store(store.conn(), &day, 37.8, 32.4).unwrap(), 1);
        assert_eq!(CacheRepo::store(store.conn(), &day, 37.8, 32.4).unwrap(), 0);
        assert_eq!(CacheRepo::get(store.conn(), "27-01-2026", "Konya").unwrap(), Some(day));
    }

    #[test]
    fn ensure_open_never_duplicates() {
        let store = Store::open_in_memory().unwrap();
        assert!(QazaRepo::ensure_open(store.conn(), "26-01-2026", PrayerName::Aksam, "").unwrap());
        assert!(!QazaRepo::ensure_open(store.conn(), "26-01-2026", PrayerName::Aksam, "").unwrap());
        assert_eq!(QazaRepo::open_entries(store.conn()).unwrap().len(), 1);
    }

    #[test]
    fn open_entries_sort_by_real_date() {
        let store = Store::open_in_memory().unwrap();
        QazaRepo::ensure_open(store.conn(), "31-12-2025", PrayerName::Sabah, "").unwrap();
        QazaRepo::ensure_open(store.conn(), "02-01-2026", PrayerName::Sabah, "").unwrap();
        let dates: Vec<String> = QazaRepo::open_entries(store.conn())
            .unwrap()
            .into_iter()
            .map(|e| e.missed_date)
            .collect();
        assert_eq!(dates, vec!["02-01-2026", "31-12-2025"]);
    }

    #[test]
    fn notification_flag_defaults_on() {
        let store = Store::open_in_memory().unwrap();
        assert!(SettingsRepo::notification_enabled(store.conn()).unwrap());
        SettingsRepo::set_notification_enabled(store.conn(), false).unwrap();
        assert!(!SettingsRepo::notification_enabled(store.conn()).unwrap());
    }
}
