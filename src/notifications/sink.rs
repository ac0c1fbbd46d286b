use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::db::repository::format_timestamp;
use crate::db::{Store, TIMESTAMP_FORMAT};
use crate::error::{Result, VakitError};
use crate::models::PrayerName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    /// Fires at the prayer time and asks about the prayer that just ended.
    Adhan,
    /// Fires a while after the prayer time, asking for a status entry.
    Reminder,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Adhan => "adhan",
            NotificationKind::Reminder => "reminder",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = VakitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "adhan" => Ok(NotificationKind::Adhan),
            "reminder" => Ok(NotificationKind::Reminder),
            _ => Err(VakitError::Corrupt(format!("notification kind '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Stable identity, `DD-MM-YYYY/<prayer>/<kind>`.
    pub key: String,
    pub kind: NotificationKind,
    pub prayer: PrayerName,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationHandle(pub i64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNotification {
    pub handle: NotificationHandle,
    pub fire_at: NaiveDateTime,
    pub payload: NotificationPayload,
}

/// Delivery side of local alerts. Exact firing is the platform's business.
pub trait NotificationSink {
    /// Schedule `payload` at `at`. Scheduling a key that is already pending
    /// returns the existing handle.
    fn schedule_at(&self, at: NaiveDateTime, payload: &NotificationPayload) -> Result<NotificationHandle>;
    fn cancel_all(&self) -> Result<usize>;
    /// Alerts that have not fired as of `now`, soonest first.
    fn list_pending(&self, now: NaiveDateTime) -> Result<Vec<PendingNotification>>;
}

/// Local outbox in the `pending_notifications` table.
pub struct OutboxSink<'a> {
    store: &'a Store,
}

impl<'a> OutboxSink<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl NotificationSink for OutboxSink<'_> {
    fn schedule_at(&self, at: NaiveDateTime, payload: &NotificationPayload) -> Result<NotificationHandle> {
        let conn = self.store.conn();
        conn.execute(
            "INSERT OR IGNORE INTO pending_notifications (key, fire_at, kind, prayer_name, title, body)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                payload.key,
                format_timestamp(at),
                payload.kind.as_str(),
                payload.prayer.as_str(),
                payload.title,
                payload.body,
            ],
        )?;
        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM pending_notifications WHERE key = ?1",
                params![payload.key],
                |row| row.get(0),
            )
            .optional()?;
        id.map(NotificationHandle)
            .ok_or_else(|| VakitError::Corrupt(format!("outbox lost '{}'", payload.key)))
    }

    fn cancel_all(&self) -> Result<usize> {
        Ok(self.store.conn().execute("DELETE FROM pending_notifications", [])?)
    }

    fn list_pending(&self, now: NaiveDateTime) -> Result<Vec<PendingNotification>> {
        let mut stmt = self.store.conn().prepare(
            "SELECT id, key, fire_at, kind, prayer_name, title, body FROM pending_notifications",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut result = Vec::new();
        for r in rows {
            let (id, key, fire_at, kind, prayer, title, body) = r?;
            let fire_at = NaiveDateTime::parse_from_str(&fire_at, TIMESTAMP_FORMAT)
                .map_err(|_| VakitError::Corrupt(format!("fire_at '{}'", fire_at)))?;
            if fire_at <= now {
                continue;
            }
            result.push(PendingNotification {
                handle: NotificationHandle(id),
                fire_at,
                payload: NotificationPayload {
                    key,
                    kind: kind.parse()?,
                    prayer: prayer
                        .parse()
                        .map_err(|_| VakitError::Corrupt(format!("prayer name '{}'", prayer)))?,
                    title,
                    body,
                },
            });
        }
        result.sort_by_key(|p| p.fire_at);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn payload(key: &str) -> NotificationPayload {
        NotificationPayload {
            key: key.to_string(),
            kind: NotificationKind::Adhan,
            prayer: PrayerName::Ogle,
            title: "Öğle Vakti 🕌".to_string(),
            body: "test".to_string(),
        }
    }

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 27).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn same_key_keeps_one_row() {
        let store = Store::open_in_memory().unwrap();
        let sink = OutboxSink::new(&store);
        let a = sink.schedule_at(at(12), &payload("k")).unwrap();
        let b = sink.schedule_at(at(12), &payload("k")).unwrap();
        assert_eq!(a, b);
        assert_eq!(sink.list_pending(at(0)).unwrap().len(), 1);
    }

    #[test]
    fn fired_alerts_are_not_pending() {
        let store = Store::open_in_memory().unwrap();
        let sink = OutboxSink::new(&store);
        sink.schedule_at(at(12), &payload("noon")).unwrap();
        sink.schedule_at(at(18), &payload("evening")).unwrap();

        let pending = sink.list_pending(at(13)).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].payload.key, "evening");

        assert_eq!(sink.cancel_all().unwrap(), 2);
        assert!(sink.list_pending(at(0)).unwrap().is_empty());
    }
}
