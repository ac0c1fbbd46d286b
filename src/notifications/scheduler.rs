use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashSet;

use crate::db::repository::SettingsRepo;
use crate::db::Store;
use crate::error::{Result, VakitError};
use crate::models::{DailyTimes, Location, PrayerName};
use crate::notifications::sink::{NotificationKind, NotificationPayload, NotificationSink};
use crate::prayer_times::window::{format_date, next_n_dates, parse_date};
use crate::prayer_times::PrayerTimesCache;

/// Hard ceiling of pending local alerts most platforms accept.
pub const PLATFORM_PENDING_LIMIT: usize = 64;
pub const NOTIFICATIONS_PER_PRAYER: usize = 2;
pub const DEFAULT_HORIZON_DAYS: usize = 3;
pub const DEFAULT_REMINDER_OFFSET_MINUTES: i64 = 15;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Notifications flag was off; everything pending was cancelled.
    pub disabled: bool,
    pub scheduled: usize,
    pub skipped_past: usize,
    pub skipped_duplicate: usize,
    pub failed_days: Vec<(NaiveDate, String)>,
    /// Days left out whole because their alerts would pass the ceiling.
    pub over_budget_days: Vec<NaiveDate>,
}

struct PlannedAlert {
    at: NaiveDateTime,
    payload: NotificationPayload,
}

/// Adhan alert at the prayer time plus a reminder `offset` later.
fn plan_prayer(date: NaiveDate, times: &DailyTimes, prayer: PrayerName, offset: Duration) -> [PlannedAlert; 2] {
    let arrival = date.and_time(times.time_of(prayer));
    let previous = prayer.previous();
    let day = format_date(date);
    [
        PlannedAlert {
            at: arrival,
            payload: NotificationPayload {
                key: format!("{}/{}/{}", day, prayer, NotificationKind::Adhan.as_str()),
                kind: NotificationKind::Adhan,
                prayer,
                title: format!("{} Vakti 🕌", prayer),
                body: format!(
                    "Selamünaleyküm! {} ezanı okundu. {} namazını kıldın mı?",
                    prayer, previous
                ),
            },
        },
        PlannedAlert {
            at: arrival + offset,
            payload: NotificationPayload {
                key: format!("{}/{}/{}", day, prayer, NotificationKind::Reminder.as_str()),
                kind: NotificationKind::Reminder,
                prayer,
                title: format!("{} Namazını Kıldınız mı?", prayer),
                body: "Namazınızı işaretlemek için tıklayın.".to_string(),
            },
        },
    ]
}

pub struct NotificationScheduler<'a> {
    store: &'a Store,
    sink: &'a dyn NotificationSink,
    reminder_offset: Duration,
}

impl<'a> NotificationScheduler<'a> {
    pub fn new(store: &'a Store, sink: &'a dyn NotificationSink, reminder_offset_minutes: i64) -> Self {
        Self {
            store,
            sink,
            reminder_offset: Duration::minutes(reminder_offset_minutes),
        }
    }

    fn enabled(&self) -> Result<bool> {
        SettingsRepo::notification_enabled(self.store.conn())
    }

    fn pending_keys(&self, now: NaiveDateTime) -> Result<HashSet<String>> {
        Ok(self
            .sink
            .list_pending(now)?
            .into_iter()
            .map(|p| p.payload.key)
            .collect())
    }

    /// Submit one day's alerts as a unit. Past and already-pending alerts
    /// are counted and dropped; if the rest would pass the platform ceiling
    /// nothing of the day is scheduled.
    fn submit_day(
        &self,
        alerts: &[PlannedAlert],
        now: NaiveDateTime,
        pending: &mut HashSet<String>,
        report: &mut ScheduleReport,
    ) -> Result<()> {
        let mut fresh = Vec::new();
        let mut past = 0;
        let mut duplicate = 0;
        for alert in alerts {
            if alert.at <= now {
                past += 1;
            } else if pending.contains(&alert.payload.key) {
                duplicate += 1;
            } else {
                fresh.push(alert);
            }
        }

        if pending.len() + fresh.len() > PLATFORM_PENDING_LIMIT {
            return Err(VakitError::NotificationBudget(PLATFORM_PENDING_LIMIT));
        }

        report.skipped_past += past;
        report.skipped_duplicate += duplicate;
        for alert in fresh {
            self.sink.schedule_at(alert.at, &alert.payload)?;
            pending.insert(alert.payload.key.clone());
            report.scheduled += 1;
        }
        Ok(())
    }

    /// Schedule the remaining prayers of one day on top of whatever is
    /// pending. Prayers whose time has passed are skipped whole; alerts
    /// already pending are left alone.
    pub fn schedule_today(&self, times: &DailyTimes, now: NaiveDateTime) -> Result<ScheduleReport> {
        let mut report = ScheduleReport::default();
        if !self.enabled()? {
            let cancelled = self.sink.cancel_all()?;
            log::info!("notifications disabled; cancelled {} pending", cancelled);
            report.disabled = true;
            return Ok(report);
        }

        let date = parse_date(&times.date)?;
        let mut pending = self.pending_keys(now)?;

        let mut alerts = Vec::new();
        for prayer in PrayerName::all() {
            let planned = plan_prayer(date, times, *prayer, self.reminder_offset);
            if planned[0].at <= now {
                report.skipped_past += NOTIFICATIONS_PER_PRAYER;
                continue;
            }
            alerts.extend(planned);
        }
        self.submit_day(&alerts, now, &mut pending, &mut report)?;

        log::info!("scheduled {} notification(s) for {}", report.scheduled, times.date);
        Ok(report)
    }

    /// The authoritative rescheduling pass: cancel everything, then plan the
    /// next `days` calendar days. A day that fails is logged and skipped.
    pub fn schedule_horizon(
        &self,
        cache: &PrayerTimesCache<'_>,
        location: &Location,
        days: usize,
        now: NaiveDateTime,
    ) -> Result<ScheduleReport> {
        let mut report = ScheduleReport::default();

        let cancelled = self.sink.cancel_all()?;
        log::debug!("horizon pass cleared {} pending notification(s)", cancelled);

        if !self.enabled()? {
            log::info!("notifications disabled; horizon left empty");
            report.disabled = true;
            return Ok(report);
        }

        let mut pending = HashSet::new();
        for date in next_n_dates(now.date(), days) {
            match self.schedule_day(cache, location, date, now, &mut pending, &mut report) {
                Ok(()) => {}
                Err(VakitError::NotificationBudget(limit)) => {
                    log::warn!("{} left out: {} pending alert limit", format_date(date), limit);
                    report.over_budget_days.push(date);
                }
                Err(e) => {
                    log::warn!("could not schedule {}: {}", format_date(date), e);
                    report.failed_days.push((date, e.to_string()));
                }
            }
        }

        log::info!(
            "horizon of {} day(s): {} scheduled, {} past, {} failed, {} over budget",
            days,
            report.scheduled,
            report.skipped_past,
            report.failed_days.len(),
            report.over_budget_days.len()
        );
        Ok(report)
    }

    fn schedule_day(
        &self,
        cache: &PrayerTimesCache<'_>,
        location: &Location,
        date: NaiveDate,
        now: NaiveDateTime,
        pending: &mut HashSet<String>,
        report: &mut ScheduleReport,
    ) -> Result<()> {
        let times = cache.get_times(date, location, false)?;
        let alerts: Vec<PlannedAlert> = PrayerName::all()
            .iter()
            .flat_map(|p| plan_prayer(date, &times, *p, self.reminder_offset))
            .collect();
        self.submit_day(&alerts, now, pending, report)
    }
}
