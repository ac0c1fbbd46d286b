use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use std::io::{self, Write};
use std::str::FromStr;
use std::thread;

use crate::cli::args::{NotifyCommands, QazaCommands};
use crate::config::AppConfig;
use crate::db::repository::SettingsRepo;
use crate::db::Store;
use crate::ledger::{DayBoard, PrayerStatusLedger, QazaTracker};
use crate::models::{Location, PrayerName, PrayerStatus};
use crate::notifications::{NotificationScheduler, NotificationSink, OutboxSink, ScheduleReport};
use crate::prayer_times::next::{countdown, resolve_next, CountdownTrigger};
use crate::prayer_times::window::{effective_prayer_date, format_date, parse_date};
use crate::prayer_times::{PrayerTimesCache, TimingsProvider};
use crate::stats::StreakEngine;
use crate::utils::format::{format_hms, format_time, progress_bar};

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! print_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        print!("\x1b[0m");
    }};
}

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;2;196;160;68m";

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn status_color(status: PrayerStatus) -> &'static str {
    match status {
        PrayerStatus::Performed | PrayerStatus::PerformedCongregation => GREEN,
        PrayerStatus::Missed => RED,
        PrayerStatus::Pending => BOLD,
    }
}

// ─── Times ───────────────────────────────────────────────────────────────────

/// What the countdown points at.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Upcoming {
    label: &'static str,
    time: NaiveTime,
    tomorrow: bool,
}

/// Next slot after `now` on the calendar day. Once the day's last slot has
/// passed, this is tomorrow's Sabah from tomorrow's table.
fn upcoming(cache: &PrayerTimesCache<'_>, location: &Location, now: NaiveDateTime) -> Result<Upcoming> {
    let table = cache.get_times(now.date(), location, false)?;
    let next = resolve_next(&table.slots(), now.time())
        .ok_or_else(|| anyhow!("Empty prayer table for {}", table.date))?;

    if !next.rolled_over {
        return Ok(Upcoming {
            label: next.slot.slot.label(),
            time: next.slot.time,
            tomorrow: false,
        });
    }

    let tomorrow = cache.get_times(now.date() + Duration::days(1), location, false)?;
    Ok(Upcoming {
        label: PrayerName::Sabah.as_str(),
        time: tomorrow.fajr,
        tomorrow: true,
    })
}

pub fn handle_times(
    store: &Store,
    config: &AppConfig,
    provider: &dyn TimingsProvider,
    refresh: bool,
    watch: bool,
) -> Result<()> {
    let location = config.location.to_location();
    let cache = PrayerTimesCache::new(store, provider);
    let ledger = PrayerStatusLedger::new(store);
    let now = now();
    let date = effective_prayer_date(now);

    let times = cache.get_times(date, &location, refresh)?;
    let board = DayBoard::load(&ledger, date)?;

    println!();
    println_colored!(GOLD, "  Namaz Vakitleri · {}, {} ({})", times.city, times.country, times.date);
    println!();

    for slot in times.slots() {
        let time_str = format_time(slot.time);
        match slot.slot.prayer().and_then(|p| board.status_of(p)) {
            Some(status) => {
                println_colored!(
                    status_color(status),
                    "  {} {:<8}  {}",
                    status.symbol(),
                    slot.slot.label(),
                    time_str
                );
            }
            None => println_colored!(DIM, "    {:<8}  {}", slot.slot.label(), time_str),
        }
    }
    println!();
    println_colored!(DIM, "  {}/5 kılındı", board.performed_count());

    let next = upcoming(&cache, &location, now)?;
    println!();
    println_colored!(
        AMBER,
        "  Sıradaki: {}{} {} · {}",
        next.label,
        if next.tomorrow { " (yarın)" } else { "" },
        format_time(next.time),
        format_hms(countdown(next.time, now))
    );
    println!();

    if watch {
        watch_countdown(&cache, &ledger, &location)?;
    }
    Ok(())
}

/// Ticks once a second. When the countdown reaches its target the day's
/// status is reloaded and the next slot becomes the new target.
fn watch_countdown(
    cache: &PrayerTimesCache<'_>,
    ledger: &PrayerStatusLedger<'_>,
    location: &Location,
) -> Result<()> {
    let mut trigger = CountdownTrigger::new();
    loop {
        let now = now();
        if trigger.poll(now) {
            log::info!("countdown reached {:?}", trigger.target());
            let board = DayBoard::load(ledger, effective_prayer_date(now))?;
            println!();
            println_colored!(GOLD, "  Vakit girdi · {}/5 kılındı", board.performed_count());
        }

        let next = upcoming(cache, location, now)?;
        if trigger.retarget(next.time, now) {
            log::debug!("countdown now targets {} {}", next.label, format_time(next.time));
        }

        print_colored!(
            AMBER,
            "\r  {} {} · {}   ",
            next.label,
            format_time(next.time),
            format_hms(countdown(next.time, now))
        );
        io::stdout().flush()?;
        thread::sleep(std::time::Duration::from_secs(1));
    }
}

// ─── Mark prayer ─────────────────────────────────────────────────────────────

pub fn handle_mark(
    store: &Store,
    config: &AppConfig,
    provider: &dyn TimingsProvider,
    prayer_str: &str,
    missed: bool,
    congregation: bool,
) -> Result<()> {
    let prayer = PrayerName::from_str(prayer_str)
        .map_err(|_| anyhow!("Unknown prayer '{}'. Use: sabah, ogle, ikindi, aksam, yatsi", prayer_str))?;
    let now = now();
    let date = effective_prayer_date(now);

    // materializes the day's rows if this is the first touch
    PrayerTimesCache::new(store, provider).get_times(date, &config.location.to_location(), false)?;

    let ledger = PrayerStatusLedger::new(store);
    let mut board = DayBoard::load(&ledger, date)?;

    if missed {
        board.mark_missed(&ledger, prayer, now)?;
        println_colored!(RED, "  ✗ {} kılınmadı, kaza listesine eklendi", prayer);
    } else {
        board.confirm(&ledger, prayer, congregation, now)?;
        if congregation {
            println_colored!(GREEN, "  ✓ {} cemaatle kılındı", prayer);
        } else {
            println_colored!(GREEN, "  ✓ {} kılındı", prayer);
        }
    }
    println_colored!(DIM, "  {} · {}/5", format_date(date), board.performed_count());
    Ok(())
}

// ─── Qaza ────────────────────────────────────────────────────────────────────

pub fn handle_qaza(store: &Store, action: &QazaCommands) -> Result<()> {
    let tracker = QazaTracker::new(store);
    let now = now();
    let today = effective_prayer_date(now);

    match action {
        QazaCommands::List => {
            let groups = tracker.list_open_qaza(today)?;
            let count: usize = groups.iter().map(|g| g.items.len()).sum();
            println!();
            if count == 0 {
                println_colored!(GREEN, "  ✓ Kaza namazı yok");
            } else {
                println_colored!(AMBER, "  Kaza Listesi ({} namaz)", count);
                let mut n = 0;
                for group in &groups {
                    println!();
                    println_colored!(BOLD, "  {}", format_date(group.date));
                    for item in &group.items {
                        n += 1;
                        if item.notes.is_empty() {
                            println!("  {:>3}. {}", n, item.prayer_name);
                        } else {
                            println!("  {:>3}. {}  {}", n, item.prayer_name, item.notes);
                        }
                    }
                }
            }
            println!();
        }
        QazaCommands::Add { prayer, date, notes } => {
            let prayer = PrayerName::from_str(prayer)
                .map_err(|_| anyhow!("Unknown prayer '{}'", prayer))?;
            let date = match date {
                Some(d) => parse_date(d)?,
                None => today,
            };
            if tracker.add(date, prayer, notes)? {
                println_colored!(AMBER, "  {} {} kaza listesine eklendi", format_date(date), prayer);
            } else {
                println_colored!(DIM, "  {} {} zaten listede", format_date(date), prayer);
            }
        }
        QazaCommands::Compensate { index } => {
            let items = tracker.open_items(today)?;
            let item = index
                .checked_sub(1)
                .and_then(|i| items.get(i))
                .ok_or_else(|| anyhow!("No qaza entry #{} (open: {})", index, items.len()))?;
            tracker.compensate(item, now)?;
            println_colored!(
                GREEN,
                "  ✓ {} {} kazası kılındı · kalan {}",
                format_date(item.date),
                item.prayer_name,
                items.len() - 1
            );
        }
    }
    Ok(())
}

// ─── Notifications ───────────────────────────────────────────────────────────

fn print_report(report: &ScheduleReport) {
    if report.disabled {
        println_colored!(DIM, "  Bildirimler kapalı, bekleyen bildirim yok");
        return;
    }
    println_colored!(
        GREEN,
        "  ✓ {} bildirim planlandı ({} geçmiş, {} zaten planlı)",
        report.scheduled,
        report.skipped_past,
        report.skipped_duplicate
    );
    for (date, reason) in &report.failed_days {
        println_colored!(RED, "  ✗ {}: {}", format_date(*date), reason);
    }
    for date in &report.over_budget_days {
        println_colored!(AMBER, "  {} bildirim sınırı nedeniyle planlanmadı", format_date(*date));
    }
}

fn reschedule(store: &Store, config: &AppConfig, provider: &dyn TimingsProvider) -> Result<ScheduleReport> {
    let sink = OutboxSink::new(store);
    let scheduler =
        NotificationScheduler::new(store, &sink, config.notifications.reminder_offset_minutes);
    let cache = PrayerTimesCache::new(store, provider);
    Ok(scheduler.schedule_horizon(
        &cache,
        &config.location.to_location(),
        config.notifications.horizon_days,
        now(),
    )?)
}

pub fn handle_schedule(
    store: &Store,
    config: &AppConfig,
    provider: &dyn TimingsProvider,
    today: bool,
) -> Result<()> {
    let report = if today {
        let now = now();
        let times = PrayerTimesCache::new(store, provider).get_times(
            now.date(),
            &config.location.to_location(),
            false,
        )?;
        let sink = OutboxSink::new(store);
        NotificationScheduler::new(store, &sink, config.notifications.reminder_offset_minutes)
            .schedule_today(&times, now)?
    } else {
        reschedule(store, config, provider)?
    };
    print_report(&report);
    Ok(())
}

pub fn handle_notify(
    store: &Store,
    config: &AppConfig,
    provider: &dyn TimingsProvider,
    action: &NotifyCommands,
) -> Result<()> {
    match action {
        NotifyCommands::On | NotifyCommands::Off => {
            let enabled = matches!(action, NotifyCommands::On);
            SettingsRepo::set_notification_enabled(store.conn(), enabled)?;
            log::info!("notifications {}", if enabled { "enabled" } else { "disabled" });
            print_report(&reschedule(store, config, provider)?);
        }
        NotifyCommands::List => {
            let pending = OutboxSink::new(store).list_pending(now())?;
            println!();
            if pending.is_empty() {
                println_colored!(DIM, "  Bekleyen bildirim yok");
            }
            for p in &pending {
                println!(
                    "  {}  {:<8} {}",
                    p.fire_at.format("%d-%m-%Y %H:%M"),
                    p.payload.kind.as_str(),
                    p.payload.title
                );
            }
            println!();
        }
    }
    Ok(())
}

// ─── Stats ───────────────────────────────────────────────────────────────────

pub fn handle_stats(store: &Store, week: bool, month: bool) -> Result<()> {
    let engine = StreakEngine::new(store);
    let now = now();
    let today = effective_prayer_date(now);

    let streak = engine.streak_stats(now)?;
    let qaza_count = QazaTracker::new(store).open_count(today)?;
    let comparison = engine.week_comparison(today)?;

    println!();
    println_colored!(GOLD, "  İstatistikler");
    println!();
    println_colored!(
        BOLD,
        "  Seri:        {} gün  |  en iyi {} gün",
        streak.current_streak,
        streak.best_streak
    );
    println!("  Tam gün:     {}", streak.total_full_days);

    if qaza_count == 0 {
        println_colored!(GREEN, "  Kaza:        0 ✓");
    } else {
        println_colored!(AMBER, "  Kaza:        {}", qaza_count);
    }

    let delta = comparison.delta();
    let color = if delta >= 0 { GREEN } else { RED };
    println_colored!(
        color,
        "  Bu hafta:    {} namaz ({:+} geçen haftaya göre)",
        comparison.current_week,
        delta
    );

    let days = if month { 30 } else if week { 7 } else { 0 };
    if days > 0 {
        println!();
        for count in engine.daily_counts(today, days)? {
            let bar = progress_bar(count.performed as u32, 5, 5);
            let color = match count.performed {
                5 => GREEN,
                0 => DIM,
                _ => AMBER,
            };
            println_colored!(
                color,
                "  {}  {}  {}/5  {:>3.0}%",
                count.date,
                bar,
                count.performed,
                count.completion_ratio() * 100.0
            );
        }
    }
    println!();
    Ok(())
}

pub fn handle_achievements(store: &Store) -> Result<()> {
    let list = StreakEngine::new(store)
        .achievements(now())
        .context("Computing achievements")?;

    println!();
    println_colored!(GOLD, "  Başarılar");
    println!();
    for a in &list {
        let bar = progress_bar(a.progress.min(a.target), a.target, 10);
        if a.is_unlocked {
            println_colored!(GREEN, "  {} {:<22} {}  {}/{}", a.icon, a.title, bar, a.progress, a.target);
        } else {
            println_colored!(DIM, "  {} {:<22} {}  {}/{}", a.icon, a.title, bar, a.progress, a.target);
        }
        println_colored!(DIM, "     {}", a.description);
    }
    println!();
    Ok(())
}
