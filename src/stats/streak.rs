use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::db::repository::StatsRepo;
use crate::db::Store;
use crate::error::Result;
use crate::models::{Achievement, AchievementInputs, DailyCount, PrayerName, StreakStats, WeekComparison};
use crate::prayer_times::window::format_date;

fn consecutive(later: NaiveDate, earlier: NaiveDate) -> bool {
    later - earlier == Duration::days(1)
}

/// Streaks over full-day dates sorted most recent first. The current streak
/// only counts if it reaches today or yesterday.
pub fn streak_from_dates(dates: &[NaiveDate], today: NaiveDate) -> StreakStats {
    let Some(&latest) = dates.first() else {
        return StreakStats::default();
    };

    let mut current = 0u32;
    if latest == today || latest == today - Duration::days(1) {
        current = 1;
        for pair in dates.windows(2) {
            if consecutive(pair[0], pair[1]) {
                current += 1;
            } else {
                break;
            }
        }
    }

    let mut best = 1u32;
    let mut run = 1u32;
    for pair in dates.windows(2) {
        if consecutive(pair[0], pair[1]) {
            run += 1;
        } else {
            run = 1;
        }
        best = best.max(run);
    }

    StreakStats {
        current_streak: current,
        best_streak: best,
        total_full_days: dates.len() as u32,
    }
}

fn achievement(
    id: &'static str,
    title: &'static str,
    description: &'static str,
    icon: &'static str,
    value: u32,
    target: u32,
) -> Achievement {
    Achievement {
        id,
        title,
        description,
        icon,
        target,
        progress: value.min(target),
        is_unlocked: value >= target,
    }
}

/// Fixed achievement table; nothing is stored, everything is recomputed.
pub fn achievements(inputs: &AchievementInputs) -> Vec<Achievement> {
    vec![
        achievement("first_week", "İlk Hafta", "7 gün üst üste tüm namazlar", "✅", inputs.best_streak, 7),
        achievement("month_completer", "Ay Tamamlayıcı", "30 gün tam namaz (Toplam)", "🔥", inputs.total_full_days, 30),
        achievement("hundred_days", "100 Gün", "100 gün tam namaz (Toplam)", "💎", inputs.total_full_days, 100),
        achievement("congregation_friendly", "Cemaat Dostu", "50 vakit cemaatle namaz", "🕌", inputs.total_congregation, 50),
        achievement("morning_hero", "Sabah Kahramanı", "30 sabah namazı", "⏰", inputs.total_fajr, 30),
    ]
}

/// Derived statistics over the prayer ledger.
pub struct StreakEngine<'a> {
    store: &'a Store,
}

impl<'a> StreakEngine<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Streaks as of the wall clock. The current streak is judged against
    /// the calendar date, so the 00:00-04:00 window does not keep
    /// yesterday's streak alive.
    pub fn streak_stats(&self, now: NaiveDateTime) -> Result<StreakStats> {
        let dates = StatsRepo::full_day_dates(self.store.conn())?;
        Ok(streak_from_dates(&dates, now.date()))
    }

    pub fn achievement_inputs(&self, now: NaiveDateTime) -> Result<AchievementInputs> {
        let conn = self.store.conn();
        let streak = self.streak_stats(now)?;
        Ok(AchievementInputs {
            best_streak: streak.best_streak,
            total_full_days: streak.total_full_days,
            total_congregation: StatsRepo::count_congregation(conn)?,
            total_fajr: StatsRepo::count_performed(conn, PrayerName::Sabah)?,
        })
    }

    pub fn achievements(&self, now: NaiveDateTime) -> Result<Vec<Achievement>> {
        Ok(achievements(&self.achievement_inputs(now)?))
    }

    /// Performed counts for the `days` calendar days ending today, oldest first.
    pub fn daily_counts(&self, today: NaiveDate, days: u32) -> Result<Vec<DailyCount>> {
        let per_date = StatsRepo::performed_per_date(self.store.conn())?;
        Ok((0..days as i64)
            .rev()
            .map(|back| {
                let date = today - Duration::days(back);
                DailyCount {
                    date: format_date(date),
                    performed: per_date.get(&date).copied().unwrap_or(0),
                }
            })
            .collect())
    }

    /// Last seven days against the seven before them.
    pub fn week_comparison(&self, today: NaiveDate) -> Result<WeekComparison> {
        let per_date = StatsRepo::performed_per_date(self.store.conn())?;
        let sum = |from: i64, to: i64| -> u32 {
            (from..to)
                .map(|back| per_date.get(&(today - Duration::days(back))).copied().unwrap_or(0) as u32)
                .sum()
        };
        Ok(WeekComparison {
            current_week: sum(0, 7),
            previous_week: sum(7, 14),
        })
    }
}
