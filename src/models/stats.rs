use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakStats {
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_full_days: u32,
}

/// Inputs the achievement predicates are evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AchievementInputs {
    pub best_streak: u32,
    pub total_full_days: u32,
    pub total_congregation: u32,
    pub total_fajr: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub target: u32,
    pub progress: u32,
    pub is_unlocked: bool,
}

/// Performed-prayer count for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub performed: u8,
}

impl DailyCount {
    pub fn completion_ratio(&self) -> f64 {
        self.performed as f64 / 5.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekComparison {
    pub current_week: u32,
    pub previous_week: u32,
}

impl WeekComparison {
    pub fn delta(&self) -> i64 {
        self.current_week as i64 - self.previous_week as i64
    }
}
