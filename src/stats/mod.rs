pub mod streak;

pub use streak::StreakEngine;
