pub mod cache;
pub mod next;
pub mod provider;
pub mod window;

pub use cache::PrayerTimesCache;
pub use provider::{AladhanClient, TimingsProvider};
