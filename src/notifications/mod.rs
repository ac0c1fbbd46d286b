pub mod scheduler;
pub mod sink;

pub use scheduler::{NotificationScheduler, ScheduleReport};
pub use sink::{NotificationSink, OutboxSink};
