use thiserror::Error;

pub type Result<T> = std::result::Result<T, VakitError>;

#[derive(Debug, Error)]
pub enum VakitError {
    /// Remote timings fetch failed or answered with a non-success code.
    #[error("prayer times service failed: {0}")]
    Upstream(String),

    #[error("storage failure: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("unexpected value in storage: {0}")]
    Corrupt(String),

    #[error("invalid date '{0}' (expected DD-MM-YYYY)")]
    InvalidDate(String),

    #[error("invalid time '{0}' (expected HH:MM)")]
    InvalidTime(String),

    #[error("no tracking row for {prayer} on {date}; fetch that day's times first")]
    NotTracked { prayer: String, date: String },

    #[error("{date} is not the current prayer day; past misses are made up through qaza")]
    DayClosed { date: String },

    #[error("notification budget of {0} pending alerts reached")]
    NotificationBudget(usize),
}

impl From<reqwest::Error> for VakitError {
    fn from(e: reqwest::Error) -> Self {
        VakitError::Upstream(e.to_string())
    }
}
