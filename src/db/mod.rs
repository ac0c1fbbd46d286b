pub mod migrations;
pub mod repository;

use rusqlite::Connection;
use std::path::Path;

use crate::error::Result;
use migrations::run_migrations;

/// Timestamp format used for `performed_at`, `compensated_at` and the outbox.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The storage client. Built once at startup and handed to every component.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        // WAL keeps readers unblocked while a write is in flight
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        run_migrations(&conn)?;
        log::debug!("opened store at {:?}", path);
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::SettingsRepo;

    #[test]
    fn reopened_store_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vakit.db");

        let store = Store::open(&path).unwrap();
        SettingsRepo::set_notification_enabled(store.conn(), false).unwrap();
        store.close().unwrap();

        let store = Store::open(&path).unwrap();
        assert!(!SettingsRepo::notification_enabled(store.conn()).unwrap());
    }
}
