use rusqlite::Connection;

use crate::error::Result;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch("
        CREATE TABLE IF NOT EXISTS prayers (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            prayer_name     TEXT NOT NULL
                            CHECK(prayer_name IN ('Sabah','Öğle','İkindi','Akşam','Yatsı')),
            date            TEXT NOT NULL,
            prayer_time     TEXT NOT NULL,
            is_performed    INTEGER NOT NULL DEFAULT 0,
            is_congregation INTEGER NOT NULL DEFAULT 0,
            performed_at    TEXT,
            created_at      TEXT DEFAULT (datetime('now')),
            UNIQUE(prayer_name, date)
        );
        CREATE INDEX IF NOT EXISTS idx_prayers_date ON prayers(date);
        CREATE INDEX IF NOT EXISTS idx_prayers_performed ON prayers(is_performed);

        CREATE TABLE IF NOT EXISTS qaza_prayers (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            prayer_name    TEXT NOT NULL,
            missed_date    TEXT NOT NULL,
            is_compensated INTEGER NOT NULL DEFAULT 0,
            compensated_at TEXT,
            notes          TEXT NOT NULL DEFAULT '',
            created_at     TEXT DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_qaza_compensated ON qaza_prayers(is_compensated);

        CREATE TABLE IF NOT EXISTS prayer_times_cache (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            city      TEXT NOT NULL,
            country   TEXT NOT NULL,
            fajr      TEXT NOT NULL,
            sunrise   TEXT NOT NULL,
            dhuhr     TEXT NOT NULL,
            asr       TEXT NOT NULL,
            maghrib   TEXT NOT NULL,
            isha      TEXT NOT NULL,
            latitude  REAL,
            longitude REAL,
            UNIQUE(date, city)
        );

        CREATE TABLE IF NOT EXISTS app_settings (
            key   TEXT PRIMARY KEY,
            value TEXT
        );

        CREATE TABLE IF NOT EXISTS pending_notifications (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            key         TEXT NOT NULL UNIQUE,
            fire_at     TEXT NOT NULL,
            kind        TEXT NOT NULL CHECK(kind IN ('adhan','reminder')),
            prayer_name TEXT NOT NULL,
            title       TEXT NOT NULL,
            body        TEXT NOT NULL
        );
    ")?;

    seed_settings(conn)?;
    Ok(())
}

fn seed_settings(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO app_settings (key, value) VALUES ('notification_enabled', '1')",
        [],
    )?;
    Ok(())
}
