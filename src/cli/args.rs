use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "vakit", version, author, about = "Prayer times, status tracking and qaza backlog in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show today's prayer times, status and countdown to the next prayer
    Times {
        /// Drop the cached row and fetch today's times again
        #[arg(long)]
        refresh: bool,
        /// Keep the countdown running until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// Mark a prayer of the current prayer day as performed or missed
    Mark {
        /// Prayer name (sabah, ogle, ikindi, aksam, yatsi)
        prayer: String,
        /// Mark as missed and open a qaza entry
        #[arg(long, conflicts_with = "congregation")]
        missed: bool,
        /// Performed in congregation
        #[arg(long)]
        congregation: bool,
    },
    /// Makeup (qaza) backlog
    Qaza {
        #[command(subcommand)]
        action: QazaCommands,
    },
    /// Plan local prayer alerts
    Schedule {
        /// Only today's remaining prayers, keeping alerts already pending
        #[arg(long)]
        today: bool,
    },
    /// Notification preference and pending alerts
    Notify {
        #[command(subcommand)]
        action: NotifyCommands,
    },
    /// Show streaks and completion history
    Stats {
        /// Per-day counts for the last 7 days
        #[arg(long)]
        week: bool,
        /// Per-day counts for the last 30 days
        #[arg(long, conflicts_with = "week")]
        month: bool,
    },
    /// Show achievement progress
    Achievements,
}

#[derive(Subcommand, Debug)]
pub enum QazaCommands {
    /// Show open qaza prayers grouped by day
    List,
    /// Add a qaza prayer by hand
    Add {
        /// Prayer name
        prayer: String,
        /// Missed date as DD-MM-YYYY (defaults to the current prayer day)
        #[arg(long)]
        date: Option<String>,
        /// Free-form note
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Record a makeup prayer by its number in `qaza list`
    Compensate {
        /// 1-based position in the list
        index: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotifyCommands {
    /// Enable prayer notifications and plan the horizon
    On,
    /// Disable prayer notifications and cancel everything pending
    Off,
    /// List alerts that have not fired yet
    List,
}
