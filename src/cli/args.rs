use clap::{Parser, Subcommand, ValueEnum};
use chrono::NaiveDate;

use crate::models::Language;

#[derive(Parser, Debug)]
#[command(name = "next-prayer", version, author, about = "Next-prayer countdown, reminders and status badge")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the background process (periodic refresh, reminders, IPC)
    Daemon,
    /// Show a day's prayer times and the next prayer
    Times {
        /// Day to show (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Ask the running daemon for its current state
    Status,
    /// Make the running daemon re-evaluate now
    Refresh,
    /// Show the Hijri date
    Hijri {
        /// Gregorian day to convert (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// View or change user settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Print the stored settings
    Show,
    /// Change one or more settings
    Set(SettingsArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct SettingsArgs {
    /// Desktop reminders
    #[arg(long, value_enum)]
    pub notifications: Option<Switch>,
    /// Minutes before a prayer to send the reminder (0 disables it)
    #[arg(long)]
    pub minutes_before: Option<i64>,
    /// Status badge text
    #[arg(long, value_enum)]
    pub badge: Option<Switch>,
    /// Shift the Hijri date by this many days (-2..2)
    #[arg(long, allow_hyphen_values = true)]
    pub hijri_correction: Option<i64>,
    /// Display language
    #[arg(long, value_parser = parse_language)]
    pub language: Option<Language>,
    /// Keep the Ramadan theme on all year
    #[arg(long, value_enum)]
    pub ramadan_theme: Option<Switch>,
}

impl SettingsArgs {
    pub fn is_empty(&self) -> bool {
        self.notifications.is_none()
            && self.minutes_before.is_none()
            && self.badge.is_none()
            && self.hijri_correction.is_none()
            && self.language.is_none()
            && self.ramadan_theme.is_none()
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Switch::On
    }
}

fn parse_language(s: &str) -> Result<Language, String> {
    s.parse::<Language>().map_err(|e| e.to_string())
}
