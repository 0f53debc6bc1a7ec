use std::fmt;

use chrono::{DateTime, Local};

/// Number of notifications shown per interaction; the rest are dropped.
pub const MAX_DISPLAYED: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    fn log_level(self) -> log::Level {
        match self {
            NotificationLevel::Info | NotificationLevel::Success => log::Level::Info,
            NotificationLevel::Warning => log::Level::Warn,
            NotificationLevel::Error => log::Level::Error,
        }
    }
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "success",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        };
        f.write_str(label)
    }
}

/// Transient user-visible message
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub timestamp: DateTime<Local>,
}

impl Notification {
    pub fn new(message: impl Into<String>, level: NotificationLevel) -> Self {
        let notification = Self {
            message: message.into(),
            level,
            timestamp: Local::now(),
        };
        log::log!(level.log_level(), "{}", notification.message);
        notification
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}
