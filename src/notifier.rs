//! # Notifier Module
//!
//! Notifiche transitorie per l'utente (equivalente dei toast), scritte su stderr.
//!
//! In modalità `--json` le notifiche sono disattivate: gli stessi eventi
//! arrivano su stdout come `JsonMessage`.

use std::fmt;

/// Livello di una notifica
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    fn icon(&self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Info => "ℹ️",
            Self::Warning => "⚠️",
            Self::Error => "❌",
        }
    }
}

/// A single user-facing notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level.icon(), self.message)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Notifier {
    enabled: bool,
}

impl Notifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Print a notice; returns it so callers can reuse the text
    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) -> Notice {
        let notice = Notice {
            level,
            message: message.into(),
        };
        if self.enabled {
            eprintln!("{}", notice);
        }
        notice
    }

    pub fn success(&self, message: impl Into<String>) -> Notice {
        self.notify(NoticeLevel::Success, message)
    }

    pub fn info(&self, message: impl Into<String>) -> Notice {
        self.notify(NoticeLevel::Info, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> Notice {
        self.notify(NoticeLevel::Warning, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Notice {
        self.notify(NoticeLevel::Error, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_rendering() {
        let notifier = Notifier::new(false);
        assert_eq!(notifier.success("Video published").to_string(), "✅ Video published");
        assert_eq!(
            notifier.error("Failed to initialize upload. Please try again.").to_string(),
            "❌ Failed to initialize upload. Please try again."
        );
        assert_eq!(notifier.warning("x").level, NoticeLevel::Warning);
        assert_eq!(notifier.info("Dry run").to_string(), "ℹ️ Dry run");
    }
}
