use super::outcome::{RecordOutcome, RecordStatus};
use crate::core::FailureKind;
use tracing::{error, info, warn};

/// Per-submission tally of server outcomes. Local validation rejections are
/// not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub fully_succeeded: usize,
    pub partially_succeeded: usize,
    pub failed: usize,
}

impl SaveSummary {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a RecordOutcome>) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match &outcome.status {
                RecordStatus::Saved => summary.fully_succeeded += 1,
                RecordStatus::PartiallySaved { .. } => summary.partially_succeeded += 1,
                RecordStatus::Failed {
                    kind: FailureKind::ClientValidation,
                    ..
                } => {}
                RecordStatus::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.fully_succeeded + self.partially_succeeded + self.failed
    }

    pub fn level(&self) -> NotificationLevel {
        if self.partially_succeeded == 0 && self.failed == 0 {
            NotificationLevel::Success
        } else if self.fully_succeeded == 0 && self.partially_succeeded == 0 {
            NotificationLevel::Error
        } else {
            NotificationLevel::Warning
        }
    }

    /// `Updated N of M records`, followed by partial and failed counts when
    /// there are any.
    pub fn message(&self) -> String {
        let mut message = format!(
            "Updated {} of {} records",
            self.fully_succeeded,
            self.total()
        );
        if self.partially_succeeded > 0 {
            message.push_str(&format!(", {} partially saved", self.partially_succeeded));
        }
        if self.failed > 0 {
            message.push_str(&format!(", {} failed", self.failed));
        }
        message
    }

    pub fn notification(&self) -> Notification {
        Notification {
            level: self.level(),
            message: self.message(),
        }
    }
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Side channel for user-facing save summaries. Purely informational.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Forwards notifications to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => info!(summary = %notification.message, "save finished"),
            NotificationLevel::Warning => warn!(summary = %notification.message, "save finished"),
            NotificationLevel::Error => error!(summary = %notification.message, "save finished"),
        }
    }
}
