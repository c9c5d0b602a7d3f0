use chrono::{DateTime, Utc};
use log::{info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

/// Notices kept per view; older ones are dropped first
pub const MAX_NOTICES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A user-visible message, the toast of a list view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Notices raised by one view, oldest first, at most `MAX_NOTICES` of them
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    notices: Arc<Mutex<VecDeque<Notice>>>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.push(NoticeLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.push(NoticeLevel::Error, message);
    }

    fn push(&self, level: NoticeLevel, message: String) {
        let mut notices = self.notices.lock();
        if notices.len() == MAX_NOTICES {
            notices.pop_front();
        }
        notices.push_back(Notice {
            level,
            message,
            at: Utc::now(),
        });
    }

    pub fn all(&self) -> Vec<Notice> {
        self.notices.lock().iter().cloned().collect()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().back().cloned()
    }

    pub fn errors(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .cloned()
            .collect()
    }

    /// Take every pending notice, leaving the feed empty
    pub fn drain(&self) -> Vec<Notice> {
        self.notices.lock().drain(..).collect()
    }
}
