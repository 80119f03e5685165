//! User-facing notices ("toasts").
//!
//! Producers hold a [`Notifier`] and push [`Notice`]s into an unbounded
//! channel; the overlay drains the receiving end into a [`Toasts`] queue
//! that expires entries after their display duration.

use std::time::Duration;

use async_channel::{Receiver, Sender};
use web_time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub duration: Duration,
}

/// Sending half of the notice channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Sender<Notice>,
    duration: Duration,
}

impl Notifier {
    /// Create a notifier and the receiver that feeds the overlay.
    #[must_use]
    pub fn channel(duration: Duration) -> (Self, Receiver<Notice>) {
        let (tx, rx) = async_channel::unbounded();
        (Self { tx, duration }, rx)
    }

    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice {
            level,
            message: message.into(),
            duration: self.duration,
        };
        // No receiver in headless use.
        if self.tx.try_send(notice).is_err() {
            tracing::trace!("Dropped notice: no receiver");
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(NoticeLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(NoticeLevel::Error, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(NoticeLevel::Info, message);
    }
}

#[derive(Debug, Clone)]
struct Toast {
    notice: Notice,
    shown_at: Instant,
}

/// Notices currently on screen, oldest first.
#[derive(Debug, Default)]
pub struct Toasts {
    active: Vec<Toast>,
}

impl Toasts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull every pending notice from `rx` and drop expired ones.
    pub fn update(&mut self, rx: &Receiver<Notice>, now: Instant) {
        while let Ok(notice) = rx.try_recv() {
            self.push(notice, now);
        }
        self.expire(now);
    }

    pub fn push(&mut self, notice: Notice, now: Instant) {
        self.active.push(Toast {
            notice,
            shown_at: now,
        });
    }

    pub fn expire(&mut self, now: Instant) {
        self.active
            .retain(|t| now.duration_since(t.shown_at) < t.notice.duration);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.active.iter().map(|t| &t.notice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
