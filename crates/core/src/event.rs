//! Presentation-facing event hooks
//!
//! The managers report user-visible outcomes through these hooks instead of
//! rendering anything themselves. The hosting application decides how a
//! notification is shown and what a navigation request means.

/// How a notification should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Destructive,
}

/// A short user-visible message
#[derive(Debug, Clone)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn normal(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Normal,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Destructive,
        }
    }
}

/// View the application should move to after an auth transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    /// Anonymous landing view
    Landing,
    /// Authenticated dashboard view
    Dashboard,
}

/// Hooks invoked by the session manager and task store.
///
/// Both methods default to no-ops so a sink only implements what it renders.
pub trait EventSink: Send + Sync {
    fn notify(&self, _notification: Notification) {}

    fn navigate(&self, _target: NavTarget) {}
}

/// Sink that drops every event; useful for headless embedding and tests.
pub struct NullSink;

impl EventSink for NullSink {}
