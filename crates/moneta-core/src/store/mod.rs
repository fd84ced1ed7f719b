//! Client-side state holders
//!
//! Each store owns a local copy of one entity list (or map) plus a loading
//! flag, the last error, and pending user-facing notices. Store methods call
//! the backend through `FinanceClient` and merge the response into local
//! state only on success; a failure is recorded and the previous state kept.

mod budget_view;
mod budgets;
mod categories;
mod recurring;
mod settings;
mod transactions;

pub use budget_view::BudgetView;
pub use budgets::BudgetStore;
pub use categories::CategoryStore;
pub use recurring::RecurringStore;
pub use settings::SettingsStore;
pub use transactions::TransactionStore;

use std::fmt;

use tracing::warn;

use crate::error::Error;

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Info => "info",
            NoticeKind::Error => "error",
        }
    }
}

/// A short message for the user, like a toast
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)
    }
}

/// Loading flag, last error, and pending notices of a store
#[derive(Debug, Default)]
pub struct StoreStatus {
    loading: bool,
    error: Option<String>,
    notices: Vec<Notice>,
}

impl StoreStatus {
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed operation, cleared when the next one starts
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub(crate) fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Start an operation: clear the last error, optionally mark loading
    pub(crate) fn begin(&mut self, loading: bool) {
        self.error = None;
        if loading {
            self.loading = true;
        }
    }

    pub(crate) fn finish(&mut self) {
        self.loading = false;
    }

    /// Record a failed operation
    pub(crate) fn fail(&mut self, action: &str, err: &Error) {
        warn!(action, error = %err, "Store operation failed");
        self.loading = false;
        self.error = Some(err.to_string());
        self.notices
            .push(Notice::error(format!("Failed to {}: {}", action, err)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lifecycle() {
        let mut status = StoreStatus::default();
        status.begin(true);
        assert!(status.is_loading());

        status.fail("load budgets", &Error::NotAuthenticated);
        assert!(!status.is_loading());
        assert_eq!(status.error(), Some("User not authenticated"));
        assert_eq!(status.notices().len(), 1);
        assert_eq!(status.notices()[0].kind, NoticeKind::Error);

        status.begin(false);
        assert!(status.error().is_none());

        let drained = status.take_notices();
        assert_eq!(drained[0].to_string(), "[error] Failed to load budgets: User not authenticated");
        assert!(status.notices().is_empty());
    }
}
