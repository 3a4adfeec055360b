//! Dashboard view state: viewer identity, form draft, list and notices.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;

use super::bookmarks::BookmarksState;
use crate::net::types::SessionUser;

/// Unsubmitted form input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookmarkDraft {
    pub title: String,
    pub url: String,
}

impl BookmarkDraft {
    pub fn clear(&mut self) {
        self.title.clear();
        self.url.clear();
    }

    /// Both fields hold something other than whitespace.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        !self.title.trim().is_empty() && !self.url.trim().is_empty()
    }
}

/// Everything the dashboard renders.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardState {
    /// Session check still pending; the page shows a loading indicator.
    pub loading: bool,
    pub viewer: Option<SessionUser>,
    pub bookmarks: BookmarksState,
    pub draft: BookmarkDraft,
    /// A create call is in flight.
    pub adding: bool,
    /// Inline message for failed remote calls.
    pub notice: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            loading: true,
            viewer: None,
            bookmarks: BookmarksState::default(),
            draft: BookmarkDraft::default(),
            adding: false,
            notice: None,
        }
    }
}

impl DashboardState {
    #[must_use]
    pub fn viewer_email(&self) -> Option<&str> {
        self.viewer.as_ref().and_then(|v| v.email.as_deref())
    }

    #[must_use]
    pub fn viewer_id(&self) -> Option<&str> {
        self.viewer.as_ref().map(|v| v.id.as_str())
    }

    /// Whether the submit control is enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.adding && self.draft.is_filled()
    }
}
