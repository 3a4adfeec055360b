//! Client-held bookmark list.
//!
//! DESIGN
//! ======
//! The list is a cache of the remote collection and is only ever replaced
//! wholesale by a fetch result. Every fetch takes a ticket from a monotonic
//! counter; a result is applied only when its ticket is newer than the last
//! one applied, so overlapping refreshes resolve to the most recent request
//! regardless of arrival order.

#[cfg(test)]
#[path = "bookmarks_test.rs"]
mod tests;

use crate::net::types::Bookmark;

/// Sequence number handed out when a fetch starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// Bookmark list plus fetch sequencing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookmarksState {
    pub items: Vec<Bookmark>,
    /// True once any fetch result has been applied.
    pub loaded: bool,
    issued: u64,
    applied: u64,
}

impl BookmarksState {
    /// Reserve a ticket for a fetch about to be issued.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Replace the list with `rows` unless a newer fetch already landed.
    ///
    /// Returns whether the rows were applied.
    pub fn apply(&mut self, ticket: FetchTicket, rows: Vec<Bookmark>) -> bool {
        if ticket.0 <= self.applied {
            return false;
        }
        self.applied = ticket.0;
        self.items = rows;
        self.loaded = true;
        true
    }

    /// Number of fetches issued so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|b| b.id == id)
    }
}
