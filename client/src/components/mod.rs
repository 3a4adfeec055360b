//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components render pieces of the dashboard from the page's state signal and
//! report user actions back through callbacks.

pub mod bookmark_form;
pub mod bookmark_row;
