//! Round status reporting.
//!
//! The status line is the only user-visible record of failures; detailed
//! causes go to the log.

pub mod status_reporter;

pub use status_reporter::StatusReporter;
