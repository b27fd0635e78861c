//! Live stream announcement reconciliation
//!
//! A fixed-period loop diffs the organizer's currently-live streams against
//! the announcements already posted, editing in place while a streamer stays
//! live and deleting the announcement the first pass after they stop.

pub mod reconciler;

pub use reconciler::{DisplayedStream, PassSummary, StreamReconciler};
