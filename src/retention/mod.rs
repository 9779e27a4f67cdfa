//! Log group retention reconciliation.
//!
//! A single run:
//! 1. Lists every log group visible to the caller's credentials
//! 2. Drops exempt groups and groups that match no name pattern
//! 3. Sets the default retention on the remaining groups that have none
//!
//! Listing finishes before any write is issued, so a listing failure leaves
//! the account untouched. Dry-run mode reports the writes without issuing them.

mod reconciler;

pub use reconciler::{
    EXIT_FATAL, EXIT_PARTIAL_FAILURE, EXIT_SUCCESS, ReconcileError, Reconciler, RunReport,
};
