//! Applies a default retention policy to CloudWatch log groups that have none.
//!
//! The crate is organised along the run's data flow:
//! [`discovery`] lists log groups, [`classify`] picks the ones to reconcile,
//! [`apply`] writes the missing policies, and [`retention`] sequences the
//! three. [`logs`] holds the service seam they all talk to.

pub mod apply;
pub mod classify;
pub mod config;
pub mod discovery;
pub mod logs;
pub mod observability;
pub mod retention;
pub mod retry;

#[cfg(test)]
mod tests;
