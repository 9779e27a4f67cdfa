//! Consolidated test modules.
//!
//! End-to-end reconciliation runs against the in-memory log service.
