//! # Repository Module
//!
//! Explicit, typed read/write operations over the ledger store. Each
//! repository wraps the shared `SqlitePool`; transactions never outlive a
//! single method call.

pub mod payment;
pub mod settlement;
pub mod tenant;
