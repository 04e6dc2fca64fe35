//! Unit Tests Module
//!
//! Services exercised directly, without the HTTP layer.


mod test_membership_service;
mod test_reconciliation_service;
mod test_schedule;

pub use test_utils::UnitContext;
