//! Integration Tests Module
//!
//! Every test drives the full router over an in-memory database.

pub mod test_utils;

mod test_back_office_api;
mod test_clients_api;
mod test_front_desk_api;

pub use test_utils::TestContext;
