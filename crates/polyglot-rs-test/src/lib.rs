//! # polyglot-rs-test
//!
//! Testing utilities for polyglot-rs: an in-memory database that counts the
//! statements it runs, assertions over that count, and site fixtures with
//! languages already defined. End-to-end scenarios across every crate live
//! in this crate's `tests/` directory.

pub mod assert_queries;
pub mod fixtures;
pub mod test_database;

pub use assert_queries::{assert_max_queries, assert_num_queries};
pub use fixtures::{key, translations, TestSite};
pub use test_database::TestDatabase;
