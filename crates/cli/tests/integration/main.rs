//! CLI integration tests for parcel.

mod common;
mod lifecycle_tests;
mod report_tests;
