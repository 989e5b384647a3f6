//! End-to-end tests of parcel-lib: manifest in, files out.

mod common;
mod lifecycle_tests;
mod packaging_tests;
