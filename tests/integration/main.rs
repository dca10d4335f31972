//! Integration tests for cityjobs-sync

mod common;
mod fetch_tests;
mod sync_tests;
