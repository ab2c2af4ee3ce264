//! Integration tests - catalog files, serialized expressions and alias tables
//! flowing through the full navigation rewrite.
//!
//! Fixtures live in `tests/fixtures`.

mod catalog_loading_tests;
mod concurrent_rewrite_tests;
mod rewrite_pipeline_tests;
