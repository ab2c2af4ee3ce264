//! Unit tests - public API behaviour that needs no fixtures.

mod navigation_dispatch_tests;
mod type_ref_tests;
