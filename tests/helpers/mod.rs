// tests/helpers/mod.rs
// Helpers shared by integration tests that touch process-wide state.

pub mod env;
