//! Command implementations for the CLI
//!
//! - start: Start the catalog server
//! - test: Test configuration validity
//! - quote: Print an on-road price breakup
//! - import: Load a JSON catalog into the database

pub mod import;
pub mod quote;
pub mod start;
