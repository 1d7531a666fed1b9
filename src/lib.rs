//! Run test binaries that report progress over the CTEST line protocol.
//!
//! Each target is started with only `CTEST_LOG=1` in its environment. Its
//! diagnostic stream is [parsed](protocol::parse_line) line by line while it
//! runs and [aggregated](aggregate::ResultAggregator) into named test groups,
//! everything else passes through to the console. A [suite] runs targets in
//! order, renders each run and passes only if every run passed.

pub mod aggregate;
pub mod capture;
pub mod config;
pub mod error;
pub mod formatter;
pub mod outcome;
pub mod protocol;
pub mod report;
pub mod runner;
pub mod target;

mod suite;
pub use suite::*;
