pub mod actions;
pub mod levels;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use actions::{advance, advance_seconds, wait_for_results};
#[allow(unused_imports)]
pub use levels::{memory_level, puzzle_level, riddle_level};
#[allow(unused_imports)]
pub use mocks::{FailingProgressStore, FailingSink};
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder, GRADE, STUDENT};
