//! Account polling pipeline.
//!
//! A single driver task walks every account on a fixed tick:
//! 1. `CycleState` — per-account dedup set, watermark and cycle clock
//! 2. `AccountProcessor::process_emails()` — fetch → extract → persist
//! 3. `spawn_driver()` — the tick loop and its shutdown flag

pub mod cycle;
pub mod driver;
pub mod processor;

pub use cycle::CycleState;
pub use driver::spawn_driver;
pub use processor::{AccountProcessor, PollSummary, ProcessorSettings};
