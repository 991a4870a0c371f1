//! Ordered post-acquisition filters.
//!
//! A selection such as `"1,3"` or `"all"` is parsed into [`FilterStep`]s and
//! executed by the [`FilterOrchestrator`], which re-scans the target before
//! every step and finalizes the layout afterwards.

mod orchestrator;
mod step;

pub use orchestrator::{FilterOrchestrator, FilterReport, FilterState, StepError, StepReport};
pub use step::{EVERYTHING, FilterStep, Selection, parse_selection};
