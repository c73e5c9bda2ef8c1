//! Core domain types for batch progress tracking.

mod item;
mod run;
mod status;

pub use item::{IdentitySource, ItemKey, ItemReport, ItemResult};
pub use run::{BatchRun, RunPhase};
pub use status::RunStatus;
