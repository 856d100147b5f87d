//! Terminal output
//!
//! Uses `cliclack` for styled output in interactive terminals, with
//! plain `[OK]`/`[WARN]` lines when stdout is piped or running in CI.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{banner, conclude, field, heading, manifest_diff, note, step, Mark};
pub use progress::{Phase, PhaseSpinner};
