//! Spinner for one agent lifecycle phase

use super::context::UiContext;
use super::output::Mark;
use console::style;

/// Lifecycle phase shown while the agent works
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Install,
    Activate,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Phase::Install => "install",
            Phase::Activate => "activate",
        }
    }

    fn line(self, message: &str) -> String {
        format!("{}: {}", self.label(), message)
    }
}

/// Spinner in a terminal, a single pending line otherwise.
///
/// Consumed by [`PhaseSpinner::finish`], so a phase reports exactly once.
pub struct PhaseSpinner {
    phase: Phase,
    spinner: Option<cliclack::ProgressBar>,
}

impl PhaseSpinner {
    pub fn begin(ctx: &UiContext, phase: Phase, message: &str) -> Self {
        let line = phase.line(message);
        let spinner = if ctx.use_fancy_output() {
            let spinner = cliclack::spinner();
            spinner.start(line);
            Some(spinner)
        } else {
            println!("{} {}", style("...").dim(), line);
            None
        };
        Self { phase, spinner }
    }

    pub fn finish(self, mark: Mark, message: &str) {
        let line = self.phase.line(message);
        match self.spinner {
            Some(spinner) if mark == Mark::Fail => spinner.error(line),
            Some(spinner) => spinner.stop(line),
            None => println!("{} {}", mark.tag(), line),
        }
    }
}
