//! Result lines for commands
//!
//! Every line carries a [`Mark`]. Interactive terminals get the matching
//! cliclack log style; everything else gets the bracketed tag.

use super::context::UiContext;
use crate::manifest::ManifestDiff;
use console::{style, StyledObject};

/// Outcome attached to a printed line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Ok,
    Warn,
    Info,
    Fail,
}

impl Mark {
    pub(super) fn tag(self) -> StyledObject<&'static str> {
        match self {
            Mark::Ok => style("[OK]").green(),
            Mark::Warn => style("[WARN]").yellow(),
            Mark::Info => style("[INFO]").cyan(),
            Mark::Fail => style("[FAIL]").red(),
        }
    }

    fn log(self, text: String) {
        let _ = match self {
            Mark::Ok => cliclack::log::success(text),
            Mark::Warn => cliclack::log::warning(text),
            Mark::Info => cliclack::log::info(text),
            Mark::Fail => cliclack::log::error(text),
        };
    }
}

/// `message (detail)` for successes, `message - detail` otherwise
fn with_detail(mark: Mark, message: &str, detail: Option<&str>, dim: bool) -> String {
    let Some(detail) = detail else {
        return message.to_string();
    };
    let detail = if dim {
        style(detail).dim().to_string()
    } else {
        detail.to_string()
    };
    match mark {
        Mark::Ok | Mark::Info => format!("{} ({})", message, detail),
        Mark::Warn | Mark::Fail => format!("{} - {}", message, detail),
    }
}

/// Opening title of a multi-step command
pub fn banner(ctx: &UiContext, title: &str) {
    if ctx.use_fancy_output() {
        cliclack::intro(style(title).cyan().bold()).ok();
    } else {
        println!("{}", style(title).cyan().bold());
        println!();
    }
}

/// Closing line of a multi-step command
pub fn conclude(ctx: &UiContext, mark: Mark, message: &str) {
    if ctx.use_fancy_output() {
        let text = match mark {
            Mark::Ok | Mark::Info => style(message).green().bold(),
            Mark::Warn => style(message).yellow().bold(),
            Mark::Fail => style(message).red().bold(),
        };
        cliclack::outro(text).ok();
    } else {
        println!();
        println!("{} {}", mark.tag(), message);
    }
}

pub fn heading(ctx: &UiContext, title: &str) {
    println!();
    if ctx.use_fancy_output() {
        cliclack::log::info(style(title).bold()).ok();
    } else {
        println!("{}", style(title).bold());
    }
}

/// One result line, optionally followed by a detail or hint
pub fn step(ctx: &UiContext, mark: Mark, message: &str, detail: Option<&str>) {
    if ctx.use_fancy_output() {
        mark.log(with_detail(mark, message, detail, true));
    } else {
        println!("  {} {}", mark.tag(), with_detail(mark, message, detail, false));
    }
}

/// Dimmed secondary line, such as a URL under a summary
pub fn note(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::remark(message).ok();
    } else {
        println!("  {}", style(message).dim());
    }
}

pub fn field(ctx: &UiContext, key: &str, value: &str) {
    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value);
    } else {
        println!("  {}: {}", key, value);
    }
}

/// Summary of a manifest diff followed by one `+`/`~`/`-` line per key
pub fn manifest_diff(ctx: &UiContext, diff: &ManifestDiff, hint: &str) {
    if diff.is_empty() {
        step(
            ctx,
            Mark::Ok,
            "Up to date",
            Some(&format!("{} unchanged", diff.unchanged)),
        );
        return;
    }

    step(ctx, Mark::Warn, &diff_summary(diff), Some(hint));
    for (sign, keys) in [('+', &diff.added), ('~', &diff.changed), ('-', &diff.removed)] {
        for key in keys {
            note(ctx, &format!("{} {}", sign, key));
        }
    }
}

fn diff_summary(diff: &ManifestDiff) -> String {
    format!(
        "{} added, {} changed, {} removed",
        diff.added.len(),
        diff.changed.len(),
        diff.removed.len()
    )
}
