//! # Clone Progress Reporting
//!
//! Execution units report transfer progress through a [`ProgressSink`]
//! obtained from a [`ProgressReporter`]. The CLI uses
//! [`MultiProgressReporter`], which draws one `indicatif` bar per running
//! clone; library callers and tests can use [`NoProgress`].

use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Width of the label column in the progress display.
pub const LABEL_WIDTH: usize = 20;

const BAR_TEMPLATE: &str = "{spinner:.green} {prefix} [{bar:30.cyan/blue}] {percent:>3}% {msg}";

/// Receives progress updates for a single clone.
///
/// The sink is dropped when the clone finishes, successfully or not.
pub trait ProgressSink: Send {
    /// Report `current` units of work done out of `total` (if known).
    fn update(&self, current: u64, total: Option<u64>, message: &str);
}

/// Hands out one [`ProgressSink`] per started clone.
pub trait ProgressReporter: Send + Sync {
    fn start(&self, dest: &Path) -> Box<dyn ProgressSink>;
}

/// A reporter that discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&self, _current: u64, _total: Option<u64>, _message: &str) {}
}

impl ProgressReporter for NoProgress {
    fn start(&self, _dest: &Path) -> Box<dyn ProgressSink> {
        Box::new(NoProgress)
    }
}

/// Draws one progress bar per running clone on stderr.
#[derive(Clone)]
pub struct MultiProgressReporter {
    bars: MultiProgress,
    style: ProgressStyle,
}

impl MultiProgressReporter {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    /// Build a reporter drawing to `target`; tests use a hidden target.
    pub fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        Self {
            bars: MultiProgress::with_draw_target(target),
            style,
        }
    }
}

impl Default for MultiProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for MultiProgressReporter {
    fn start(&self, dest: &Path) -> Box<dyn ProgressSink> {
        let bar = self.bars.add(ProgressBar::new(100));
        bar.set_style(self.style.clone());
        bar.set_prefix(label(&dest.to_string_lossy()));
        bar.enable_steady_tick(Duration::from_millis(120));
        Box::new(BarSink { bar })
    }
}

struct BarSink {
    bar: ProgressBar,
}

impl ProgressSink for BarSink {
    fn update(&self, current: u64, total: Option<u64>, message: &str) {
        if let Some(total) = total {
            self.bar.set_length(total);
        }
        self.bar.set_position(current);
        self.bar.set_message(message.to_string());
    }
}

impl Drop for BarSink {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Fit `name` into [`LABEL_WIDTH`] columns, keeping its tail.
pub fn label(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let shown: Cow<'_, str> = if chars.len() > LABEL_WIDTH - 3 {
        let tail: String = chars[chars.len() - (LABEL_WIDTH - 3)..].iter().collect();
        Cow::Owned(format!("...{}", tail))
    } else {
        Cow::Borrowed(name)
    };
    format!("{:<width$}", shown, width = LABEL_WIDTH)
}
