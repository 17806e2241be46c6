//! Simple terminal output functions for markscan-core.
//!
//! Hierarchical status lines are emitted through the `log` facade so they
//! reach both the console and the per-run log file. The frame progress bar
//! draws on stderr only and is hidden when stderr is not a terminal.

use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{info, warn};
use std::io::IsTerminal;
use std::time::Duration;

/// Check if color should be used (respects NO_COLOR environment variable)
fn should_use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Print a section header (Level 1 - Main sections with cyan color)
pub fn print_section(title: &str) {
    info!("");
    if should_use_color() {
        info!("===== {} =====", style(title.to_uppercase()).cyan().bold());
    } else {
        info!("===== {} =====", title.to_uppercase());
    }
    info!("");
}

/// Print a processing step (Level 2 - Subsections with 2 spaces indentation and bold)
pub fn print_processing(message: &str) {
    if should_use_color() {
        info!("  » {}", style(message).bold());
    } else {
        info!("  » {message}");
    }
}

/// Spaces between a status label and its value; at least one.
fn status_padding(label: &str) -> usize {
    let label_width: usize = 15;
    label_width.saturating_sub(label.len()).max(1)
}

/// Print a status line (Level 4 - Primary info with 6 spaces indentation)
pub fn print_status(label: &str, value: &str, highlight: bool) {
    let padding = status_padding(label);

    if should_use_color() && highlight {
        info!("      {}:{} {}", label, " ".repeat(padding), style(value).bold());
    } else {
        info!("      {}:{} {}", label, " ".repeat(padding), value);
    }
}

/// Print a success message (Level 2 - Success with 2 spaces indentation and green color)
pub fn print_success(message: &str) {
    if should_use_color() {
        info!("  ✓ {}", style(message).green());
    } else {
        info!("  ✓ {message}");
    }
}

/// Print a warning message (Level 2 - yellow)
pub fn print_warning(message: &str) {
    if should_use_color() {
        warn!("  ! {}", style(message).yellow());
    } else {
        warn!("  ! {message}");
    }
}

/// Print a sub-item (Level 3 - Operations with 4 spaces indentation)
pub fn print_sub_item(message: &str) {
    info!("    {message}");
}

/// Progress over decoded frames.
///
/// With a known frame count a bar is drawn, otherwise a spinner with the
/// current frame index.
pub struct FrameProgress {
    bar: ProgressBar,
}

impl FrameProgress {
    pub fn new(label: &str, total_frames: Option<u64>) -> Self {
        let (bar, template) = match total_frames {
            Some(total) => (
                ProgressBar::new(total),
                "{prefix}: {percent:>3}% [{bar:30}] {pos}/{len} frames ({elapsed_precise}, eta {eta}) {msg}",
            ),
            None => (
                ProgressBar::new_spinner(),
                "{prefix}: {spinner} frame {pos} ({elapsed_precise}) {msg}",
            ),
        };

        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            bar.set_style(style.progress_chars("##."));
        }
        bar.set_prefix(label.to_string());

        if !std::io::stderr().is_terminal() {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        } else {
            bar.enable_steady_tick(Duration::from_millis(100));
        }
        Self { bar }
    }

    /// A progress reporter that never draws.
    pub fn hidden() -> Self {
        let bar = ProgressBar::hidden();
        Self { bar }
    }

    pub fn set_position(&self, frames_decoded: u64) {
        self.bar.set_position(frames_decoded);
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for FrameProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
