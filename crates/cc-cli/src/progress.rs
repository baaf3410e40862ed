//! Terminal progress bar fed by conversion progress events.

use cc_convert::{PROGRESS_COMPLETE, ProgressSink};
use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {wide_msg}";

/// Drives an `indicatif` bar from `(message, progress)` events.
///
/// A negative progress value abandons the bar, keeping the last message
/// on screen.
pub struct BarSink {
    bar: ProgressBar,
}

impl BarSink {
    /// A visible bar, or a hidden one when `enabled` is false.
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled {
            ProgressBar::new(PROGRESS_COMPLETE as u64)
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn message(&self) -> String {
        self.bar.message()
    }

    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }

    /// Leave the bar on screen at its current position.
    pub fn finish(&self) {
        if !self.bar.is_finished() {
            self.bar.finish();
        }
    }
}

impl ProgressSink for BarSink {
    fn report(&mut self, message: &str, progress: Option<f64>) {
        match progress {
            Some(value) if value < 0.0 => {
                self.bar.abandon_with_message(message.to_string());
            }
            Some(value) => {
                self.bar.set_position(to_position(value));
                self.bar.set_message(message.to_string());
            }
            None => self.bar.set_message(message.to_string()),
        }
    }
}

fn to_position(value: f64) -> u64 {
    // Clamped to 0..=100 before the cast.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let position = value.clamp(0.0, PROGRESS_COMPLETE).round() as u64;
    position
}
