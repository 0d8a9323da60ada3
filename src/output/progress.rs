use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright_green, bright_yellow, heading};

/// Console progress for a drain: builds fetched against builds expected.
///
/// The expected total is only known once the first page arrives, so the bar
/// starts as a spinner and switches to a bar on the first update.
pub struct DrainProgress {
    pb: ProgressBar,
}

impl DrainProgress {
    pub fn start(repository: &str) -> Self {
        eprintln!("{}", heading("⚙️", "Export"));
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {msg} {spinner}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(bright_yellow(format!("Fetching builds for {repository}")).to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { pb }
    }

    /// Progress that draws nothing.
    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
        }
    }

    pub fn update(&self, fetched: u64, expected: u64) {
        if self.pb.length().is_none() {
            self.pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {msg} [{bar:30}] {pos}/{len}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
        }
        // A count that shrinks mid-run must not leave the bar overfull.
        self.pb.set_length(expected.max(fetched));
        self.pb.set_position(fetched);
    }

    pub fn finish(&self) {
        self.pb.finish_with_message(
            bright_green(format!("Exported {} builds ✓", self.position())).to_string(),
        );
        eprintln!();
    }

    pub fn position(&self) -> u64 {
        self.pb.position()
    }

    #[cfg(test)]
    pub fn length(&self) -> Option<u64> {
        self.pb.length()
    }
}
