//! Progress bar display for repair runs

use indicatif::{ProgressBar, ProgressStyle};

/// Progress display for one repair round
pub struct ProgressDisplay {
    /// One tick per module processed in the round
    module_pb: ProgressBar,
}

impl ProgressDisplay {
    /// Create a new progress display for `total_modules` modules
    pub fn new(total_modules: u64) -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let module_pb = ProgressBar::new(total_modules);
        module_pb.set_style(style);

        Self { module_pb }
    }

    /// A display that draws nothing
    pub fn hidden() -> Self {
        Self {
            module_pb: ProgressBar::hidden(),
        }
    }

    /// Show the batch being worked on
    pub fn update_batch(&self, round: u32, current: usize, total: usize, modules: &[String]) {
        let mut names = modules.join(", ");
        // Truncate long lists for display
        if names.chars().count() > 50 {
            names = format!("{}...", names.chars().take(47).collect::<String>());
        }
        self.module_pb
            .set_message(format!("round {round} batch {current}/{total}: {names}"));
    }

    /// Count `count` modules as done
    pub fn inc_modules(&self, count: usize) {
        self.module_pb.inc(count as u64);
    }

    /// Finish the round
    pub fn finish(&self) {
        self.module_pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_accepts_updates() {
        let progress = ProgressDisplay::hidden();
        progress.update_batch(1, 1, 2, &["A".to_string(), "B".to_string()]);
        progress.inc_modules(2);
        progress.finish();
    }

    #[test]
    fn test_long_batch_names() {
        let progress = ProgressDisplay::new(3);
        let names: Vec<String> = (0..20).map(|i| format!("VeryLongModuleName{i}")).collect();
        progress.update_batch(2, 3, 4, &names);
        progress.inc_modules(3);
        progress.finish();
    }
}
