//! Terminal feedback for startup stages.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::IsTerminal;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

impl UiMode {
    pub fn parse(flag: Option<&str>) -> Self {
        match flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        }
    }
}

/// Reports startup stages on stderr: a spinner on a terminal, `==>` lines otherwise.
#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        Self { mode, is_tty }
    }

    /// Detect whether stderr is a terminal.
    pub fn detect(mode: UiMode) -> Self {
        Self::new(mode, std::io::stderr().is_terminal())
    }

    fn pretty(&self) -> bool {
        self.is_tty
            && match self.mode {
                UiMode::Pretty | UiMode::Auto => true,
                UiMode::Plain => false,
            }
    }

    /// Start a stage. The stage is reported as finished when the guard drops.
    pub fn stage(&self, name: &str) -> StageGuard {
        if self.pretty() {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(format!("{name}…"));
            StageGuard::new(name.to_string(), Some(spinner))
        } else {
            eprintln!("==> {}", name);
            StageGuard::new(name.to_string(), None)
        }
    }

    /// Run `work` as a stage; an error marks the stage failed before it is returned.
    pub fn run_stage<T>(&self, name: &str, work: impl FnOnce() -> Result<T>) -> Result<T> {
        let stage = self.stage(name);
        match work() {
            Ok(value) => Ok(value),
            Err(err) => {
                stage.fail();
                Err(err)
            }
        }
    }

    /// Print the key bindings once the loop is about to start.
    pub fn controls(&self, interactive: bool) {
        if !interactive {
            eprintln!("running headless; press Ctrl-C to stop");
            return;
        }
        eprintln!("controls:");
        eprintln!("  q / ESC  quit");
        eprintln!("  p        toggle probability breakdown");
        eprintln!("  s        save screenshot");
    }
}

pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
    failed: bool,
}

impl StageGuard {
    fn new(name: String, spinner: Option<ProgressBar>) -> Self {
        Self {
            name,
            start: Instant::now(),
            spinner,
            failed: false,
        }
    }

    /// Mark the stage as failed; the drop message changes accordingly.
    pub fn fail(mut self) {
        self.failed = true;
    }

    fn summary(&self) -> String {
        let mark = if self.failed { "✘" } else { "✔" };
        format!(
            "{} {} ({})",
            mark,
            self.name,
            format_duration(self.start.elapsed())
        )
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let message = self.summary();
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(message);
        } else {
            eprintln!("{message}");
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mode_flag() {
        assert_eq!(UiMode::parse(Some("plain")), UiMode::Plain);
        assert_eq!(UiMode::parse(Some("pretty")), UiMode::Pretty);
        assert_eq!(UiMode::parse(None), UiMode::Auto);
    }

    #[test]
    fn pretty_needs_a_terminal() {
        assert!(!Ui::new(UiMode::Pretty, false).pretty());
        assert!(Ui::new(UiMode::Auto, true).pretty());
        assert!(!Ui::new(UiMode::Plain, true).pretty());
    }

    #[test]
    fn failed_stage_is_marked() {
        let mut guard = StageGuard::new("Open display".to_string(), None);
        assert!(guard.summary().starts_with("✔ Open display"));
        guard.failed = true;
        assert!(guard.summary().starts_with("✘ Open display"));
    }

    #[test]
    fn run_stage_passes_results_through() {
        let ui = Ui::new(UiMode::Plain, false);
        assert_eq!(ui.run_stage("ok", || Ok(7)).unwrap(), 7);
        let err = ui
            .run_stage("broken", || -> Result<()> { Err(anyhow::anyhow!("no camera")) })
            .unwrap_err();
        assert_eq!(err.to_string(), "no camera");
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }
}
