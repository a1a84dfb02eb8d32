use std::future::Future;
use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "];

/// Spinner on stderr, cleared when dropped. Hidden when stderr is not a
/// terminal so piped output stays clean.
pub struct Spinner(ProgressBar);

impl Spinner {
    pub fn start(label: impl Into<String>) -> Self {
        let target = if std::io::stderr().is_terminal() {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(None, target);
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}…") {
            bar.set_style(style.tick_strings(TICKS));
        }
        bar.set_message(label.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        Spinner(bar)
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}

/// Await `work` with a spinner labelled `label` running until it resolves.
pub async fn spin_while<F: Future>(label: impl Into<String>, work: F) -> F::Output {
    let _spinner = Spinner::start(label);
    work.await
}
