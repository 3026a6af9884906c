use std::io::{self, BufRead, Write};

use tracing::warn;
use vetbook_reconciler::{AutoConfirm, Confirmation};

/// Asks on the terminal; anything but "y" or "yes" declines.
pub struct StdinConfirm;

impl Confirmation for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        let mut stdout = io::stdout();
        if write!(stdout, "{} [y/N] ", prompt).and_then(|_| stdout.flush()).is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(e) => {
                warn!("could not read confirmation: {}", e);
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// `--yes` skips the question.
pub fn confirmer(assume_yes: bool) -> Box<dyn Confirmation> {
    if assume_yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(StdinConfirm)
    }
}
