//! Yes/no confirmation prompts

use std::io::{self, BufRead, Write};

/// Asks the operator a yes/no question. Anything but an explicit yes is a no.
pub trait Confirm {
    fn confirm(&self, question: &str) -> bool;
}

/// Prompts on stdout and reads one line from stdin
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, question: &str) -> bool {
        print!("{} (y/N): ", question);
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) => parse_yes(&line),
            Err(_) => false,
        }
    }
}

/// Always answers the same; for non-interactive runs
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&self, _question: &str) -> bool {
        self.0
    }
}

pub fn parse_yes(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}
