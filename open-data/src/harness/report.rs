//! Progress output of a harness run.

use std::io::{Write, stdout};

use crate::colors::{ColorHelper, Tone};
use crate::results::TestResult;

/// Receives harness progress. Every hook defaults to doing nothing.
pub trait Reporter: Send + Sync {
    fn header(&self, _title: &str) {}
    /// Sub-heading of one portal within a group
    fn section(&self, _title: &str) {}
    fn case_started(&self, _name: &str) {}
    fn case_finished(&self, _result: &TestResult) {}
    fn step(&self, _number: usize, _description: &str) {}
    fn pass(&self, _message: &str) {}
    fn fail(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn line(&self, _text: &str) {}
}

/// Reporter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Colored `[PASS]` / `[FAIL]` lines on stdout.
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    colors: ColorHelper,
}

impl ConsoleReporter {
    pub fn new(colors: ColorHelper) -> Self {
        Self { colors }
    }

    fn tagged(&self, tone: Tone, message: &str) {
        println!("{}", self.colors.line(tone, message));
    }
}

impl Reporter for ConsoleReporter {
    fn header(&self, title: &str) {
        println!("\n{}", self.colors.paint(Tone::Header, title));
    }

    fn section(&self, title: &str) {
        println!("\n{}", title);
    }

    fn case_started(&self, name: &str) {
        print!("  Testing {}... ", name);
        let _ = stdout().flush();
    }

    fn case_finished(&self, result: &TestResult) {
        if result.passed() {
            self.tagged(
                Tone::Pass,
                &format!(
                    "OK ({}ms, {} items)",
                    result.elapsed_ms.unwrap_or(0),
                    result.data_count
                ),
            );
        } else {
            self.tagged(Tone::Fail, result.error.as_deref().unwrap_or("failed"));
        }
    }

    fn step(&self, number: usize, description: &str) {
        println!("  Step {}: {}", number, description);
    }

    fn pass(&self, message: &str) {
        self.tagged(Tone::Pass, message);
    }

    fn fail(&self, message: &str) {
        self.tagged(Tone::Fail, message);
    }

    fn warn(&self, message: &str) {
        self.tagged(Tone::Warn, message);
    }

    fn info(&self, message: &str) {
        self.tagged(Tone::Info, message);
    }

    fn line(&self, text: &str) {
        println!("{}", text);
    }
}
