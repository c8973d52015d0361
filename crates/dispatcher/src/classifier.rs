//! Classification of a finished run
//!
//! The exit code decides `Completed` vs `Failed`; whether stdout parses as a
//! JSON document decides what is handed back as output. cucumber-js exits
//! non-zero when scenarios fail while still writing a well-formed report, so
//! that report is preserved on the failure path.

use cukerun_common::{RunOutput, RunTransition};

/// Error recorded when exit code 0 comes with an unparsable report
pub const PARSE_FAILURE: &str = "Failed to parse output from stdout.";

/// Everything known about a process once it has exited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutcome {
    pub fn new(exit_code: Option<i32>, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Build from raw stream buffers, replacing invalid UTF-8.
    pub fn from_bytes(exit_code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Self {
        Self::new(
            exit_code,
            String::from_utf8_lossy(stdout),
            String::from_utf8_lossy(stderr),
        )
    }
}

/// Decide the terminal transition for a finished process.
pub fn classify(outcome: &ProcessOutcome) -> RunTransition {
    let stdout_empty = outcome.stdout.trim().is_empty();
    let parsed = if stdout_empty {
        None
    } else {
        serde_json::from_str::<serde_json::Value>(&outcome.stdout).ok()
    };

    if outcome.exit_code == Some(0) {
        return match parsed {
            Some(output) => RunTransition::Completed { output },
            None => RunTransition::Failed {
                error: PARSE_FAILURE.to_string(),
                output: Some(RunOutput::Raw(outcome.stdout.clone())),
            },
        };
    }

    match parsed {
        Some(output) => RunTransition::Failed {
            error: format!("{}; parsed output is available", exit_description(outcome.exit_code)),
            output: Some(RunOutput::Structured(output)),
        },
        None if !stdout_empty => RunTransition::Failed {
            error: stderr_or_generic(outcome),
            output: Some(RunOutput::Raw(outcome.stdout.clone())),
        },
        None => RunTransition::Failed {
            error: stderr_or_generic(outcome),
            output: None,
        },
    }
}

fn stderr_or_generic(outcome: &ProcessOutcome) -> String {
    if outcome.stderr.trim().is_empty() {
        format!("{} with no output", exit_description(outcome.exit_code))
    } else {
        outcome.stderr.clone()
    }
}

fn exit_description(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("Process exited with code {}", code),
        None => "Process terminated by signal".to_string(),
    }
}
