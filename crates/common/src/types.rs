//! Core types for Cukerun

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Options selecting which scenarios a run executes.
///
/// Empty or absent fields mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOptions {
    /// Scenario names, passed as one `--name` each
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_names: Vec<String>,

    /// Suite tag, passed as `--tags @<suite>`
    #[serde(default)]
    pub suite: Option<String>,

    /// Tags, joined into a single `--tags` expression
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

/// Treat an explicit `null` like an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl RunOptions {
    pub fn with_test_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.test_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_suite(mut self, suite: impl Into<String>) -> Self {
        self.suite = Some(suite.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Opaque identifier of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunToken(Uuid);

impl RunToken {
    /// Mint a fresh, random token
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for RunToken {
    type Err = Error;

    /// A string that is not a UUID can never have been issued, so it parses
    /// to `NotFound` rather than a syntax error.
    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| Error::run_not_found(s))
    }
}

/// Run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl Default for RunStatus {
    fn default() -> Self {
        Self::Running
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Captured output of a finished run.
///
/// Serialises as the bare document or string, so the variant is not
/// recoverable from JSON and the type is serialise-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RunOutput {
    /// Stdout that did not parse as JSON
    Raw(String),
    /// Stdout parsed as a single JSON document
    Structured(serde_json::Value),
}

impl RunOutput {
    pub fn as_structured(&self) -> Option<&serde_json::Value> {
        match self {
            RunOutput::Structured(v) => Some(v),
            RunOutput::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            RunOutput::Raw(s) => Some(s),
            RunOutput::Structured(_) => None,
        }
    }
}

/// A terminal state change for a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunTransition {
    Completed {
        output: serde_json::Value,
    },
    Failed {
        error: String,
        output: Option<RunOutput>,
    },
}

impl RunTransition {
    pub fn status(&self) -> RunStatus {
        match self {
            RunTransition::Completed { .. } => RunStatus::Completed,
            RunTransition::Failed { .. } => RunStatus::Failed,
        }
    }
}

/// State of one run, keyed by its token
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<RunOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    /// A fresh record in the `Running` state
    pub fn running() -> Self {
        Self {
            status: RunStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            output: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a terminal transition. Terminal records never change again.
    pub fn finish(&mut self, transition: RunTransition) -> Result<()> {
        if self.is_terminal() {
            return Err(Error::InvalidStateTransition {
                from: self.status.to_string(),
                to: transition.status().to_string(),
            });
        }

        self.end_time = Some(Utc::now());
        match transition {
            RunTransition::Completed { output } => {
                self.status = RunStatus::Completed;
                self.output = Some(RunOutput::Structured(output));
                self.error = None;
            }
            RunTransition::Failed { error, output } => {
                self.status = RunStatus::Failed;
                self.output = output;
                self.error = Some(error);
            }
        }
        Ok(())
    }
}

/// A scenario discovered in a feature file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub file: String,
}
