//! In-memory run registry
//!
//! Records live for the lifetime of the registry; nothing is persisted or
//! evicted.

use cukerun_common::{Error, Result, RunRecord, RunToken, RunTransition};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Shared map from token to run state. Clones share the same records.
#[derive(Clone, Default)]
pub struct RunRegistry {
    runs: Arc<RwLock<HashMap<RunToken, RunRecord>>>,
}

/// Record counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub running: usize,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a `Running` record for a new token
    pub fn create(&self, token: RunToken) -> Result<()> {
        let mut runs = self.runs.write();
        if runs.contains_key(&token) {
            return Err(Error::AlreadyExists {
                kind: "Test run".to_string(),
                id: token.to_string(),
            });
        }
        runs.insert(token, RunRecord::running());
        debug!("Registered run {}", token);
        Ok(())
    }

    /// Apply a terminal transition. Fails if the token is unknown or the
    /// record has already left `Running`.
    pub fn update(&self, token: &RunToken, transition: RunTransition) -> Result<()> {
        let mut runs = self.runs.write();
        let record = runs
            .get_mut(token)
            .ok_or_else(|| Error::run_not_found(token.to_string()))?;
        record.finish(transition)?;
        debug!("Run {} is now {}", token, record.status);
        Ok(())
    }

    /// Snapshot of a record
    pub fn get(&self, token: &RunToken) -> Result<RunRecord> {
        self.runs
            .read()
            .get(token)
            .cloned()
            .ok_or_else(|| Error::run_not_found(token.to_string()))
    }

    pub fn stats(&self) -> RegistryStats {
        let runs = self.runs.read();
        RegistryStats {
            total: runs.len(),
            running: runs.values().filter(|r| !r.is_terminal()).count(),
        }
    }
}
