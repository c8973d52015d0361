//! Dispatcher - issues tokens and starts runs in the background

use tracing::{info, warn};

use crate::args::ArgumentBuilder;
use crate::config::DispatcherConfig;
use crate::registry::{RegistryStats, RunRegistry};
use crate::supervisor::Supervisor;
use cukerun_common::{Result, RunOptions, RunRecord, RunToken, RunTransition};

/// Entry point for starting runs and reading their results
#[derive(Clone)]
pub struct Dispatcher {
    builder: ArgumentBuilder,
    supervisor: Supervisor,
    registry: RunRegistry,
}

impl Dispatcher {
    /// Create a dispatcher with its own empty registry
    pub fn new(config: DispatcherConfig) -> Self {
        Self::with_registry(config, RunRegistry::new())
    }

    /// Create a dispatcher over an existing registry
    pub fn with_registry(config: DispatcherConfig, registry: RunRegistry) -> Self {
        Self {
            builder: ArgumentBuilder::new(config.clone()),
            supervisor: Supervisor::new(config),
            registry,
        }
    }

    /// Start a run and return its token without waiting for the process.
    ///
    /// The record exists in `Running` state before the process is spawned.
    /// A spawn failure is recorded as `Failed`; it is never returned here.
    /// Must be called from within a tokio runtime.
    pub fn run(&self, options: &RunOptions) -> RunToken {
        let token = loop {
            let token = RunToken::new();
            if self.registry.create(token).is_ok() {
                break token;
            }
        };

        let command = self.builder.build(options);
        info!("Dispatching run {}: {}", token, command.display());

        match self.supervisor.launch(token, &command) {
            Ok(handle) => {
                handle.supervise(self.registry.clone());
            }
            Err(e) => {
                warn!("Run {} could not start: {}", token, e);
                let failed = RunTransition::Failed {
                    error: e.to_string(),
                    output: None,
                };
                if let Err(e) = self.registry.update(&token, failed) {
                    warn!("Could not record spawn failure for {}: {}", token, e);
                }
            }
        }

        token
    }

    /// Current state of a run, or `NotFound` for a token never issued here
    pub fn get_result(&self, token: &RunToken) -> Result<RunRecord> {
        self.registry.get(token)
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }
}
