//! Cukerun Dispatcher
//!
//! Runs cucumber-js in the background and tracks each run by an opaque token:
//! - Builds the tool's command line from run options
//! - Spawns the process and merges its stdout/stderr chunks
//! - Classifies the finished run from exit code and report parseability
//! - Keeps every run's state in an in-memory registry
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Dispatcher                                                  │
//! │    ├── run(options) -> RunToken           (never blocks)     │
//! │    └── get_result(token) -> RunRecord     (NotFound if new)  │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ArgumentBuilder   options -> CommandLine                    │
//! │  Supervisor        CommandLine -> RunHandle | SpawnFailure   │
//! │  RunHandle         chunks -> accumulators -> classify()      │
//! │  RunRegistry       token -> RunRecord (Running -> terminal)  │
//! ├──────────────────────────────────────────────────────────────┤
//! │  TestCatalog       *.feature -> [TestInfo]                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod args;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod registry;
pub mod supervisor;

pub use args::{ArgumentBuilder, CommandLine};
pub use catalog::TestCatalog;
pub use classifier::{classify, ProcessOutcome};
pub use config::DispatcherConfig;
pub use dispatcher::Dispatcher;
pub use registry::{RegistryStats, RunRegistry};
pub use supervisor::{RunHandle, Supervisor};
