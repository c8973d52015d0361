//! Cukerun Web API
//!
//! HTTP front end over the dispatcher: start runs, poll their results and
//! browse the scenarios found in the feature files.

pub mod config;
pub mod server;

pub use config::WebConfig;
pub use server::{router, serve, AppState};
