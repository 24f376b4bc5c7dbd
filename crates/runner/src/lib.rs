//! Shotgun Runner - command line front end
//!
//! Turns a command line into one dispatch batch:
//!
//! - **Config**: targets file or the built-in brokerage table, credentials from the environment
//! - **Batch**: JSON order files, validated up front
//! - **CLI**: `buy` / `sell` / `holdings` / `health`, dry runs, text or JSON output;
//!   `--paper` selects the simulated accounts, the only adapters built in
//! - **Render**: one line per outcome plus a summary
//!
//! ## Architecture
//!
//! ```text
//!   argv ──► Cli ──► Request ─────────────┐
//!                                         ▼
//!   targets.json / built-in ──► Targets ──► App ──► DispatchEngine
//!   .env / environment ───────► credentials        │
//!                                                  ▼
//!                                      ExecutionReport ──► render ──► stdout
//! ```

pub mod app;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod render;

pub use app::{App, run};
pub use cli::{Cli, Command, OutputFormat, Request};
pub use config::{ShotgunConfig, TargetConfig, select_targets};
pub use error::{ConfigError, Result, RunError};
