//! Wiring between the command line, configuration and the dispatch engine

use log::{info, warn};
use shotgun_core::{Outcome, Target};
use shotgun_dispatch::{DispatchEngine, EngineConfig};
use shotgun_gateway::{AdapterRegistry, PaperAdapter};
use std::sync::Arc;

use crate::cli::{Cli, OutputFormat, Request};
use crate::config::{ShotgunConfig, select_targets};
use crate::error::{Result, RunError};
use crate::render::{render_health, render_plan, render_report};

/// Resolved targets plus the engine that serves them
pub struct App {
    targets: Vec<Target>,
    engine: DispatchEngine,
}

impl App {
    /// Engine over `targets` with a paper adapter registered for each.
    ///
    /// Only reached through `--paper`, so simulated fills are never mistaken
    /// for live ones. Live brokerage adapters register into the same table.
    pub fn paper(targets: Vec<Target>, config: EngineConfig) -> Result<Self> {
        let mut adapters = AdapterRegistry::new();
        for target in &targets {
            adapters
                .register(Arc::new(PaperAdapter::new(target.name.clone())))
                .map_err(|e| RunError::Usage(e.to_string()))?;
        }

        Ok(Self {
            targets,
            engine: DispatchEngine::new(adapters, config),
        })
    }

    /// Custom adapter table, used when embedding or testing
    pub fn with_adapters(targets: Vec<Target>, adapters: AdapterRegistry, config: EngineConfig) -> Self {
        Self {
            targets,
            engine: DispatchEngine::new(adapters, config),
        }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    /// Serve one request and render its result
    pub async fn handle(&self, request: Request, dry_run: bool, output: OutputFormat) -> Result<String> {
        match request {
            Request::Trade(instructions) if dry_run => {
                let plan = self.engine.plan(&instructions, &self.targets)?;
                Ok(render_plan(&plan, output))
            }
            Request::Trade(instructions) => {
                let progress = |outcome: &Outcome| info!("{}", outcome);
                let report = self
                    .engine
                    .execute_with_progress(&instructions, &self.targets, &progress)
                    .await?;
                Ok(render_report(&report, output))
            }
            Request::Holdings(filter) => {
                if dry_run {
                    warn!("--dry-run has no effect on holdings lookups");
                }
                let report = self.engine.query(&filter, &self.targets).await?;
                Ok(render_report(&report, output))
            }
            Request::Health { reconnect } => {
                let enabled: Vec<Target> = self
                    .targets
                    .iter()
                    .filter(|t| t.is_attempted())
                    .cloned()
                    .collect();
                if enabled.is_empty() {
                    return Err(shotgun_dispatch::DispatchError::NoEnabledTargets.into());
                }
                let results = if reconnect {
                    let mut results = Vec::with_capacity(enabled.len());
                    for target in &enabled {
                        results.push((target.name.clone(), self.engine.reinitialize(target).await));
                    }
                    results
                } else {
                    self.engine.sessions().initialize_all(&enabled).await
                };
                info!(
                    "Active sessions: {:?}",
                    self.engine.sessions().active_targets()
                );
                Ok(render_health(&results, output))
            }
        }
    }

    pub fn close(&self) {
        self.engine.close();
    }
}

/// Full command line flow: config, targets, request, rendered output
pub async fn run(cli: &Cli) -> Result<String> {
    let request = cli.request()?;
    if !cli.paper {
        return Err(RunError::Usage(
            "no live brokerage adapters are built in; pass --paper to use simulated accounts".into(),
        ));
    }

    let config = ShotgunConfig::load(cli.config.as_deref())?;
    let targets = config.resolve_targets()?;
    let targets = select_targets(targets, &cli.targets)
        .map_err(|name| RunError::Usage(format!("unknown target: {}", name)))?;

    let app = App::paper(targets, config.engine)?;
    let output = app.handle(request, cli.dry_run, cli.output).await;
    app.close();
    output
}
