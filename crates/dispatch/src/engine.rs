//! Dispatch engine
//!
//! Fans a batch out to every enabled target. Each (instruction, target)
//! pair runs as its own tokio task:
//!
//! ```text
//! session ──► admission slot ──► adapter call ──► outcome slot
//!                  ▲                  │
//!                  └──── retry ◄──────┘ (transient errors only)
//! ```
//!
//! Outcomes land in a slot indexed by (instruction, target), so the report
//! order never depends on which target answered first.

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use shotgun_clock::SystemClock;
use shotgun_core::{
    ExecutionReport, Instruction, Outcome, QueryFilter, RateLimit, ReportKind, Session, Target,
    UnitState,
};
use shotgun_gateway::AdapterRegistry;
use shotgun_ports::{AdapterResponse, Clock, TargetAdapter};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::cache::{CacheKey, HOLDINGS_CLASS, ResultCache};
use crate::config::EngineConfig;
use crate::error::{DispatchError, Result, SessionError};
use crate::limiter::AdmissionLimiter;
use crate::retry::RetryPolicy;
use crate::session::SessionRegistry;

/// Receives every outcome as soon as it is settled, in completion order
pub trait ProgressSink: Send + Sync {
    fn on_outcome(&self, outcome: &Outcome);
}

impl<F> ProgressSink for F
where
    F: Fn(&Outcome) + Send + Sync,
{
    fn on_outcome(&self, outcome: &Outcome) {
        self(outcome)
    }
}

/// What one unit does once it holds a session
#[derive(Debug, Clone)]
enum Work {
    Trade(Instruction),
    Query(QueryFilter),
}

impl Work {
    fn instruction(&self) -> Option<Instruction> {
        match self {
            Work::Trade(instruction) => Some(instruction.clone()),
            Work::Query(_) => None,
        }
    }
}

impl fmt::Display for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Work::Trade(instruction) => write!(f, "{}", instruction),
            Work::Query(filter) => write!(f, "holdings {}", filter.cache_fragment()),
        }
    }
}

/// Shared state every unit task needs
#[derive(Clone)]
struct UnitContext {
    sessions: Arc<SessionRegistry>,
    limiter: AdmissionLimiter,
    retry: RetryPolicy,
    cache: Arc<ResultCache<AdapterResponse>>,
}

/// How a target would be treated by a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanAction {
    Dispatch,
    /// Enabled, but no credentials configured
    Skip,
    /// Disabled in configuration
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedTarget {
    pub name: String,
    pub action: PlanAction,
    pub rate_limit: RateLimit,
}

/// Dry-run view of a batch: nothing is sent anywhere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchPlan {
    pub instructions: Vec<Instruction>,
    pub targets: Vec<PlannedTarget>,
}

impl DispatchPlan {
    /// Units that would reach an adapter
    pub fn dispatched_units(&self) -> usize {
        let dispatched = self
            .targets
            .iter()
            .filter(|t| t.action == PlanAction::Dispatch)
            .count();
        dispatched * self.instructions.len()
    }

    /// Outcomes the real batch would report
    pub fn report_len(&self) -> usize {
        let attempted = self
            .targets
            .iter()
            .filter(|t| t.action != PlanAction::Ignore)
            .count();
        attempted * self.instructions.len()
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for instruction in &self.instructions {
            for target in &self.targets {
                let action = match target.action {
                    PlanAction::Dispatch => "would dispatch",
                    PlanAction::Skip => "would skip (no credentials)",
                    PlanAction::Ignore => continue,
                };
                lines.push(format!(
                    "DRY-RUN {}: {} {} (limit {})",
                    target.name, action, instruction, target.rate_limit
                ));
            }
        }
        lines
    }
}

/// Concurrent multi-target dispatcher
pub struct DispatchEngine {
    adapters: AdapterRegistry,
    sessions: Arc<SessionRegistry>,
    limiter: AdmissionLimiter,
    cache: Arc<ResultCache<AdapterResponse>>,
    retry: RetryPolicy,
    config: EngineConfig,
}

impl DispatchEngine {
    pub fn new(adapters: AdapterRegistry, config: EngineConfig) -> Self {
        Self::with_clock(adapters, config, Arc::new(SystemClock::new()))
    }

    /// Engine whose cache expiry follows `clock`
    pub fn with_clock(adapters: AdapterRegistry, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new(adapters.clone())),
            limiter: AdmissionLimiter::new(config.default_rate_limit),
            cache: Arc::new(ResultCache::new(config.cache.clone(), clock)),
            retry: RetryPolicy::new(config.retry.clone()),
            adapters,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn limiter(&self) -> &AdmissionLimiter {
        &self.limiter
    }

    pub fn cache(&self) -> &ResultCache<AdapterResponse> {
        &self.cache
    }

    /// Dispatch every instruction to every enabled target
    pub async fn execute(
        &self,
        instructions: &[Instruction],
        targets: &[Target],
    ) -> Result<ExecutionReport> {
        self.execute_with_progress(instructions, targets, &|_: &Outcome| {})
            .await
    }

    /// Like [`execute`](Self::execute), reporting each outcome to
    /// `progress` as it settles
    pub async fn execute_with_progress(
        &self,
        instructions: &[Instruction],
        targets: &[Target],
        progress: &dyn ProgressSink,
    ) -> Result<ExecutionReport> {
        if instructions.is_empty() {
            return Err(DispatchError::EmptyBatch);
        }
        let attempted = self.attempted_targets(targets)?;
        let work: Vec<Work> = instructions.iter().cloned().map(Work::Trade).collect();

        info!(
            "Dispatching {} instruction(s) to {} target(s)",
            work.len(),
            attempted.len()
        );
        self.run_batch(ReportKind::Trade, &work, &attempted, progress)
            .await
    }

    /// Holdings lookup on every enabled target, served from the result
    /// cache when fresh
    pub async fn query(&self, filter: &QueryFilter, targets: &[Target]) -> Result<ExecutionReport> {
        let attempted = self.attempted_targets(targets)?;
        info!(
            "Querying holdings ({}) on {} target(s)",
            filter.cache_fragment(),
            attempted.len()
        );
        let work = [Work::Query(filter.clone())];
        self.run_batch(ReportKind::Query, &work, &attempted, &|_: &Outcome| {})
            .await
    }

    /// Describe what `execute` would do without touching any adapter
    pub fn plan(&self, instructions: &[Instruction], targets: &[Target]) -> Result<DispatchPlan> {
        if instructions.is_empty() {
            return Err(DispatchError::EmptyBatch);
        }
        self.attempted_targets(targets)?;

        let planned = targets
            .iter()
            .map(|target| PlannedTarget {
                name: target.name.clone(),
                action: if !target.enabled {
                    PlanAction::Ignore
                } else if !target.credentials_present {
                    PlanAction::Skip
                } else {
                    PlanAction::Dispatch
                },
                rate_limit: target.rate_limit,
            })
            .collect();

        Ok(DispatchPlan {
            instructions: instructions.to_vec(),
            targets: planned,
        })
    }

    /// Drop everything cached for `target` and log in to it again
    pub async fn reinitialize(
        &self,
        target: &Target,
    ) -> std::result::Result<Option<Arc<Session>>, SessionError> {
        self.cache.invalidate_target(&target.name);
        self.sessions.reinitialize(target).await
    }

    /// Release sessions, cached results and limiter state
    pub fn close(&self) {
        self.sessions.close();
        self.cache.close();
        self.limiter.close();
        info!("Dispatch engine closed");
    }

    /// Enabled targets, validated against the adapter table
    fn attempted_targets(&self, targets: &[Target]) -> Result<Vec<Target>> {
        let mut seen = HashSet::new();
        let mut attempted = Vec::new();
        for target in targets.iter().filter(|t| t.is_attempted()) {
            if !seen.insert(target.name.as_str()) {
                return Err(DispatchError::DuplicateTarget(target.name.clone()));
            }
            if !self.adapters.contains(&target.name) {
                return Err(DispatchError::UnknownTarget(target.name.clone()));
            }
            attempted.push(target.clone());
        }

        if attempted.is_empty() {
            return Err(DispatchError::NoEnabledTargets);
        }
        Ok(attempted)
    }

    async fn run_batch(
        &self,
        kind: ReportKind,
        work: &[Work],
        targets: &[Target],
        progress: &dyn ProgressSink,
    ) -> Result<ExecutionReport> {
        let started_at = Utc::now();
        let deadline = Instant::now() + self.config.batch_timeout();
        let width = targets.len();
        let mut slots: Vec<Option<Outcome>> = vec![None; work.len() * width];

        let ctx = UnitContext {
            sessions: Arc::clone(&self.sessions),
            limiter: self.limiter.clone(),
            retry: self.retry.clone(),
            cache: Arc::clone(&self.cache),
        };
        for target in targets {
            self.limiter.ensure(&target.name, target.rate_limit);
        }

        let mut units = JoinSet::new();
        for (i, item) in work.iter().enumerate() {
            for (t, target) in targets.iter().enumerate() {
                let slot = i * width + t;

                if !target.credentials_present {
                    transition(&target.name, item, UnitState::Pending, UnitState::Skipped);
                    let outcome = Outcome::skipped(
                        &target.name,
                        item.instruction(),
                        "credentials not configured",
                    );
                    progress.on_outcome(&outcome);
                    slots[slot] = Some(outcome);
                    continue;
                }

                let adapter = self
                    .adapters
                    .get(&target.name)
                    .ok_or_else(|| DispatchError::UnknownTarget(target.name.clone()))?;
                let ctx = ctx.clone();
                let target = target.clone();
                let item = item.clone();
                units.spawn(async move { (slot, run_unit(ctx, adapter, target, item).await) });
            }
        }

        let timeout = tokio::time::sleep_until(deadline);
        tokio::pin!(timeout);
        let mut timed_out = false;

        loop {
            tokio::select! {
                joined = units.join_next() => match joined {
                    Some(Ok((slot, outcome))) => {
                        progress.on_outcome(&outcome);
                        slots[slot] = Some(outcome);
                    }
                    Some(Err(e)) => warn!("Dispatch unit did not complete: {}", e),
                    None => break,
                },
                _ = &mut timeout => {
                    timed_out = true;
                    warn!(
                        "Batch deadline of {:?} reached with {} unit(s) pending",
                        self.config.batch_timeout(),
                        units.len()
                    );
                    units.abort_all();
                    break;
                }
            }
        }

        let outcomes: Vec<Outcome> = slots
            .into_iter()
            .enumerate()
            .map(|(slot, outcome)| {
                outcome.unwrap_or_else(|| {
                    let target = &targets[slot % width];
                    let item = &work[slot / width];
                    transition(&target.name, item, UnitState::InFlight, UnitState::Failure);
                    let detail = if timed_out {
                        format!(
                            "timed out after {}ms batch deadline",
                            self.config.batch_timeout_ms
                        )
                    } else {
                        "dispatch task aborted".to_string()
                    };
                    let outcome = Outcome::failure(&target.name, item.instruction(), detail, 0);
                    progress.on_outcome(&outcome);
                    outcome
                })
            })
            .collect();

        let report = ExecutionReport::new(kind, outcomes, started_at);
        info!(
            "Batch {} finished in {}ms: {}",
            report.batch_id,
            report.elapsed_ms,
            report.summary()
        );
        Ok(report)
    }
}

fn transition(target: &str, item: &Work, from: UnitState, to: UnitState) {
    debug_assert!(from.can_transition_to(to));
    debug!("{} [{}]: {:?} -> {:?}", target, item, from, to);
}

/// One (work item, target) pair, start to finish
async fn run_unit(
    ctx: UnitContext,
    adapter: Arc<dyn TargetAdapter>,
    target: Target,
    item: Work,
) -> Outcome {
    transition(&target.name, &item, UnitState::Pending, UnitState::InFlight);
    let outcome = run_in_flight(&ctx, adapter, &target, &item).await;
    transition(&target.name, &item, UnitState::InFlight, outcome.status.into());
    if outcome.is_failure() {
        warn!("{}", outcome);
    }
    outcome
}

async fn run_in_flight(
    ctx: &UnitContext,
    adapter: Arc<dyn TargetAdapter>,
    target: &Target,
    item: &Work,
) -> Outcome {
    let name = target.name.as_str();
    let session = match ctx.sessions.get_session(target).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            return Outcome::skipped(name, item.instruction(), "credentials not accepted");
        }
        Err(e) => return Outcome::failure(name, item.instruction(), e.to_string(), 0),
    };

    let cache_key = match item {
        Work::Query(filter) => {
            let key = CacheKey::new(HOLDINGS_CLASS, name, filter.cache_fragment());
            if let Some(cached) = ctx.cache.get_key(&key) {
                debug!("{}: served holdings from cache", name);
                return Outcome::success(
                    name,
                    None,
                    format!("{} (cached)", cached.detail),
                    cached.payload,
                    0,
                );
            }
            Some(key)
        }
        Work::Trade(_) => None,
    };

    let label = format!("{} [{}]", name, item);
    let classifier = Arc::clone(&adapter);
    let retried = ctx
        .retry
        .run(
            &label,
            || {
                let adapter = Arc::clone(&adapter);
                let session = Arc::clone(&session);
                let limiter = ctx.limiter.clone();
                let target_name = target.name.clone();
                let item = item.clone();
                async move {
                    limiter.await_slot(&target_name).await;
                    match &item {
                        Work::Trade(instruction) => adapter.execute(instruction, &session).await,
                        Work::Query(filter) => adapter.query(filter, &session).await,
                    }
                }
            },
            |e| classifier.classify_error(e),
        )
        .await;

    match retried.result {
        Ok(response) => {
            if let Some(key) = cache_key {
                ctx.cache.set_key(&key, response.clone());
            }
            Outcome::success(
                name,
                item.instruction(),
                response.detail,
                response.payload,
                retried.attempts,
            )
        }
        Err(e) => Outcome::failure(name, item.instruction(), e.to_string(), retried.attempts),
    }
}
