//! Session registry
//!
//! Lazily initialized, cached authentication state per target. The first
//! caller for a target runs the adapter's `connect`; concurrent first
//! callers wait on the same in-flight initialization instead of logging in
//! again. The settled state (ready, absent or failed) is then served to
//! every later caller without I/O until the target is re-initialized.

use dashmap::DashMap;
use log::{info, warn};
use parking_lot::RwLock;
use shotgun_core::{Session, Target};
use shotgun_gateway::AdapterRegistry;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::error::SessionError;

/// Settled initialization state of one target
#[derive(Debug, Clone)]
pub enum SessionStatus {
    /// Logged in, session shared by every unit for this target
    Active(Arc<Session>),
    /// Credentials absent or invalid; the target is skipped
    Absent,
    /// Initialization errored; kept until `reinitialize`
    Failed(String),
}

impl SessionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Active(_))
    }

    fn into_result(self, target: &str) -> Result<Option<Arc<Session>>, SessionError> {
        match self {
            SessionStatus::Active(session) => Ok(Some(session)),
            SessionStatus::Absent => Ok(None),
            SessionStatus::Failed(reason) => Err(SessionError::InitFailed {
                target: target.to_string(),
                reason,
            }),
        }
    }
}

#[derive(Default)]
struct SessionSlot {
    /// Held for the duration of one initialization
    init: Mutex<()>,
    state: RwLock<Option<SessionStatus>>,
}

impl SessionSlot {
    fn settled(&self) -> Option<SessionStatus> {
        self.state.read().clone()
    }
}

/// Per-target session cache with single-flight initialization
pub struct SessionRegistry {
    adapters: AdapterRegistry,
    slots: DashMap<String, Arc<SessionSlot>>,
}

impl SessionRegistry {
    pub fn new(adapters: AdapterRegistry) -> Self {
        Self {
            adapters,
            slots: DashMap::new(),
        }
    }

    /// Session for `target`, initializing it on first use.
    ///
    /// `Ok(None)` when the target has no usable credentials. A failed
    /// initialization is returned as an error to this and every later
    /// caller until [`reinitialize`](Self::reinitialize) is called.
    pub async fn get_session(
        &self,
        target: &Target,
    ) -> Result<Option<Arc<Session>>, SessionError> {
        let slot = self.slot(&target.name);
        if let Some(status) = slot.settled() {
            return status.into_result(&target.name);
        }

        let _init = slot.init.lock().await;
        // Another caller may have finished while we waited
        if let Some(status) = slot.settled() {
            return status.into_result(&target.name);
        }

        let status = self.initialize(target).await?;
        *slot.state.write() = Some(status.clone());
        status.into_result(&target.name)
    }

    /// Discard the settled state of `target` and initialize it again
    pub async fn reinitialize(
        &self,
        target: &Target,
    ) -> Result<Option<Arc<Session>>, SessionError> {
        let slot = self.slot(&target.name);
        {
            let _init = slot.init.lock().await;
            *slot.state.write() = None;
        }
        info!("{}: re-initializing session", target.name);
        self.get_session(target).await
    }

    /// Warm up every target concurrently; results follow `targets` order
    pub async fn initialize_all(
        self: &Arc<Self>,
        targets: &[Target],
    ) -> Vec<(String, Result<Option<Arc<Session>>, SessionError>)> {
        let mut tasks = JoinSet::new();
        for (index, target) in targets.iter().cloned().enumerate() {
            let registry = Arc::clone(self);
            tasks.spawn(async move {
                let result = registry.get_session(&target).await;
                (index, target.name, result)
            });
        }

        let mut results = Vec::with_capacity(targets.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => results.push(entry),
                Err(e) => warn!("session warm-up task failed: {}", e),
            }
        }
        results.sort_by_key(|(index, _, _)| *index);
        results
            .into_iter()
            .map(|(_, name, result)| (name, result))
            .collect()
    }

    /// Settled state of `target`, `None` if never initialized
    pub fn status(&self, target: &str) -> Option<SessionStatus> {
        self.slots.get(target).and_then(|slot| slot.settled())
    }

    /// Targets holding a live session, sorted
    pub fn active_targets(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .slots
            .iter()
            .filter(|slot| {
                slot.value()
                    .settled()
                    .is_some_and(|status| status.is_active())
            })
            .map(|slot| slot.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Forget `target`; the next call initializes from scratch
    pub fn invalidate(&self, target: &str) {
        self.slots.remove(target);
    }

    pub fn close(&self) {
        self.slots.clear();
    }

    fn slot(&self, target: &str) -> Arc<SessionSlot> {
        if let Some(slot) = self.slots.get(target) {
            return Arc::clone(slot.value());
        }
        Arc::clone(
            self.slots
                .entry(target.to_string())
                .or_default()
                .value(),
        )
    }

    async fn initialize(&self, target: &Target) -> Result<SessionStatus, SessionError> {
        if !target.credentials_present {
            info!("{}: no credentials configured, session absent", target.name);
            return Ok(SessionStatus::Absent);
        }

        let adapter = self.adapters.require(&target.name)?;

        info!("{}: initializing session", target.name);
        let status = match adapter.connect(target).await {
            Ok(Some(session)) => {
                info!(
                    "{}: session ready ({} account(s))",
                    target.name,
                    session.accounts.len()
                );
                SessionStatus::Active(Arc::new(session))
            }
            Ok(None) => {
                info!("{}: credentials rejected, session absent", target.name);
                SessionStatus::Absent
            }
            Err(e) => {
                warn!("{}: session initialization failed: {}", target.name, e);
                SessionStatus::Failed(e.to_string())
            }
        };
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shotgun_core::RateLimit;
    use shotgun_gateway::{GatewayError, PaperAdapter};
    use shotgun_ports::AdapterError;
    use std::time::Duration;

    fn target(name: &str) -> Target {
        Target::new(name, RateLimit::default(), true).unwrap()
    }

    fn registry_with(adapter: Arc<PaperAdapter>) -> Arc<SessionRegistry> {
        let adapters = AdapterRegistry::new().with(adapter).unwrap();
        Arc::new(SessionRegistry::new(adapters))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_flight_under_concurrent_first_calls() {
        let _ = env_logger::try_init();
        let adapter = Arc::new(PaperAdapter::new("Tradier").with_latency(Duration::from_millis(50)));
        let registry = registry_with(adapter.clone());

        let mut tasks = JoinSet::new();
        for _ in 0..50 {
            let registry = registry.clone();
            tasks.spawn(async move { registry.get_session(&target("Tradier")).await });
        }

        let mut created = Vec::new();
        while let Some(result) = tasks.join_next().await {
            let session = result.unwrap().unwrap().expect("session");
            created.push(session.created_at);
        }

        assert_eq!(created.len(), 50);
        assert_eq!(adapter.connect_calls(), 1);
        assert!(created.iter().all(|ts| *ts == created[0]));
    }

    #[tokio::test]
    async fn test_absent_credentials_skip_io() {
        let adapter = Arc::new(PaperAdapter::new("Schwab"));
        let registry = registry_with(adapter.clone());
        let mut schwab = target("Schwab");
        schwab.credentials_present = false;

        assert!(registry.get_session(&schwab).await.unwrap().is_none());
        assert!(registry.get_session(&schwab).await.unwrap().is_none());
        assert_eq!(adapter.connect_calls(), 0);
    }

    #[tokio::test]
    async fn test_rejected_credentials_recorded_as_absent() {
        let adapter = Arc::new(PaperAdapter::new("Public").without_credentials());
        let registry = registry_with(adapter.clone());

        assert!(registry.get_session(&target("Public")).await.unwrap().is_none());
        assert!(registry.get_session(&target("Public")).await.unwrap().is_none());
        assert_eq!(adapter.connect_calls(), 1);
        assert!(matches!(registry.status("Public"), Some(SessionStatus::Absent)));
    }

    #[tokio::test]
    async fn test_failed_init_recorded_until_reinitialize() {
        let adapter = Arc::new(
            PaperAdapter::new("Webull").failing_connect(AdapterError::Network("reset".into())),
        );
        let registry = registry_with(adapter.clone());
        let webull = target("Webull");

        let first = registry.get_session(&webull).await;
        assert!(matches!(first, Err(SessionError::InitFailed { .. })));
        let second = registry.get_session(&webull).await;
        assert_eq!(first.err(), second.err());
        assert_eq!(adapter.connect_calls(), 1);

        let _ = registry.reinitialize(&webull).await;
        assert_eq!(adapter.connect_calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_adapter() {
        let registry = Arc::new(SessionRegistry::new(AdapterRegistry::new()));
        assert_eq!(
            registry.get_session(&target("Fennel")).await.err(),
            Some(SessionError::Gateway(GatewayError::UnknownTarget("Fennel".into())))
        );
        // Nothing settled, so a later registration can still succeed
        assert!(registry.status("Fennel").is_none());
    }

    #[tokio::test]
    async fn test_initialize_all_and_active_targets() {
        let adapters = AdapterRegistry::new()
            .with(Arc::new(PaperAdapter::new("Tradier")))
            .unwrap()
            .with(Arc::new(PaperAdapter::new("Public").without_credentials()))
            .unwrap()
            .with(Arc::new(PaperAdapter::new("Robinhood")))
            .unwrap();
        let registry = Arc::new(SessionRegistry::new(adapters));
        let targets = vec![target("Tradier"), target("Public"), target("Robinhood")];

        let results = registry.initialize_all(&targets).await;
        let names: Vec<&str> = results.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["Tradier", "Public", "Robinhood"]);
        assert_eq!(registry.active_targets(), vec!["Robinhood", "Tradier"]);

        registry.invalidate("Tradier");
        assert_eq!(registry.active_targets(), vec!["Robinhood"]);
        registry.close();
        assert!(registry.active_targets().is_empty());
    }
}
