use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shotgun_clock::SystemClock;
use shotgun_core::{Instruction, QueryFilter, Session, SessionHandle, Target};
use shotgun_ports::{AdapterError, AdapterResponse, AdapterResult, Clock, ErrorClass, TargetAdapter};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use uuid::Uuid;

use super::book::PaperBook;
use crate::blocking::run_blocking;

/// Paper broker configuration
#[derive(Debug, Clone)]
pub struct PaperConfig {
    /// Account numbers returned at login
    pub accounts: Vec<String>,
    /// Cash deposited in every account at construction
    pub starting_cash: Decimal,
    /// Fill price for market orders
    pub market_price: Decimal,
    /// Simulated round-trip latency per call
    pub latency: Duration,
    /// Spend the latency on the blocking pool, like a synchronous SDK would
    pub blocking: bool,
    /// Behave as if no credentials were configured
    pub credentials_present: bool,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            accounts: vec!["PAPER-0001".to_string()],
            starting_cash: dec!(100_000),
            market_price: dec!(100),
            latency: Duration::ZERO,
            blocking: false,
            credentials_present: true,
        }
    }
}

/// Login token stored in the session handle
#[derive(Debug, Clone)]
struct PaperToken {
    target: String,
    token: Uuid,
}

/// Scripted misbehaviour
#[derive(Default)]
struct Faults {
    connect: Option<AdapterError>,
    /// Errors returned by the next calls, one per call
    queued: VecDeque<AdapterError>,
    /// Error returned by every call once the queue is empty
    persistent: Option<AdapterError>,
    /// Classification override (e.g. to exercise unclassified errors)
    class_override: Option<ErrorClass>,
}

/// Deterministic paper brokerage
pub struct PaperAdapter {
    name: String,
    config: PaperConfig,
    clock: Arc<dyn Clock>,
    book: Mutex<PaperBook>,
    faults: Mutex<Faults>,
    connect_calls: AtomicU32,
    execute_calls: AtomicU32,
    query_calls: AtomicU32,
}

impl PaperAdapter {
    /// Paper broker with default configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, PaperConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: PaperConfig) -> Self {
        let mut book = PaperBook::new();
        for account in &config.accounts {
            book.deposit(account, config.starting_cash);
        }

        Self {
            name: name.into(),
            config,
            clock: Arc::new(SystemClock::new()),
            book: Mutex::new(book),
            faults: Mutex::new(Faults::default()),
            connect_calls: AtomicU32::new(0),
            execute_calls: AtomicU32::new(0),
            query_calls: AtomicU32::new(0),
        }
    }

    /// Use a specific clock for session timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.config.latency = latency;
        self
    }

    /// Spend latency on the blocking pool
    pub fn blocking(mut self) -> Self {
        self.config.blocking = true;
        self
    }

    pub fn without_credentials(mut self) -> Self {
        self.config.credentials_present = false;
        self
    }

    /// Make login fail with `error`
    pub fn failing_connect(self, error: AdapterError) -> Self {
        self.faults.lock().connect = Some(error);
        self
    }

    /// Fail the next `times` execute/query calls with `error`
    pub fn fail_next(self, error: AdapterError, times: usize) -> Self {
        {
            let mut faults = self.faults.lock();
            for _ in 0..times {
                faults.queued.push_back(error.clone());
            }
        }
        self
    }

    /// Fail every execute/query call with `error`
    pub fn always_fail(self, error: AdapterError) -> Self {
        self.faults.lock().persistent = Some(error);
        self
    }

    /// Classify every error as `class` instead of the default table
    pub fn classify_as(self, class: ErrorClass) -> Self {
        self.faults.lock().class_override = Some(class);
        self
    }

    pub fn with_position(self, account: &str, symbol: &str, quantity: Decimal, cost: Decimal) -> Self {
        self.book.lock().seed_position(account, symbol, quantity, cost);
        self
    }

    pub fn connect_calls(&self) -> u32 {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn execute_calls(&self) -> u32 {
        self.execute_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> u32 {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of the paper book
    pub fn book(&self) -> PaperBook {
        self.book.lock().clone()
    }

    async fn simulate_latency(&self) -> AdapterResult<()> {
        let latency = self.config.latency;
        if latency.is_zero() {
            return Ok(());
        }
        if self.config.blocking {
            run_blocking(move || {
                std::thread::sleep(latency);
                Ok(())
            })
            .await
        } else {
            tokio::time::sleep(latency).await;
            Ok(())
        }
    }

    fn next_fault(&self) -> Option<AdapterError> {
        let mut faults = self.faults.lock();
        faults.queued.pop_front().or_else(|| faults.persistent.clone())
    }

    fn authorize(&self, session: &Session) -> AdapterResult<()> {
        match session.handle.downcast_ref::<PaperToken>() {
            Some(token) if token.target == self.name => Ok(()),
            _ => Err(AdapterError::AuthenticationRejected(format!(
                "session does not belong to {}",
                self.name
            ))),
        }
    }
}

#[async_trait]
impl TargetAdapter for PaperAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self, _target: &Target) -> AdapterResult<Option<Session>> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await?;

        if !self.config.credentials_present {
            debug!("{}: no paper credentials configured", self.name);
            return Ok(None);
        }
        if let Some(error) = self.faults.lock().connect.clone() {
            return Err(error);
        }

        let token = PaperToken {
            target: self.name.clone(),
            token: Uuid::new_v4(),
        };
        info!("{}: paper session {} opened", self.name, token.token);

        Ok(Some(Session::new(
            self.name.clone(),
            SessionHandle::new(token),
            self.config.accounts.clone(),
            self.clock.now(),
        )))
    }

    async fn execute(
        &self,
        instruction: &Instruction,
        session: &Session,
    ) -> AdapterResult<AdapterResponse> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        self.authorize(session)?;
        self.simulate_latency().await?;

        if let Some(error) = self.next_fault() {
            return Err(error);
        }

        let price = instruction.price().unwrap_or(self.config.market_price);
        let fills = {
            let mut book = self.book.lock();
            // All-or-nothing across accounts
            for account in &session.accounts {
                book.check(account, instruction, price)?;
            }
            session
                .accounts
                .iter()
                .map(|account| book.apply(account, instruction, price))
                .collect::<Vec<_>>()
        };

        let verb = match instruction.action() {
            shotgun_core::Side::Buy => "Bought",
            shotgun_core::Side::Sell => "Sold",
        };
        let detail = format!(
            "{} {} {} @ {} on {} account(s)",
            verb,
            instruction.quantity(),
            instruction.symbol(),
            price,
            fills.len()
        );
        let payload =
            serde_json::to_value(&fills).map_err(|e| AdapterError::Other(e.to_string()))?;

        Ok(AdapterResponse::new(detail).with_payload(payload))
    }

    async fn query(
        &self,
        filter: &QueryFilter,
        session: &Session,
    ) -> AdapterResult<AdapterResponse> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.authorize(session)?;
        self.simulate_latency().await?;

        if let Some(error) = self.next_fault() {
            return Err(error);
        }

        let holdings = self.book.lock().holdings(&session.accounts, filter);
        let positions: usize = holdings.values().map(Vec::len).sum();
        let detail = format!(
            "{} position(s) across {} account(s)",
            positions,
            holdings.len()
        );
        let payload =
            serde_json::to_value(&holdings).map_err(|e| AdapterError::Other(e.to_string()))?;

        Ok(AdapterResponse::new(detail).with_payload(payload))
    }

    fn classify_error(&self, error: &AdapterError) -> ErrorClass {
        self.faults
            .lock()
            .class_override
            .unwrap_or_else(|| error.default_class())
    }
}
