//! Isolation of blocking adapter calls
//!
//! Vendor SDKs that do synchronous network I/O must not run on the async
//! worker threads, or one slow target would stall every unit scheduled on
//! the same worker. Adapters wrap such calls in [`run_blocking`].

use shotgun_ports::{AdapterError, AdapterResult};

/// Run a blocking closure on tokio's blocking pool and await its result
pub async fn run_blocking<F, T>(f: F) -> AdapterResult<T>
where
    F: FnOnce() -> AdapterResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(AdapterError::Blocking("blocking call panicked".into())),
        Err(e) => Err(AdapterError::Blocking(e.to_string())),
    }
}
