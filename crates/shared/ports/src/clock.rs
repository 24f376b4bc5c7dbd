use shotgun_core::Timestamp;

/// Wall-clock source.
///
/// Session creation times and result cache expiry are read through this
/// port so tests can freeze or jump time instead of sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    /// Identifier used in logs
    fn name(&self) -> &str {
        "Clock"
    }
}
