use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::values::Timestamp;

/// Opaque authentication handle produced by an adapter.
///
/// The engine never looks inside; only the adapter that created it
/// downcasts it back to its own client type.
#[derive(Clone)]
pub struct SessionHandle(Arc<dyn Any + Send + Sync>);

impl SessionHandle {
    pub fn new<T: Any + Send + Sync>(inner: T) -> Self {
        Self(Arc::new(inner))
    }

    /// Borrow the handle as the adapter's concrete type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionHandle(..)")
    }
}

/// Cached authenticated state for one target.
///
/// Created once by the session registry and shared read-only by every unit
/// dispatched to that target.
#[derive(Debug, Clone)]
pub struct Session {
    pub target_name: String,
    pub handle: SessionHandle,
    /// Account identifiers fetched once at login
    pub accounts: Vec<String>,
    pub created_at: Timestamp,
}

impl Session {
    pub fn new(
        target_name: impl Into<String>,
        handle: SessionHandle,
        accounts: Vec<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            handle,
            accounts,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct FakeClient {
        token: String,
    }

    #[test]
    fn test_handle_downcast() {
        let session = Session::new(
            "Tradier",
            SessionHandle::new(FakeClient {
                token: "abc".into(),
            }),
            vec!["6YA-0001".into()],
            Utc::now(),
        );

        let client = session.handle.downcast_ref::<FakeClient>().unwrap();
        assert_eq!(client.token, "abc");
        assert!(session.handle.downcast_ref::<String>().is_none());
    }
}
