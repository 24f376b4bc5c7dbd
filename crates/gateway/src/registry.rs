//! Explicit target adapter table

use crate::error::GatewayError;
use log::debug;
use shotgun_ports::TargetAdapter;
use std::collections::HashMap;
use std::sync::Arc;

/// Name -> adapter table the engine resolves targets through
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn TargetAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own name
    pub fn register(&mut self, adapter: Arc<dyn TargetAdapter>) -> Result<(), GatewayError> {
        let name = adapter.name().to_string();
        if self.adapters.contains_key(&name) {
            return Err(GatewayError::DuplicateAdapter(name));
        }
        debug!("Registered adapter for target {}", name);
        self.adapters.insert(name, adapter);
        Ok(())
    }

    /// Builder-style registration
    pub fn with(mut self, adapter: Arc<dyn TargetAdapter>) -> Result<Self, GatewayError> {
        self.register(adapter)?;
        Ok(self)
    }

    pub fn get(&self, target: &str) -> Option<Arc<dyn TargetAdapter>> {
        self.adapters.get(target).cloned()
    }

    pub fn require(&self, target: &str) -> Result<Arc<dyn TargetAdapter>, GatewayError> {
        self.get(target)
            .ok_or_else(|| GatewayError::UnknownTarget(target.to_string()))
    }

    pub fn contains(&self, target: &str) -> bool {
        self.adapters.contains_key(target)
    }

    /// Registered target names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.adapters.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::paper::PaperAdapter;

    #[test]
    fn test_register_and_lookup() {
        let registry = AdapterRegistry::new()
            .with(Arc::new(PaperAdapter::new("Tradier")))
            .unwrap()
            .with(Arc::new(PaperAdapter::new("Public")))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["Public", "Tradier"]);
        assert!(registry.get("Tradier").is_some());
        assert_eq!(
            registry.require("Schwab").err(),
            Some(GatewayError::UnknownTarget("Schwab".into()))
        );
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = AdapterRegistry::new();
        registry
            .register(Arc::new(PaperAdapter::new("Tradier")))
            .unwrap();
        assert_eq!(
            registry.register(Arc::new(PaperAdapter::new("Tradier"))),
            Err(GatewayError::DuplicateAdapter("Tradier".into()))
        );
    }
}
