use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One position line reported by a target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    pub current_value: Decimal,
}

/// Positions keyed by account number
pub type Holdings = BTreeMap<String, Vec<Holding>>;

/// Filter for read-type queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryFilter {
    /// Restrict to one symbol; `None` means every position
    pub symbol: Option<String>,
}

impl QueryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn symbol(symbol: impl AsRef<str>) -> Self {
        Self {
            symbol: Some(symbol.as_ref().trim().to_ascii_uppercase()),
        }
    }

    /// Stable text used in cache keys
    pub fn cache_fragment(&self) -> &str {
        self.symbol.as_deref().unwrap_or("*")
    }

    pub fn matches(&self, symbol: &str) -> bool {
        self.symbol
            .as_deref()
            .is_none_or(|wanted| wanted.eq_ignore_ascii_case(symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matching() {
        assert!(QueryFilter::all().matches("TSLA"));
        assert!(QueryFilter::symbol("tsla").matches("TSLA"));
        assert!(!QueryFilter::symbol("TSLA").matches("AAPL"));
        assert_eq!(QueryFilter::all().cache_fragment(), "*");
        assert_eq!(QueryFilter::symbol("aapl").cache_fragment(), "AAPL");
    }
}
