//! Batch order files
//!
//! Either a bare list of orders or an object with an `orders` list:
//!
//! ```json
//! {"orders": [{"action": "buy", "quantity": 10, "symbol": "TSLA"},
//!             {"action": "sell", "quantity": 5, "ticker": "AAPL", "price": "190.50"}]}
//! ```
//!
//! Every order is validated before anything is sent, and all problems are
//! reported together.

use serde::Deserialize;
use serde_json::Value;
use shotgun_core::Instruction;
use std::path::Path;

use crate::error::RunError;

#[derive(Deserialize)]
#[serde(untagged)]
enum BatchFile {
    List(Vec<Value>),
    Wrapped { orders: Vec<Value> },
}

/// Parse and validate a batch; errors name the 1-based order position
pub fn parse_batch(json: &str) -> Result<Vec<Instruction>, RunError> {
    let file: BatchFile = serde_json::from_str(json).map_err(|e| {
        RunError::Usage(format!(
            "batch file must be a list of orders or {{\"orders\": [...]}}: {}",
            e
        ))
    })?;
    let raw = match file {
        BatchFile::List(orders) | BatchFile::Wrapped { orders } => orders,
    };
    if raw.is_empty() {
        return Err(RunError::Usage("batch file contains no orders".into()));
    }

    let mut instructions = Vec::with_capacity(raw.len());
    let mut problems = Vec::new();
    for (i, value) in raw.into_iter().enumerate() {
        match serde_json::from_value::<Instruction>(value) {
            Ok(instruction) => instructions.push(instruction),
            Err(e) => problems.push(format!("order #{}: {}", i + 1, e)),
        }
    }

    if problems.is_empty() {
        Ok(instructions)
    } else {
        Err(RunError::Validation(problems))
    }
}

/// Read a batch named on the command line; an unreadable path is a usage error
pub fn load_batch(path: impl AsRef<Path>) -> Result<Vec<Instruction>, RunError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        RunError::Usage(format!("cannot read batch file '{}': {}", path.display(), e))
    })?;
    parse_batch(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shotgun_core::Side;

    #[test]
    fn test_wrapped_and_bare_lists() {
        let wrapped = parse_batch(
            r#"{"orders": [
                {"action": "buy", "quantity": 10, "symbol": "tsla"},
                {"action": "sell", "quantity": 5, "ticker": "AAPL", "price": "190.50"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(wrapped.len(), 2);
        assert_eq!(wrapped[0].symbol(), "TSLA");
        assert!(wrapped[0].is_market());
        assert_eq!(wrapped[1].action(), Side::Sell);
        assert_eq!(wrapped[1].price(), Some(dec!(190.50)));

        let bare = parse_batch(r#"[{"action": "buy", "quantity": 1, "symbol": "F"}]"#).unwrap();
        assert_eq!(bare.len(), 1);
    }

    #[test]
    fn test_every_invalid_order_reported() {
        let err = parse_batch(
            r#"[
                {"action": "buy", "quantity": 0, "symbol": "TSLA"},
                {"action": "buy", "quantity": 1, "symbol": "F"},
                {"action": "hold", "quantity": 1, "symbol": "F"},
                {"action": "sell", "quantity": 3, "symbol": " "}
            ]"#,
        )
        .unwrap_err();

        match err {
            RunError::Validation(problems) => {
                assert_eq!(problems.len(), 3);
                assert!(problems[0].starts_with("order #1:"));
                assert!(problems[1].starts_with("order #3:"));
                assert!(problems[2].starts_with("order #4:"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_files() {
        assert!(matches!(parse_batch("[]"), Err(RunError::Usage(_))));
        assert!(matches!(parse_batch(r#"{"trades": []}"#), Err(RunError::Usage(_))));
        assert!(matches!(load_batch("/no/such/orders.json"), Err(RunError::Config(_))));
    }

    #[test]
    fn test_missing_batch_file_is_usage_error() {
        let err = load_batch("/nonexistent/shotgun-orders.json").unwrap_err();
        assert!(matches!(&err, RunError::Usage(msg) if msg.contains("shotgun-orders.json")));
        assert_eq!(err.exit_code(), 2);
    }
}
