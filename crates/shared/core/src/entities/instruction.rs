use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Side;
use crate::error::ValidationError;
use crate::values::{Price, Quantity, Symbol};

/// One buy/sell directive, dispatched unchanged to every target in a batch.
///
/// Fields are private: the only way to obtain an `Instruction` is through
/// [`Instruction::new`] (or deserialization, which goes through the same
/// checks), so an instruction that exists is always valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawInstruction", into = "RawInstruction")]
pub struct Instruction {
    action: Side,
    quantity: Quantity,
    symbol: Symbol,
    /// Absent for market orders
    price: Option<Price>,
}

/// Unchecked wire shape of an instruction (batch files, JSON output)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawInstruction {
    action: Side,
    quantity: i64,
    #[serde(alias = "ticker")]
    symbol: String,
    #[serde(default)]
    price: Option<Decimal>,
}

impl Instruction {
    /// Validate and build an instruction.
    ///
    /// The symbol is trimmed and upper-cased.
    pub fn new(
        action: Side,
        quantity: i64,
        symbol: impl AsRef<str>,
        price: Option<Price>,
    ) -> Result<Self, ValidationError> {
        if quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity(quantity));
        }

        let symbol = symbol.as_ref().trim().to_ascii_uppercase();
        if symbol.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        if let Some(p) = price {
            if p <= Decimal::ZERO {
                return Err(ValidationError::NonPositivePrice(p.to_string()));
            }
        }

        Ok(Self {
            action,
            quantity: quantity as Quantity,
            symbol,
            price,
        })
    }

    /// Market buy
    pub fn buy(quantity: i64, symbol: impl AsRef<str>) -> Result<Self, ValidationError> {
        Self::new(Side::Buy, quantity, symbol, None)
    }

    /// Market sell
    pub fn sell(quantity: i64, symbol: impl AsRef<str>) -> Result<Self, ValidationError> {
        Self::new(Side::Sell, quantity, symbol, None)
    }

    /// Same instruction as a limit order at `price`
    pub fn with_limit(self, price: Price) -> Result<Self, ValidationError> {
        Self::new(self.action, self.quantity as i64, self.symbol, Some(price))
    }

    pub fn action(&self) -> Side {
        self.action
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn price(&self) -> Option<Price> {
        self.price
    }

    /// True when no limit price was given
    pub fn is_market(&self) -> bool {
        self.price.is_none()
    }
}

impl TryFrom<RawInstruction> for Instruction {
    type Error = ValidationError;

    fn try_from(raw: RawInstruction) -> Result<Self, Self::Error> {
        Instruction::new(raw.action, raw.quantity, raw.symbol, raw.price)
    }
}

impl From<Instruction> for RawInstruction {
    fn from(instruction: Instruction) -> Self {
        RawInstruction {
            action: instruction.action,
            quantity: instruction.quantity as i64,
            symbol: instruction.symbol,
            price: instruction.price,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.price {
            Some(price) => write!(
                f,
                "{} {} {} @ {}",
                self.action, self.quantity, self.symbol, price
            ),
            None => write!(f, "{} {} {} @ market", self.action, self.quantity, self.symbol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_market_instruction() {
        let ins = Instruction::buy(10, " tsla ").unwrap();
        assert_eq!(ins.action(), Side::Buy);
        assert_eq!(ins.quantity(), 10);
        assert_eq!(ins.symbol(), "TSLA");
        assert!(ins.is_market());
        assert_eq!(ins.to_string(), "BUY 10 TSLA @ market");
    }

    #[test]
    fn test_limit_instruction() {
        let ins = Instruction::sell(5, "AAPL")
            .unwrap()
            .with_limit(dec!(187.25))
            .unwrap();
        assert_eq!(ins.price(), Some(dec!(187.25)));
        assert_eq!(ins.to_string(), "SELL 5 AAPL @ 187.25");
    }

    #[test]
    fn test_rejects_invalid_fields() {
        assert_eq!(
            Instruction::buy(0, "TSLA"),
            Err(ValidationError::NonPositiveQuantity(0))
        );
        assert_eq!(
            Instruction::buy(-3, "TSLA"),
            Err(ValidationError::NonPositiveQuantity(-3))
        );
        assert_eq!(Instruction::buy(1, "   "), Err(ValidationError::EmptySymbol));
        assert!(matches!(
            Instruction::new(Side::Buy, 1, "TSLA", Some(dec!(0))),
            Err(ValidationError::NonPositivePrice(_))
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Instruction =
            serde_json::from_str(r#"{"action":"buy","quantity":2,"ticker":"msft","price":410.5}"#)
                .unwrap();
        assert_eq!(ok.symbol(), "MSFT");
        assert_eq!(ok.price(), Some(dec!(410.5)));

        let bad = serde_json::from_str::<Instruction>(
            r#"{"action":"sell","quantity":0,"symbol":"MSFT"}"#,
        );
        assert!(bad.is_err());
    }
}
