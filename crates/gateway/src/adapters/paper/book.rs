use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shotgun_core::{Holding, Holdings, Instruction, QueryFilter, Side};
use shotgun_ports::AdapterError;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Execution of one instruction on one paper account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: Uuid,
    pub account: String,
    pub side: Side,
    pub symbol: String,
    pub quantity: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Clone, Default)]
struct Position {
    quantity: Decimal,
    /// Average cost per share
    cost_basis: Decimal,
}

/// In-memory cash and positions per account
#[derive(Debug, Clone, Default)]
pub struct PaperBook {
    cash: HashMap<String, Decimal>,
    positions: HashMap<String, BTreeMap<String, Position>>,
    /// Last traded price per symbol, used to value holdings
    marks: HashMap<String, Decimal>,
}

impl PaperBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deposit(&mut self, account: &str, amount: Decimal) {
        *self.cash.entry(account.to_string()).or_default() += amount;
    }

    pub fn cash(&self, account: &str) -> Decimal {
        self.cash.get(account).copied().unwrap_or_default()
    }

    pub fn seed_position(&mut self, account: &str, symbol: &str, quantity: Decimal, cost: Decimal) {
        let symbol = symbol.to_ascii_uppercase();
        self.marks.entry(symbol.clone()).or_insert(cost);
        self.positions
            .entry(account.to_string())
            .or_default()
            .insert(
                symbol,
                Position {
                    quantity,
                    cost_basis: cost,
                },
            );
    }

    pub fn position(&self, account: &str, symbol: &str) -> Decimal {
        self.positions
            .get(account)
            .and_then(|p| p.get(symbol))
            .map(|p| p.quantity)
            .unwrap_or_default()
    }

    /// Check an instruction against one account without mutating anything
    pub fn check(
        &self,
        account: &str,
        instruction: &Instruction,
        price: Decimal,
    ) -> Result<(), AdapterError> {
        let quantity = Decimal::from(instruction.quantity());
        match instruction.action() {
            Side::Buy => {
                let cost = quantity * price;
                let cash = self.cash(account);
                if cash < cost {
                    return Err(AdapterError::InsufficientFunds(format!(
                        "account {} needs {} but has {}",
                        account, cost, cash
                    )));
                }
            }
            Side::Sell => {
                let held = self.position(account, instruction.symbol());
                if held < quantity {
                    return Err(AdapterError::InsufficientPosition(format!(
                        "account {} holds {} {} but sells {}",
                        account,
                        held,
                        instruction.symbol(),
                        quantity
                    )));
                }
            }
        }
        Ok(())
    }

    /// Apply an already-checked instruction to one account
    pub fn apply(&mut self, account: &str, instruction: &Instruction, price: Decimal) -> Fill {
        let quantity = Decimal::from(instruction.quantity());
        let symbol = instruction.symbol().to_string();
        let notional = quantity * price;

        let cash = self.cash.entry(account.to_string()).or_default();
        let positions = self.positions.entry(account.to_string()).or_default();

        match instruction.action() {
            Side::Buy => {
                *cash -= notional;
                let position = positions.entry(symbol.clone()).or_default();
                let total_cost = position.cost_basis * position.quantity + notional;
                position.quantity += quantity;
                position.cost_basis = total_cost / position.quantity;
            }
            Side::Sell => {
                *cash += notional;
                if let Some(position) = positions.get_mut(&symbol) {
                    position.quantity -= quantity;
                    if position.quantity.is_zero() {
                        positions.remove(&symbol);
                    }
                }
            }
        }

        self.marks.insert(symbol.clone(), price);

        Fill {
            order_id: Uuid::new_v4(),
            account: account.to_string(),
            side: instruction.action(),
            symbol,
            quantity,
            price,
        }
    }

    /// Positions of the given accounts matching `filter`
    pub fn holdings(&self, accounts: &[String], filter: &QueryFilter) -> Holdings {
        accounts
            .iter()
            .map(|account| {
                let lines = self
                    .positions
                    .get(account)
                    .map(|positions| {
                        positions
                            .iter()
                            .filter(|(symbol, p)| filter.matches(symbol) && p.quantity > Decimal::ZERO)
                            .map(|(symbol, p)| {
                                let mark = self.marks.get(symbol).copied().unwrap_or(p.cost_basis);
                                Holding {
                                    symbol: symbol.clone(),
                                    quantity: p.quantity,
                                    cost_basis: p.cost_basis,
                                    current_value: mark * p.quantity,
                                }
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                (account.clone(), lines)
            })
            .collect()
    }
}
