//! Cash/position bookkeeping. `buy` and `sell` are the only mutators and
//! validate before touching any state — a rejected transaction leaves the
//! portfolio exactly as it was.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::error::TwinError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub timestamp: NaiveDate,
    pub action: TradeAction,
    pub symbol: String,
    pub shares: u64,
    pub price: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holding {
    pub shares: u64,
    pub avg_cost: f64,
    pub last_price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionSummary {
    pub symbol: String,
    pub shares: u64,
    pub avg_cost: f64,
    pub last_price: f64,
    pub current_value: f64,
    pub cost_basis: f64,
    pub pnl: f64,
    pub pnl_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_cash: f64,
    pub positions: BTreeMap<String, Holding>,
    pub transactions: Vec<Transaction>,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Portfolio {
            cash: initial_cash,
            initial_cash,
            positions: BTreeMap::new(),
            transactions: Vec::new(),
        }
    }

    pub fn buy(
        &mut self,
        symbol: &str,
        shares: u64,
        price: f64,
        timestamp: NaiveDate,
    ) -> Result<(), TwinError> {
        let cost = shares as f64 * price;
        if cost > self.cash {
            return Err(TwinError::InsufficientCash {
                needed: cost,
                available: self.cash,
            });
        }

        self.cash -= cost;

        let holding = self.positions.entry(symbol.to_string()).or_insert(Holding {
            shares: 0,
            avg_cost: 0.0,
            last_price: price,
        });
        let prior_cost = holding.avg_cost * holding.shares as f64;
        holding.shares += shares;
        holding.avg_cost = (prior_cost + cost) / holding.shares as f64;
        holding.last_price = price;

        self.transactions.push(Transaction {
            timestamp,
            action: TradeAction::Buy,
            symbol: symbol.to_string(),
            shares,
            price,
            total: cost,
        });
        Ok(())
    }

    pub fn sell(
        &mut self,
        symbol: &str,
        shares: u64,
        price: f64,
        timestamp: NaiveDate,
    ) -> Result<(), TwinError> {
        let held = match self.positions.get(symbol) {
            Some(holding) => holding.shares,
            None => {
                return Err(TwinError::NoPosition {
                    symbol: symbol.to_string(),
                })
            }
        };
        if shares > held {
            return Err(TwinError::InsufficientShares {
                symbol: symbol.to_string(),
                requested: shares,
                held,
            });
        }

        let proceeds = shares as f64 * price;
        self.cash += proceeds;

        let holding = self
            .positions
            .get_mut(symbol)
            .expect("presence checked above");
        holding.shares -= shares;
        holding.last_price = price;
        if holding.shares == 0 {
            self.positions.remove(symbol);
        }

        self.transactions.push(Transaction {
            timestamp,
            action: TradeAction::Sell,
            symbol: symbol.to_string(),
            shares,
            price,
            total: proceeds,
        });
        Ok(())
    }

    /// Refresh marks for valuation only; never trades.
    pub fn update_prices(&mut self, prices: &BTreeMap<String, f64>) {
        for (symbol, holding) in self.positions.iter_mut() {
            if let Some(&price) = prices.get(symbol) {
                holding.last_price = price;
            }
        }
    }

    /// cash + Σ(shares × last_price)
    pub fn value(&self) -> f64 {
        let stock_value: f64 = self
            .positions
            .values()
            .map(|h| h.shares as f64 * h.last_price)
            .sum();
        self.cash + stock_value
    }

    /// (value − initial_cash) / initial_cash × 100
    pub fn total_return(&self) -> f64 {
        (self.value() - self.initial_cash) / self.initial_cash * 100.0
    }

    pub fn positions_summary(&self) -> Vec<PositionSummary> {
        self.positions
            .iter()
            .map(|(symbol, h)| {
                let current_value = h.shares as f64 * h.last_price;
                let cost_basis = h.shares as f64 * h.avg_cost;
                let pnl = current_value - cost_basis;
                let pnl_pct = if cost_basis > 0.0 {
                    pnl / cost_basis * 100.0
                } else {
                    0.0
                };
                PositionSummary {
                    symbol: symbol.clone(),
                    shares: h.shares,
                    avg_cost: h.avg_cost,
                    last_price: h.last_price,
                    current_value,
                    cost_basis,
                    pnl,
                    pnl_pct,
                }
            })
            .collect()
    }
}
