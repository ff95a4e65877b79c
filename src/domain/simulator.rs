//! Single-position strategy replay. A [`Strategy`] emits a trade signal per
//! bar; the simulator walks the frame flat-to-long-to-flat, fills at the bar
//! close, and reports return, win rate and drawdown over the equity curve.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::TwinError;
use crate::domain::frame::IndicatorFrame;
use crate::domain::indicator::{safe_above, safe_below, IndicatorType};
use crate::domain::portfolio::Portfolio;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSignal {
    Buy,
    Sell,
    Hold,
}

pub trait Strategy {
    fn signal(&self, frame: &IndicatorFrame, index: usize) -> TradeSignal;
}

/// Buy when the close holds above its EMA while RSI still has room; sell when
/// the close loses the EMA with RSI stretched.
#[derive(Debug, Clone)]
pub struct EmaBounce {
    pub ema_period: usize,
    pub rsi_buy_below: f64,
}

pub const DEFAULT_EMA_PERIOD: usize = 20;
pub const DEFAULT_RSI_BUY_BELOW: f64 = 65.0;
const RSI_SELL_ABOVE: f64 = 70.0;

impl Default for EmaBounce {
    fn default() -> Self {
        EmaBounce {
            ema_period: DEFAULT_EMA_PERIOD,
            rsi_buy_below: DEFAULT_RSI_BUY_BELOW,
        }
    }
}

impl Strategy for EmaBounce {
    fn signal(&self, frame: &IndicatorFrame, index: usize) -> TradeSignal {
        let close = frame.bars.get(index).map(|b| b.close);
        let ema = frame.simple(&IndicatorType::Ema(self.ema_period), index);
        let rsi = frame.simple(&IndicatorType::Rsi(14), index);

        if safe_above(close, ema) && safe_below(rsi, Some(self.rsi_buy_below)) {
            TradeSignal::Buy
        } else if safe_below(close, ema) && safe_above(rsi, Some(RSI_SELL_ABOVE)) {
            TradeSignal::Sell
        } else {
            TradeSignal::Hold
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClosedTrade {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub pnl: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub symbol: String,
    pub initial_cash: f64,
    pub final_equity: f64,
    /// Percent.
    pub total_return: f64,
    /// Winning exits over total exits; 0 when no position was ever closed.
    pub win_rate: f64,
    /// Largest peak-to-trough equity decline, percent of the peak.
    pub max_drawdown: f64,
    pub n_trades: usize,
    pub trades: Vec<ClosedTrade>,
}

#[derive(Debug, Clone)]
pub struct StrategySimulator {
    initial_cash: f64,
}

impl StrategySimulator {
    pub fn new(initial_cash: f64) -> Self {
        StrategySimulator { initial_cash }
    }

    /// Replay `strategy` over the frame. One unit per trade, fills at the bar
    /// close. A position still open at the last bar stays marked to market in
    /// the equity curve but does not count as a closed trade.
    pub fn run(&self, frame: &IndicatorFrame, strategy: &dyn Strategy) -> SimulationReport {
        let mut cash = self.initial_cash;
        let mut entry: Option<(NaiveDate, f64)> = None;
        let mut trades = Vec::new();
        let mut peak = self.initial_cash;
        let mut max_drawdown = 0.0f64;
        let mut equity = self.initial_cash;

        for (i, bar) in frame.bars.iter().enumerate() {
            match (strategy.signal(frame, i), entry) {
                (TradeSignal::Buy, None) => entry = Some((bar.date, bar.close)),
                (TradeSignal::Sell, Some((entry_date, entry_price))) => {
                    let pnl = bar.close - entry_price;
                    cash += pnl;
                    trades.push(ClosedTrade {
                        entry_date,
                        entry_price,
                        exit_date: bar.date,
                        exit_price: bar.close,
                        pnl,
                    });
                    entry = None;
                }
                _ => {}
            }

            equity = cash + entry.map_or(0.0, |(_, price)| bar.close - price);
            if equity > peak {
                peak = equity;
            } else if peak > 0.0 {
                max_drawdown = max_drawdown.max((peak - equity) / peak * 100.0);
            }
        }

        let wins = trades.iter().filter(|t| t.pnl > 0.0).count();
        let win_rate = if trades.is_empty() {
            0.0
        } else {
            wins as f64 / trades.len() as f64
        };

        SimulationReport {
            symbol: frame.symbol.clone(),
            initial_cash: self.initial_cash,
            final_equity: equity,
            total_return: if self.initial_cash > 0.0 {
                (equity - self.initial_cash) / self.initial_cash * 100.0
            } else {
                0.0
            },
            win_rate,
            max_drawdown,
            n_trades: trades.len(),
            trades,
        }
    }
}

/// Replay `strategy` through a cash-constrained [`Portfolio`], buying a fixed
/// number of shares per entry. Buys the portfolio cannot afford are skipped.
pub fn simulate_portfolio(
    frame: &IndicatorFrame,
    strategy: &dyn Strategy,
    initial_cash: f64,
    shares_per_trade: u64,
) -> Result<Portfolio, TwinError> {
    let mut portfolio = Portfolio::new(initial_cash);
    let mut long = false;

    for (i, bar) in frame.bars.iter().enumerate() {
        match (strategy.signal(frame, i), long) {
            (TradeSignal::Buy, false) => {
                match portfolio.buy(&frame.symbol, shares_per_trade, bar.close, bar.date) {
                    Ok(()) => long = true,
                    Err(TwinError::InsufficientCash { needed, available }) => {
                        log::debug!(
                            "skipping buy of {} on {}: need {:.2}, have {:.2}",
                            frame.symbol,
                            bar.date,
                            needed,
                            available
                        );
                    }
                    Err(e) => return Err(e),
                }
            }
            (TradeSignal::Sell, true) => {
                portfolio.sell(&frame.symbol, shares_per_trade, bar.close, bar.date)?;
                long = false;
            }
            _ => {}
        }
    }

    if let Some(bar) = frame.bars.last() {
        let mut prices = std::collections::BTreeMap::new();
        prices.insert(frame.symbol.clone(), bar.close);
        portfolio.update_prices(&prices);
    }
    Ok(portfolio)
}
