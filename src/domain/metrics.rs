//! Performance metrics over a closed-trade ledger.

use super::indicator::stddev::{mean, population_stddev};
use super::position::Trade;

const MIN_STDDEV: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub gross_profit: f64,
    /// Positive magnitude of the summed losing PnL.
    pub gross_loss: f64,
    pub net_profit: f64,
    pub win_rate_pct: f64,
    /// `f64::INFINITY` when there are wins but no losses.
    pub profit_factor: f64,
    pub avg_profit_per_winning_trade: f64,
    pub avg_loss_per_losing_trade: f64,
    pub avg_pnl_per_trade: f64,
    pub max_drawdown_value: f64,
    pub max_drawdown_percentage: f64,
    pub sharpe_ratio: f64,
}

impl Metrics {
    pub fn compute(trades: &[Trade], initial_capital: f64) -> Self {
        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;

        for trade in trades {
            if trade.is_win() {
                winning_trades += 1;
                gross_profit += trade.pnl;
            } else if trade.is_loss() {
                losing_trades += 1;
                gross_loss += trade.pnl.abs();
            }
        }

        let total_trades = trades.len();
        let net_profit = gross_profit - gross_loss;

        let win_rate_pct = if total_trades > 0 {
            100.0 * winning_trades as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_profit_per_winning_trade = average(gross_profit, winning_trades);
        let avg_loss_per_losing_trade = average(gross_loss, losing_trades);
        let avg_pnl_per_trade = average(net_profit, total_trades);

        let (max_drawdown_value, max_drawdown_percentage) = compute_drawdown(trades, initial_capital);
        let sharpe_ratio = compute_sharpe(trades, initial_capital);

        Metrics {
            total_trades,
            winning_trades,
            losing_trades,
            gross_profit,
            gross_loss,
            net_profit,
            win_rate_pct,
            profit_factor,
            avg_profit_per_winning_trade,
            avg_loss_per_losing_trade,
            avg_pnl_per_trade,
            max_drawdown_value,
            max_drawdown_percentage,
            sharpe_ratio,
        }
    }
}

fn average(total: f64, count: usize) -> f64 {
    if count > 0 { total / count as f64 } else { 0.0 }
}

/// Running equity after each trade, starting from `initial_capital`.
fn equity_curve(trades: &[Trade], initial_capital: f64) -> impl Iterator<Item = f64> + '_ {
    trades.iter().scan(initial_capital, |equity, trade| {
        *equity += trade.pnl;
        Some(*equity)
    })
}

/// Largest peak-to-trough decline as (value, percentage of peak). The peak
/// starts at the initial capital.
fn compute_drawdown(trades: &[Trade], initial_capital: f64) -> (f64, f64) {
    let mut peak = initial_capital;
    let mut max_value = 0.0_f64;
    let mut max_pct = 0.0_f64;

    for equity in equity_curve(trades, initial_capital) {
        if equity > peak {
            peak = equity;
            continue;
        }
        let dd = peak - equity;
        if dd > max_value {
            max_value = dd;
        }
        if peak > 0.0 {
            let pct = 100.0 * dd / peak;
            if pct > max_pct {
                max_pct = pct;
            }
        }
    }

    (max_value, max_pct.clamp(0.0, 100.0))
}

/// Mean over population std-dev of per-trade returns, each trade's PnL
/// relative to the equity just before it.
fn compute_sharpe(trades: &[Trade], initial_capital: f64) -> f64 {
    if trades.len() < 2 {
        return 0.0;
    }

    let before = std::iter::once(initial_capital).chain(equity_curve(trades, initial_capital));
    let returns: Vec<f64> = trades
        .iter()
        .zip(before)
        .map(|(trade, equity)| if equity > 0.0 { trade.pnl / equity } else { 0.0 })
        .collect();

    let stddev = population_stddev(&returns);
    if stddev < MIN_STDDEV {
        return 0.0;
    }
    mean(&returns) / stddev
}
