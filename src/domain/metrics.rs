//! Run summary statistics over closed trades.

use super::position::Trade;

/// Aggregate over every closed trade of a run. All-zero when nothing closed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total_trades: usize,
    pub total_pnl: f64,
    pub avg_pnl: f64,
    pub win_rate: f64,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Largest peak-to-trough fall of cumulative pnl, in price units.
    pub max_drawdown: f64,
}

impl RunSummary {
    pub fn compute(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return RunSummary::default();
        }

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut total_pnl = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trade in trades {
            let pnl = trade.pnl;
            total_pnl += pnl;
            if pnl > 0.0 {
                trades_won += 1;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                largest_loss = largest_loss.max(pnl.abs());
            }
        }

        let total_trades = trades.len();
        RunSummary {
            total_trades,
            total_pnl,
            avg_pnl: total_pnl / total_trades as f64,
            win_rate: trades_won as f64 / total_trades as f64,
            trades_won,
            trades_lost,
            largest_win,
            largest_loss,
            max_drawdown: compute_drawdown(trades),
        }
    }
}

fn compute_drawdown(trades: &[Trade]) -> f64 {
    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;

    for trade in trades {
        cumulative += trade.pnl;
        peak = peak.max(cumulative);
        max_dd = max_dd.max(peak - cumulative);
    }
    max_dd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{EntryReason, ExitReason, Position};
    use chrono::{Duration, NaiveDate};

    fn make_trade(pnl: f64) -> Trade {
        let entry = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap();
        Position::open_long(entry, 100.0, EntryReason::default()).close(
            entry + Duration::minutes(5),
            100.0 + pnl,
            ExitReason::EndOfData,
            0.0,
        )
    }

    fn make_trades(pnls: &[f64]) -> Vec<Trade> {
        pnls.iter().map(|&p| make_trade(p)).collect()
    }

    #[test]
    fn empty_run_is_all_zero() {
        let s = RunSummary::compute(&[]);
        assert_eq!(s, RunSummary::default());
        assert_eq!(s.total_trades, 0);
        assert_eq!(s.total_pnl, 0.0);
        assert_eq!(s.avg_pnl, 0.0);
        assert_eq!(s.win_rate, 0.0);
    }

    #[test]
    fn totals_and_average() {
        let s = RunSummary::compute(&make_trades(&[4.0, -2.0, 10.0, 0.0]));
        assert_eq!(s.total_trades, 4);
        assert!((s.total_pnl - 12.0).abs() < 1e-9);
        assert!((s.avg_pnl - 3.0).abs() < 1e-9);
    }

    #[test]
    fn win_rate_counts_strictly_positive() {
        let s = RunSummary::compute(&make_trades(&[4.0, -2.0, 10.0, 0.0]));
        assert_eq!(s.trades_won, 2);
        assert_eq!(s.trades_lost, 1);
        assert!((s.win_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn largest_win_and_loss() {
        let s = RunSummary::compute(&make_trades(&[1.0, 3.0, -0.5, -1.5]));
        assert!((s.largest_win - 3.0).abs() < 1e-9);
        assert!((s.largest_loss - 1.5).abs() < 1e-9);
    }

    #[test]
    fn drawdown_of_cumulative_pnl() {
        // cumulative: 2, 5, 2, 1, 4 -> peak 5, trough 1
        let s = RunSummary::compute(&make_trades(&[2.0, 3.0, -3.0, -1.0, 3.0]));
        assert!((s.max_drawdown - 4.0).abs() < 1e-9);
    }

    #[test]
    fn drawdown_from_first_trade_loss() {
        let s = RunSummary::compute(&make_trades(&[-2.0, 1.0]));
        assert!((s.max_drawdown - 2.0).abs() < 1e-9);
    }

    #[test]
    fn all_winners_no_drawdown() {
        let s = RunSummary::compute(&make_trades(&[1.0, 2.0, 3.0]));
        assert_eq!(s.max_drawdown, 0.0);
        assert!((s.win_rate - 1.0).abs() < f64::EPSILON);
    }
}
