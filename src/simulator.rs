use log::debug;
use serde::{Deserialize, Serialize};

use crate::criterion::Criterion;
use crate::error::DataError;
use crate::market::{
    AppliedPrice, Bar, BarProvider, MaMethod, MarketContext, MovingAverageProvider,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Bars walked per evaluation.
    pub history_bars: usize,
    pub ma_method: MaMethod,
    pub applied_price: AppliedPrice,
    /// Open the opposite side on the bar that closed a position.
    pub reverse_on_cross: bool,
    /// Fewer completed trades than this scores worst. 0 disables the check.
    pub min_trades: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            history_bars: 1000,
            ma_method: MaMethod::Simple,
            applied_price: AppliedPrice::Close,
            reverse_on_cross: false,
            min_trades: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cross {
    Bullish,
    Bearish,
}

impl Side {
    fn opened_by(cross: Cross) -> Self {
        match cross {
            Cross::Bullish => Side::Long,
            Cross::Bearish => Side::Short,
        }
    }

    fn closed_by(self, cross: Cross) -> bool {
        matches!(
            (self, cross),
            (Side::Long, Cross::Bearish) | (Side::Short, Cross::Bullish)
        )
    }

    fn profit(self, entry: f64, exit: f64) -> f64 {
        match self {
            Side::Long => exit - entry,
            Side::Short => entry - exit,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trade {
    pub side: Side,
    pub entry_time: i64,
    pub exit_time: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub profit: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SimulationStats {
    pub net_profit: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub trades: usize,
    pub winning_trades: usize,
    pub initial_equity: f64,
    pub final_equity: f64,
    pub peak_equity: f64,
    pub max_drawdown_pct: f64,
    pub bars_walked: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SimulationReport {
    pub stats: SimulationStats,
    pub trades: Vec<Trade>,
}

/// Scores a `(short, long)` pair. Never fails: bad data yields `criterion.worst()`.
pub trait FitnessEvaluator {
    fn fitness(&self, short_period: usize, long_period: usize, criterion: Criterion) -> f64;
}

impl<F> FitnessEvaluator for F
where
    F: Fn(usize, usize, Criterion) -> f64,
{
    fn fitness(&self, short_period: usize, long_period: usize, criterion: Criterion) -> f64 {
        self(short_period, long_period, criterion)
    }
}

#[derive(Clone, Copy, Debug)]
struct OpenPosition {
    side: Side,
    entry_price: f64,
    entry_time: i64,
}

#[derive(Default)]
struct Ledger {
    stats: SimulationStats,
    trades: Vec<Trade>,
    started: bool,
}

impl Ledger {
    fn start(&mut self, equity: f64) {
        if !self.started {
            self.started = true;
            self.stats.initial_equity = equity;
            self.stats.final_equity = equity;
            self.stats.peak_equity = equity;
        }
    }

    fn close(&mut self, pos: OpenPosition, bar: &Bar) {
        let profit = pos.side.profit(pos.entry_price, bar.close);
        let s = &mut self.stats;
        s.net_profit += profit;
        if profit > 0.0 {
            s.gross_profit += profit;
            s.winning_trades += 1;
        } else {
            s.gross_loss -= profit;
        }
        s.trades += 1;

        s.final_equity += profit;
        if s.final_equity > s.peak_equity {
            s.peak_equity = s.final_equity;
        }
        if s.peak_equity > 0.0 {
            let dd = (s.peak_equity - s.final_equity) / s.peak_equity * 100.0;
            if dd > s.max_drawdown_pct {
                s.max_drawdown_pct = dd;
            }
        }

        self.trades.push(Trade {
            side: pos.side,
            entry_time: pos.entry_time,
            exit_time: bar.ts,
            entry_price: pos.entry_price,
            exit_price: bar.close,
            profit,
        });
    }
}

/// Replays the crossover rule over the most recent `history_bars` bars.
pub struct StrategySimulator<'a, D> {
    data: &'a D,
    context: MarketContext,
    config: SimulatorConfig,
}

impl<'a, D> StrategySimulator<'a, D>
where
    D: BarProvider + MovingAverageProvider,
{
    pub fn new(data: &'a D, context: MarketContext, config: SimulatorConfig) -> Self {
        Self {
            data,
            context,
            config,
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn context(&self) -> &MarketContext {
        &self.context
    }

    /// Bars requested for one evaluation: history plus warm-up. `None` when
    /// the sum does not fit in `usize`.
    pub fn window_len(&self, short_period: usize, long_period: usize) -> Option<usize> {
        self.config
            .history_bars
            .checked_add(short_period.max(long_period))?
            .checked_add(2)
    }

    pub fn simulate(
        &self,
        short_period: usize,
        long_period: usize,
    ) -> Result<SimulationReport, DataError> {
        if short_period == 0 || long_period == 0 {
            return Err(DataError::InvalidPeriod(0));
        }
        let window = self
            .window_len(short_period, long_period)
            .ok_or(DataError::InsufficientBars {
                requested: usize::MAX,
                available: 0,
            })?;
        let bars = self.data.bars(&self.context, window)?;
        let short_ma = self.series(short_period, window)?;
        let long_ma = self.series(long_period, window)?;

        let available = bars.len().min(short_ma.len()).min(long_ma.len());
        if available < window {
            return Err(DataError::InsufficientBars {
                requested: window,
                available,
            });
        }

        let mut ledger = Ledger::default();
        let mut position: Option<OpenPosition> = None;

        for i in (0..self.config.history_bars).rev() {
            let (Some(prev_short), Some(prev_long), Some(cur_short), Some(cur_long)) =
                (short_ma[i + 1], long_ma[i + 1], short_ma[i], long_ma[i])
            else {
                continue;
            };
            let bar = &bars[i];
            ledger.start(bar.close);
            ledger.stats.bars_walked += 1;

            let cross = if prev_short <= prev_long && cur_short > cur_long {
                Cross::Bullish
            } else if prev_short >= prev_long && cur_short < cur_long {
                Cross::Bearish
            } else {
                continue;
            };

            let mut closed = false;
            if let Some(pos) = position {
                if pos.side.closed_by(cross) {
                    ledger.close(pos, bar);
                    position = None;
                    closed = true;
                }
            }
            if position.is_none() && (!closed || self.config.reverse_on_cross) {
                position = Some(OpenPosition {
                    side: Side::opened_by(cross),
                    entry_price: bar.close,
                    entry_time: bar.ts,
                });
            }
        }

        if let Some(pos) = position {
            ledger.close(pos, &bars[0]);
        }

        Ok(SimulationReport {
            stats: ledger.stats,
            trades: ledger.trades,
        })
    }

    fn series(&self, period: usize, count: usize) -> Result<Vec<Option<f64>>, DataError> {
        self.data.moving_average(
            &self.context,
            period,
            self.config.ma_method,
            self.config.applied_price,
            count,
        )
    }
}

impl<D> FitnessEvaluator for StrategySimulator<'_, D>
where
    D: BarProvider + MovingAverageProvider,
{
    fn fitness(&self, short_period: usize, long_period: usize, criterion: Criterion) -> f64 {
        match self.simulate(short_period, long_period) {
            Ok(report) if report.stats.trades < self.config.min_trades => criterion.worst(),
            Ok(report) => criterion.score(&report.stats),
            Err(e) => {
                debug!("evaluation of ({short_period}, {long_period}) failed: {e}");
                criterion.worst()
            }
        }
    }
}
