use std::cmp::Ordering;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::chromosome::Chromosome;
use crate::simulator::SimulationStats;

/// Stand-in for an unbounded ratio (no losses, or no drawdown, with profit).
pub const LARGE_RATIO: f64 = 1.0e6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

/// What a candidate is optimized for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Criterion {
    #[default]
    NetProfit,
    ProfitFactor,
    ExpectedPayoff,
    MaxDrawdown,
    ProfitDrawdownRatio,
}

impl Criterion {
    pub fn direction(self) -> Direction {
        match self {
            Criterion::MaxDrawdown => Direction::Minimize,
            _ => Direction::Maximize,
        }
    }

    /// Worst finite value under this ordering.
    pub fn worst(self) -> f64 {
        match self.direction() {
            Direction::Maximize => f64::MIN,
            Direction::Minimize => f64::MAX,
        }
    }

    /// `Greater` means `a` is better than `b`. Non-finite values rank last.
    pub fn compare(self, a: f64, b: f64) -> Ordering {
        let a = self.finite_or_worst(a);
        let b = self.finite_or_worst(b);
        let natural = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match self.direction() {
            Direction::Maximize => natural,
            Direction::Minimize => natural.reverse(),
        }
    }

    pub fn is_better(self, a: f64, b: f64) -> bool {
        self.compare(a, b) == Ordering::Greater
    }

    /// Fitness of `c`, with unevaluated chromosomes ranked worst.
    pub fn fitness_of(self, c: &Chromosome) -> f64 {
        c.fitness()
            .map(|f| self.finite_or_worst(f))
            .unwrap_or_else(|| self.worst())
    }

    pub fn finite_or_worst(self, value: f64) -> f64 {
        if value.is_finite() {
            value
        } else {
            self.worst()
        }
    }

    pub fn score(self, stats: &SimulationStats) -> f64 {
        let value = match self {
            Criterion::NetProfit => stats.net_profit,
            Criterion::ProfitFactor => {
                if stats.gross_loss > 0.0 {
                    stats.gross_profit / stats.gross_loss
                } else if stats.gross_profit > 0.0 {
                    LARGE_RATIO
                } else {
                    0.0
                }
            }
            Criterion::ExpectedPayoff => {
                if stats.trades == 0 {
                    0.0
                } else {
                    stats.net_profit / stats.trades as f64
                }
            }
            Criterion::MaxDrawdown => stats.max_drawdown_pct,
            Criterion::ProfitDrawdownRatio => {
                if stats.max_drawdown_pct > 0.0 {
                    stats.net_profit / stats.max_drawdown_pct
                } else if stats.net_profit > 0.0 {
                    LARGE_RATIO
                } else {
                    0.0
                }
            }
        };
        self.finite_or_worst(value)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Criterion::NetProfit => "net-profit",
            Criterion::ProfitFactor => "profit-factor",
            Criterion::ExpectedPayoff => "expected-payoff",
            Criterion::MaxDrawdown => "max-drawdown",
            Criterion::ProfitDrawdownRatio => "profit-drawdown-ratio",
        };
        f.write_str(name)
    }
}
