//! Genetic search over the `(short, long)` periods of an SMA crossover rule.
//!
//! A [`genetic::GeneticOptimizer`] evolves [`chromosome::Chromosome`]s whose
//! fitness comes from a [`simulator::StrategySimulator`] replaying the rule
//! over historical bars served by a [`market`] provider.

pub mod chromosome;
pub mod config;
pub mod criterion;
pub mod error;
pub mod genetic;
pub mod market;
pub mod simulator;

pub use chromosome::{Chromosome, PeriodBounds};
pub use config::OptimizerConfig;
pub use criterion::Criterion;
pub use error::{DataError, OptimizerError};
pub use genetic::{GaConfig, GeneticOptimizer, OptimizationOutcome, StopSignal};
pub use market::{Bar, HistoryStore, MarketContext, Timeframe};
pub use simulator::{FitnessEvaluator, SimulatorConfig, StrategySimulator};
