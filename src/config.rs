use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::genetic::GaConfig;
use crate::market::{MarketContext, Timeframe};
use crate::simulator::SimulatorConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSection {
    pub symbol: String,
    pub timeframe: Timeframe,
}

impl Default for MarketSection {
    fn default() -> Self {
        Self {
            symbol: "EURUSD".to_string(),
            timeframe: Timeframe::H1,
        }
    }
}

/// Everything one optimization run needs, as read from a TOML file.
///
/// ```toml
/// output = "best_periods.json"
///
/// [market]
/// symbol = "EURUSD"
/// timeframe = "H1"
///
/// [simulator]
/// history_bars = 2000
/// ma_method = "exponential"
///
/// [genetic]
/// population_size = 30
/// criterion = "profit-factor"
/// bounds = { min_period = 5, max_period = 200, min_gap = 5 }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub market: MarketSection,
    pub simulator: SimulatorConfig,
    pub genetic: GaConfig,
    pub output: Option<PathBuf>,
}

impl OptimizerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn context(&self) -> MarketContext {
        MarketContext::new(self.market.symbol.clone(), self.market.timeframe)
    }
}
