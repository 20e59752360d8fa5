use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use chrono::{DateTime, NaiveDateTime};
use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{DataError, OptimizerError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Open time, epoch seconds.
    pub ts: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    #[default]
    H1,
    H4,
    D1,
    W1,
    MN1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 9] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
        Timeframe::MN1,
    ];

    pub fn minutes(self) -> i64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1_440,
            Timeframe::W1 => 10_080,
            Timeframe::MN1 => 43_200,
        }
    }

    /// Guesses the timeframe from the median spacing of time-sorted bars.
    pub fn infer(bars: &[Bar]) -> Option<Timeframe> {
        let mut gaps: Vec<i64> = bars
            .windows(2)
            .map(|w| w[1].ts - w[0].ts)
            .filter(|g| *g > 0)
            .collect();
        if gaps.is_empty() {
            return None;
        }
        gaps.sort_unstable();
        let median_minutes = gaps[gaps.len() / 2] as f64 / 60.0;

        Timeframe::ALL.into_iter().min_by(|a, b| {
            let da = (a.minutes() as f64 / median_minutes).ln().abs();
            let db = (b.minutes() as f64 / median_minutes).ln().abs();
            da.total_cmp(&db)
        })
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
            Timeframe::W1 => "W1",
            Timeframe::MN1 => "MN1",
        };
        f.write_str(name)
    }
}

/// Symbol and timeframe a series is requested for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketContext {
    pub symbol: String,
    pub timeframe: Timeframe,
}

impl MarketContext {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MaMethod {
    #[default]
    Simple,
    Exponential,
    Smoothed,
    LinearWeighted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AppliedPrice {
    #[default]
    Close,
    Open,
    High,
    Low,
    Median,
    Typical,
    Weighted,
}

impl AppliedPrice {
    pub fn of(self, bar: &Bar) -> f64 {
        match self {
            AppliedPrice::Close => bar.close,
            AppliedPrice::Open => bar.open,
            AppliedPrice::High => bar.high,
            AppliedPrice::Low => bar.low,
            AppliedPrice::Median => (bar.high + bar.low) / 2.0,
            AppliedPrice::Typical => (bar.high + bar.low + bar.close) / 3.0,
            AppliedPrice::Weighted => (bar.high + bar.low + 2.0 * bar.close) / 4.0,
        }
    }
}

/// Most recent bars, newest first. May return fewer than `count`.
pub trait BarProvider {
    fn bars(&self, ctx: &MarketContext, count: usize) -> std::result::Result<Vec<Bar>, DataError>;
}

/// Moving average aligned with [`BarProvider::bars`], newest first.
/// `None` marks bars without enough history for the period.
pub trait MovingAverageProvider {
    fn moving_average(
        &self,
        ctx: &MarketContext,
        period: usize,
        method: MaMethod,
        price: AppliedPrice,
        count: usize,
    ) -> std::result::Result<Vec<Option<f64>>, DataError>;
}

/// Moving average over oldest-first prices, same length as `prices`.
pub fn moving_average(prices: &[f64], period: usize, method: MaMethod) -> Vec<Option<f64>> {
    let mut out = vec![None; prices.len()];
    if period == 0 || prices.len() < period {
        return out;
    }
    let p = period as f64;

    match method {
        MaMethod::Simple => {
            for (i, w) in prices.windows(period).enumerate() {
                out[i + period - 1] = Some(w.iter().sum::<f64>() / p);
            }
        }
        MaMethod::LinearWeighted => {
            let norm = p * (p + 1.0) / 2.0;
            for (i, w) in prices.windows(period).enumerate() {
                let acc: f64 = w
                    .iter()
                    .enumerate()
                    .map(|(k, x)| (k + 1) as f64 * x)
                    .sum();
                out[i + period - 1] = Some(acc / norm);
            }
        }
        MaMethod::Exponential | MaMethod::Smoothed => {
            let mut prev = prices[..period].iter().sum::<f64>() / p;
            out[period - 1] = Some(prev);
            for (i, x) in prices.iter().enumerate().skip(period) {
                prev = match method {
                    MaMethod::Exponential => {
                        let alpha = 2.0 / (p + 1.0);
                        alpha * x + (1.0 - alpha) * prev
                    }
                    _ => (prev * (p - 1.0) + x) / p,
                };
                out[i] = Some(prev);
            }
        }
    }
    out
}

type SeriesKey = (usize, MaMethod, AppliedPrice);

/// In-memory history of one symbol/timeframe, serving bars and cached averages.
#[derive(Debug)]
pub struct HistoryStore {
    context: MarketContext,
    bars: Vec<Bar>,
    cache: RefCell<HashMap<SeriesKey, Rc<Vec<Option<f64>>>>>,
}

impl HistoryStore {
    pub fn from_bars(context: MarketContext, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.ts);
        bars.dedup_by_key(|b| b.ts);
        Self {
            context,
            bars,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn load_csv(path: &Path, context: MarketContext) -> Result<Self> {
        let bars = load_bars_from_csv(path)?;
        if bars.is_empty() {
            return Err(OptimizerError::NoBars(path.to_path_buf()));
        }
        Ok(Self::from_bars(context, bars))
    }

    pub fn context(&self) -> &MarketContext {
        &self.context
    }

    /// Oldest first.
    pub fn history(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn cached_series(&self) -> usize {
        self.cache.borrow().len()
    }

    fn check(&self, ctx: &MarketContext) -> std::result::Result<(), DataError> {
        if *ctx != self.context {
            return Err(DataError::UnknownSeries {
                symbol: ctx.symbol.clone(),
                timeframe: ctx.timeframe.to_string(),
            });
        }
        if self.bars.is_empty() {
            return Err(DataError::EmptyHistory);
        }
        Ok(())
    }

    fn series(&self, key: SeriesKey) -> Rc<Vec<Option<f64>>> {
        if let Some(s) = self.cache.borrow().get(&key) {
            return Rc::clone(s);
        }
        let (period, method, price) = key;
        let prices: Vec<f64> = self.bars.iter().map(|b| price.of(b)).collect();
        let series = Rc::new(moving_average(&prices, period, method));
        self.cache.borrow_mut().insert(key, Rc::clone(&series));
        series
    }
}

impl BarProvider for HistoryStore {
    fn bars(&self, ctx: &MarketContext, count: usize) -> std::result::Result<Vec<Bar>, DataError> {
        self.check(ctx)?;
        Ok(self.bars.iter().rev().take(count).cloned().collect())
    }
}

impl MovingAverageProvider for HistoryStore {
    fn moving_average(
        &self,
        ctx: &MarketContext,
        period: usize,
        method: MaMethod,
        price: AppliedPrice,
        count: usize,
    ) -> std::result::Result<Vec<Option<f64>>, DataError> {
        self.check(ctx)?;
        if period == 0 {
            return Err(DataError::InvalidPeriod(period));
        }
        let series = self.series((period, method, price));
        Ok(series.iter().rev().take(count).copied().collect())
    }
}

/// Reads `time,open,high,low,close[,...]` rows, or MT4 exports with split
/// date and time columns. Rows that do not parse are skipped.
pub fn load_bars_from_csv(path: &Path) -> Result<Vec<Bar>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut bars = Vec::new();
    let mut skipped = 0_usize;
    for rec in rdr.records() {
        let r = match rec {
            Ok(x) => x,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        match parse_record(&r) {
            Some(bar) => bars.push(bar),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("{}: skipped {} unparsable rows", path.display(), skipped);
    }
    bars.sort_by_key(|b| b.ts);
    bars.dedup_by_key(|b| b.ts);
    Ok(bars)
}

fn parse_record(r: &csv::StringRecord) -> Option<Bar> {
    let split_time = r.len() >= 6 && r.get(1).is_some_and(|x| x.contains(':'));
    let (ts, first) = if split_time {
        let joined = format!("{} {}", r.get(0)?, r.get(1)?);
        (parse_time(&joined)?, 2)
    } else {
        (parse_time(r.get(0)?)?, 1)
    };

    let num = |i: usize| r.get(i).and_then(|x| x.parse::<f64>().ok()).filter(|v| v.is_finite());
    let bar = Bar {
        ts,
        open: num(first)?,
        high: num(first + 1)?,
        low: num(first + 2)?,
        close: num(first + 3)?,
    };
    (bar.high >= bar.low).then_some(bar)
}

/// Epoch seconds or milliseconds, RFC 3339, or MT4 `YYYY.MM.DD HH:MM[:SS]`.
pub fn parse_time(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(if n.abs() >= 100_000_000_000 { n / 1000 } else { n });
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    ["%Y.%m.%d %H:%M:%S", "%Y.%m.%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.and_utc().timestamp())
}
