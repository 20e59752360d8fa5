use std::io::Write;

use sma_ga_optimizer::market::{BarProvider, load_bars_from_csv};
use sma_ga_optimizer::{
    Criterion, HistoryStore, MarketContext, OptimizerConfig, OptimizerError, PeriodBounds,
    Timeframe,
};
use tempfile::NamedTempFile;

fn write_csv(body: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(body.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

#[test]
fn loads_millisecond_rows_with_header_and_skips_garbage() {
    let f = write_csv(
        "timestamp,open,high,low,close,volume\n\
         1700003600000,1.1,1.2,1.0,1.15,10\n\
         1700000000000,1.0,1.1,0.9,1.05,10\n\
         not,a,valid,row,here\n\
         1700007200000,1.15,1.3,1.1,1.25,10\n",
    );
    let bars = load_bars_from_csv(f.path()).unwrap();
    assert_eq!(bars.len(), 3);
    assert_eq!(bars[0].ts, 1_700_000_000);
    assert_eq!(bars[2].close, 1.25);
}

#[test]
fn loads_mt4_exports_with_split_date_and_time() {
    let f = write_csv(
        "2024.01.02,00:00,1.10000,1.10500,1.09500,1.10200,120\n\
         2024.01.02,01:00,1.10200,1.10700,1.10100,1.10600,98\n",
    );
    let ctx = MarketContext::new("EURUSD", Timeframe::H1);
    let store = HistoryStore::load_csv(f.path(), ctx.clone()).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(Timeframe::infer(store.history()), Some(Timeframe::H1));

    let newest = store.bars(&ctx, 1).unwrap();
    assert_eq!(newest[0].close, 1.106);
    assert_eq!(newest[0].ts, 1_704_157_200);
}

#[test]
fn empty_file_is_an_error() {
    let f = write_csv("time,open,high,low,close\n");
    let err = HistoryStore::load_csv(f.path(), MarketContext::new("X", Timeframe::D1)).unwrap_err();
    assert!(matches!(err, OptimizerError::NoBars(_)));
}

#[test]
fn config_file_round_trip() {
    let f = write_csv(
        "[market]\nsymbol = \"USDJPY\"\ntimeframe = \"D1\"\n\n\
         [genetic]\npopulation_size = 12\ncriterion = \"profit-drawdown-ratio\"\n\
         bounds = { min_period = 2, max_period = 60, min_gap = 3 }\n",
    );
    let cfg = OptimizerConfig::load(f.path()).unwrap();
    assert_eq!(cfg.context(), MarketContext::new("USDJPY", Timeframe::D1));
    assert_eq!(cfg.genetic.population_size, 12);
    assert_eq!(cfg.genetic.criterion, Criterion::ProfitDrawdownRatio);
    assert_eq!(cfg.genetic.bounds, PeriodBounds::new(2, 60, 3));
}
