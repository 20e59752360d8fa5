use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use log::warn;
use serde_json::json;

use sma_ga_optimizer::criterion::Criterion;
use sma_ga_optimizer::genetic::{Deadline, GeneticOptimizer, NeverStop, StopSignal, seeded_rng};
use sma_ga_optimizer::market::{AppliedPrice, HistoryStore, MaMethod, Timeframe};
use sma_ga_optimizer::simulator::StrategySimulator;
use sma_ga_optimizer::OptimizerConfig;

const DEFAULT_OUT: &str = "sma_ga_result.json";

#[derive(Parser, Debug)]
#[command(author, version, about = "Genetic SMA crossover period optimizer")]
struct Args {
    /// TOML file with [market], [simulator] and [genetic] sections.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Bars as CSV: time,open,high,low,close (or MT4 date,time,open,...).
    #[arg(long)]
    data_file: PathBuf,
    #[arg(long)]
    symbol: Option<String>,
    #[arg(long, value_enum)]
    timeframe: Option<Timeframe>,
    #[arg(long, value_enum)]
    criterion: Option<Criterion>,
    #[arg(long)]
    population: Option<usize>,
    #[arg(long)]
    generations: Option<usize>,
    #[arg(long)]
    tournament: Option<usize>,
    #[arg(long)]
    crossover_rate: Option<f64>,
    #[arg(long)]
    mutation_rate: Option<f64>,
    #[arg(long)]
    min_period: Option<usize>,
    #[arg(long)]
    max_period: Option<usize>,
    #[arg(long)]
    min_gap: Option<usize>,
    #[arg(long)]
    history_bars: Option<usize>,
    #[arg(long, value_enum)]
    ma_method: Option<MaMethod>,
    #[arg(long, value_enum)]
    applied_price: Option<AppliedPrice>,
    #[arg(long)]
    min_trades: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Stop between generations once this many seconds have passed.
    #[arg(long)]
    time_limit_secs: Option<u64>,
    #[arg(long)]
    out: Option<PathBuf>,
}

impl Args {
    fn apply(&self, cfg: &mut OptimizerConfig) {
        if let Some(v) = &self.symbol {
            cfg.market.symbol = v.clone();
        }
        if let Some(v) = self.timeframe {
            cfg.market.timeframe = v;
        }

        let ga = &mut cfg.genetic;
        if let Some(v) = self.criterion {
            ga.criterion = v;
        }
        if let Some(v) = self.population {
            ga.population_size = v;
        }
        if let Some(v) = self.generations {
            ga.generations = v;
        }
        if let Some(v) = self.tournament {
            ga.tournament_size = v;
        }
        if let Some(v) = self.crossover_rate {
            ga.crossover_rate = v;
        }
        if let Some(v) = self.mutation_rate {
            ga.mutation_rate = v;
        }
        if let Some(v) = self.min_period {
            ga.bounds.min_period = v;
        }
        if let Some(v) = self.max_period {
            ga.bounds.max_period = v;
        }
        if let Some(v) = self.min_gap {
            ga.bounds.min_gap = v;
        }
        if self.seed.is_some() {
            ga.seed = self.seed;
        }

        let sim = &mut cfg.simulator;
        if let Some(v) = self.history_bars {
            sim.history_bars = v;
        }
        if let Some(v) = self.ma_method {
            sim.ma_method = v;
        }
        if let Some(v) = self.applied_price {
            sim.applied_price = v;
        }
        if let Some(v) = self.min_trades {
            sim.min_trades = v;
        }

        if let Some(v) = &self.out {
            cfg.output = Some(v.clone());
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => OptimizerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => OptimizerConfig::default(),
    };
    args.apply(&mut cfg);
    cfg.genetic = cfg.genetic.sanitized();

    let context = cfg.context();
    let store = HistoryStore::load_csv(&args.data_file, context.clone())
        .with_context(|| format!("failed to load bars from {}", args.data_file.display()))?;

    if let Some(found) = Timeframe::infer(store.history()) {
        if found != context.timeframe {
            warn!(
                "bars in {} look like {} but {} was configured",
                args.data_file.display(),
                found,
                context.timeframe
            );
        }
    }
    let needed = cfg
        .simulator
        .history_bars
        .saturating_add(cfg.genetic.bounds.max_period)
        .saturating_add(2);
    if store.len() < needed {
        warn!(
            "{} bars loaded, {} needed for the longest period; such candidates will score worst",
            store.len(),
            needed
        );
    }

    println!("data={}", args.data_file.display());
    println!(
        "symbol={} timeframe={} bars={} history_bars={} criterion={} population={} generations={}",
        context.symbol,
        context.timeframe,
        store.len(),
        cfg.simulator.history_bars,
        cfg.genetic.criterion,
        cfg.genetic.population_size,
        cfg.genetic.generations
    );

    let simulator = StrategySimulator::new(&store, context.clone(), cfg.simulator.clone());
    let rng = seeded_rng(cfg.genetic.seed);
    let mut optimizer = GeneticOptimizer::new(cfg.genetic.clone(), &simulator, rng);

    let stop: Box<dyn StopSignal> = match args.time_limit_secs {
        Some(secs) => Box::new(Deadline::after(Duration::from_secs(secs))),
        None => Box::new(NeverStop),
    };
    let outcome = optimizer.run(&*stop);

    let (short, long) = outcome.best.periods();
    let report = simulator.simulate(short, long).ok();

    let payload = json!({
        "objective": format!(
            "{} of an SMA crossover on {} {}",
            outcome.criterion, context.symbol, context.timeframe
        ),
        "generated_at_utc": Utc::now().to_rfc3339(),
        "data_file": args.data_file,
        "bars_loaded": store.len(),
        "settings": cfg,
        "interrupted": outcome.interrupted,
        "generations_completed": outcome.generations_completed,
        "evaluations": outcome.evaluations,
        "cache_hits": outcome.cache_hits,
        "best": {
            "short_period": short,
            "long_period": long,
            "fitness": outcome.best_fitness(),
            "stats": report.as_ref().map(|r| &r.stats),
            "trades": report.as_ref().map(|r| &r.trades),
        },
        "history": outcome.history,
    });

    let out = cfg.output.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_OUT));
    fs::write(&out, serde_json::to_string_pretty(&payload)?)
        .with_context(|| format!("failed to write {}", out.display()))?;

    println!("\nSaved result: {}", out.display());
    println!(
        "Best short={} long={} {}={:.6} generations={} interrupted={}",
        short,
        long,
        outcome.criterion,
        outcome.best_fitness(),
        outcome.generations_completed,
        if outcome.interrupted { 1 } else { 0 }
    );
    if let Some(r) = &report {
        println!(
            "trades={} net_profit={:.5} profit_factor={:.3} max_dd={:.2}%",
            r.stats.trades,
            r.stats.net_profit,
            Criterion::ProfitFactor.score(&r.stats),
            r.stats.max_drawdown_pct
        );
    } else {
        println!("WARNING: not enough data to replay the best pair.");
    }

    Ok(())
}
