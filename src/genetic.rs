use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::chromosome::{Chromosome, PeriodBounds};
use crate::criterion::Criterion;
use crate::simulator::FitnessEvaluator;

/// Redraws of the second parent before a duplicate pair is accepted.
pub const MAX_PARENT_RETRIES: usize = 16;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    pub population_size: usize,
    pub generations: usize,
    pub tournament_size: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub criterion: Criterion,
    pub bounds: PeriodBounds,
    /// Read by [`seeded_rng`] when the host builds the optimizer's RNG; the
    /// optimizer itself only uses the RNG it is given.
    pub seed: Option<u64>,
    pub cache_fitness: bool,
    pub generation_pause_ms: u64,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            generations: 50,
            tournament_size: 5,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            criterion: Criterion::NetProfit,
            bounds: PeriodBounds::default(),
            seed: None,
            cache_fitness: true,
            generation_pause_ms: 0,
        }
    }
}

impl GaConfig {
    /// Falls back to the smallest safe value for every invalid field.
    pub fn sanitized(self) -> Self {
        let defaults = GaConfig::default();
        let mut c = self;

        if c.population_size < 2 {
            warn!("population_size {} is below 2, using 2", c.population_size);
            c.population_size = 2;
        }
        if c.population_size % 2 == 1 {
            let even = c
                .population_size
                .checked_add(1)
                .unwrap_or(c.population_size - 1);
            warn!("population_size {} is odd, using {even}", c.population_size);
            c.population_size = even;
        }
        if c.tournament_size == 0 {
            warn!("tournament_size 0 is invalid, using 1");
            c.tournament_size = 1;
        }
        if c.tournament_size > c.population_size {
            debug!(
                "tournament_size {} clamped to population_size {}",
                c.tournament_size, c.population_size
            );
            c.tournament_size = c.population_size;
        }
        c.crossover_rate = unit_rate("crossover_rate", c.crossover_rate, defaults.crossover_rate);
        c.mutation_rate = unit_rate("mutation_rate", c.mutation_rate, defaults.mutation_rate);
        c.bounds = c.bounds.sanitized();
        c
    }
}

fn unit_rate(name: &str, value: f64, default: f64) -> f64 {
    if !value.is_finite() {
        warn!("{name} {value} is not a number, using {default}");
        default
    } else if !(0.0..=1.0).contains(&value) {
        let clamped = value.clamp(0.0, 1.0);
        warn!("{name} {value} is outside [0, 1], using {clamped}");
        clamped
    } else {
        value
    }
}

/// `StdRng` seeded from `seed`, or from OS entropy when absent.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

/// Polled by the optimizer between generations.
pub trait StopSignal {
    fn should_stop(&self) -> bool;
}

impl StopSignal for AtomicBool {
    fn should_stop(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T: StopSignal + ?Sized> StopSignal for &T {
    fn should_stop(&self) -> bool {
        (**self).should_stop()
    }
}

pub struct NeverStop;

impl StopSignal for NeverStop {
    fn should_stop(&self) -> bool {
        false
    }
}

/// Wall-clock budget. A budget past the clock's range never expires.
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        let at = Instant::now().checked_add(budget);
        if at.is_none() {
            warn!("time limit {budget:?} is out of range, running without one");
        }
        Self(at)
    }
}

impl StopSignal for Deadline {
    fn should_stop(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }
}

/// Adapts a closure into a [`StopSignal`].
pub struct StopWhen<F>(pub F);

impl<F: Fn() -> bool> StopSignal for StopWhen<F> {
    fn should_stop(&self) -> bool {
        (self.0)()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub best_ever_fitness: f64,
    pub best_short: usize,
    pub best_long: usize,
    pub evaluations: usize,
    pub cache_hits: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct OptimizationOutcome {
    pub best: Chromosome,
    pub criterion: Criterion,
    pub generations_completed: usize,
    pub interrupted: bool,
    pub evaluations: usize,
    pub cache_hits: usize,
    pub history: Vec<GenerationSummary>,
}

impl OptimizationOutcome {
    pub fn best_fitness(&self) -> f64 {
        self.criterion.fitness_of(&self.best)
    }
}

pub struct GeneticOptimizer<'a, E: ?Sized, R> {
    config: GaConfig,
    evaluator: &'a E,
    rng: R,
    population: Vec<Chromosome>,
    best: Chromosome,
    cache: HashMap<(usize, usize), f64>,
    evaluations: usize,
    cache_hits: usize,
    generation: usize,
}

impl<'a, E, R> GeneticOptimizer<'a, E, R>
where
    E: FitnessEvaluator + ?Sized,
    R: Rng,
{
    pub fn new(config: GaConfig, evaluator: &'a E, rng: R) -> Self {
        let config = config.sanitized();
        let bounds = config.bounds;
        let mut ga = Self {
            config,
            evaluator,
            rng,
            population: Vec::new(),
            best: Chromosome::new(bounds),
            cache: HashMap::new(),
            evaluations: 0,
            cache_hits: 0,
            generation: 0,
        };
        ga.initialize();
        ga
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    /// Best chromosome evaluated so far.
    pub fn best(&self) -> &Chromosome {
        &self.best
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn initialize(&mut self) {
        let bounds = self.config.bounds;
        let mut population = Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            let mut c = Chromosome::new(bounds);
            c.init_random(&mut self.rng);
            population.push(c);
        }
        self.best = population[0];
        self.best.set_fitness(self.config.criterion.worst());
        self.population = population;
        self.generation = 0;
    }

    /// Scores every chromosome and refreshes the best-ever record.
    pub fn evaluate(&mut self) -> GenerationSummary {
        let criterion = self.config.criterion;
        let mut gen_best: Option<usize> = None;

        for idx in 0..self.population.len() {
            let key = self.population[idx].periods();
            let fitness = match self.cache.get(&key) {
                Some(f) => {
                    self.cache_hits += 1;
                    *f
                }
                None => {
                    let raw = self.evaluator.fitness(key.0, key.1, criterion);
                    let f = criterion.finite_or_worst(raw);
                    self.evaluations += 1;
                    if self.config.cache_fitness {
                        self.cache.insert(key, f);
                    }
                    f
                }
            };
            self.population[idx].set_fitness(fitness);

            if gen_best.is_none_or(|b| {
                criterion.is_better(fitness, criterion.fitness_of(&self.population[b]))
            }) {
                gen_best = Some(idx);
            }
            if criterion.is_better(fitness, criterion.fitness_of(&self.best)) {
                self.best = self.population[idx];
            }
        }

        let scored: Vec<f64> = self
            .population
            .iter()
            .map(|c| criterion.fitness_of(c))
            .filter(|f| *f != criterion.worst())
            .collect();
        let mean_fitness = if scored.is_empty() {
            criterion.worst()
        } else {
            scored.iter().sum::<f64>() / scored.len() as f64
        };
        let leader = gen_best.map(|i| self.population[i]).unwrap_or(self.best);

        GenerationSummary {
            generation: self.generation,
            best_fitness: criterion.fitness_of(&leader),
            mean_fitness,
            best_ever_fitness: criterion.fitness_of(&self.best),
            best_short: self.best.short_period(),
            best_long: self.best.long_period(),
            evaluations: self.evaluations,
            cache_hits: self.cache_hits,
        }
    }

    /// Tournament over `k` distinct members; ties go to the earlier draw.
    pub fn tournament_select(&mut self) -> usize {
        let criterion = self.config.criterion;
        let n = self.population.len();
        let k = self.config.tournament_size.clamp(1, n);
        let fitness = |i: usize| criterion.fitness_of(&self.population[i]);

        let pick = |candidates: &mut dyn Iterator<Item = usize>| {
            let mut best: Option<usize> = None;
            for i in candidates {
                if best.is_none_or(|b| criterion.is_better(fitness(i), fitness(b))) {
                    best = Some(i);
                }
            }
            best.unwrap_or(0)
        };

        if k >= n {
            pick(&mut (0..n))
        } else {
            let drawn = index::sample(&mut self.rng, n, k);
            pick(&mut drawn.into_iter())
        }
    }

    fn select_parents(&mut self) -> (usize, usize) {
        let first = self.tournament_select();
        let mut second = self.tournament_select();
        if self.population.len() > 1 {
            let mut retries = 0;
            while second == first && retries < MAX_PARENT_RETRIES {
                second = self.tournament_select();
                retries += 1;
            }
            if second == first {
                trace!("parent retries exhausted, pairing index {first} with itself");
            }
        }
        (first, second)
    }

    /// Two children from two parents: long genes swapped with probability
    /// `crossover_rate`, plain copies otherwise. Fitness is cleared.
    pub fn breed(&mut self, a: &Chromosome, b: &Chromosome) -> (Chromosome, Chromosome) {
        let (mut child_a, mut child_b) = if self.rng.random_bool(self.config.crossover_rate) {
            Chromosome::crossover(a, b)
        } else {
            (*a, *b)
        };
        child_a.reset_fitness();
        child_b.reset_fitness();
        (child_a, child_b)
    }

    /// Builds and installs the next generation.
    pub fn evolve(&mut self) {
        let n = self.population.len();
        let mut next = Vec::with_capacity(n);
        while next.len() < n {
            let (a, b) = self.select_parents();
            let (pa, pb) = (self.population[a], self.population[b]);
            let (child_a, child_b) = self.breed(&pa, &pb);
            next.push(child_a);
            next.push(child_b);
        }
        next.truncate(n);

        let rate = self.config.mutation_rate;
        for c in &mut next {
            c.mutate(rate, &mut self.rng);
            c.reset_fitness();
        }
        self.population = next;
        self.generation += 1;
    }

    /// Full run. A stop request between generations ends it early with the
    /// best chromosome found so far.
    ///
    /// The first run starts from the population built by [`Self::new`]; a
    /// later run draws a fresh one.
    pub fn run<S: StopSignal + ?Sized>(&mut self, stop: &S) -> OptimizationOutcome {
        let total = self.config.generations;
        info!(
            "optimizing {} with population {} over {} generations, bounds {:?}",
            self.config.criterion, self.config.population_size, total, self.config.bounds
        );

        if self.generation > 0 {
            self.initialize();
        }
        let mut history = vec![self.evaluate()];
        log_summary(&history[0], total);

        let mut interrupted = false;
        for _ in 0..total {
            if stop.should_stop() {
                info!(
                    "stop requested after generation {}, keeping best so far",
                    self.generation
                );
                interrupted = true;
                break;
            }
            self.evolve();
            let summary = self.evaluate();
            log_summary(&summary, total);
            history.push(summary);

            if self.config.generation_pause_ms > 0 {
                std::thread::sleep(Duration::from_millis(self.config.generation_pause_ms));
            }
        }

        let criterion = self.config.criterion;
        info!(
            "best ({}, {}) {} = {:.6} after {} generations, {} evaluations",
            self.best.short_period(),
            self.best.long_period(),
            criterion,
            criterion.fitness_of(&self.best),
            self.generation,
            self.evaluations
        );

        OptimizationOutcome {
            best: self.best,
            criterion,
            generations_completed: self.generation,
            interrupted,
            evaluations: self.evaluations,
            cache_hits: self.cache_hits,
            history,
        }
    }
}

fn log_summary(s: &GenerationSummary, total: usize) {
    info!(
        "[gen {}/{}] best={:.6} mean={:.6} best_ever=({}, {}) {:.6} evals={} cache_hits={}",
        s.generation,
        total,
        s.best_fitness,
        s.mean_fitness,
        s.best_short,
        s.best_long,
        s.best_ever_fitness,
        s.evaluations,
        s.cache_hits
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn peak_at_20_60(short: usize, long: usize, _: Criterion) -> f64 {
        -((short as f64 - 20.0).powi(2) + (long as f64 - 60.0).powi(2))
    }

    fn config(population_size: usize, generations: usize) -> GaConfig {
        GaConfig {
            population_size,
            generations,
            ..GaConfig::default()
        }
    }

    #[test]
    fn sanitize_falls_back_to_safe_values() {
        let c = GaConfig {
            population_size: 1,
            tournament_size: 0,
            crossover_rate: 1.5,
            mutation_rate: f64::NAN,
            bounds: PeriodBounds::new(0, 2, 5),
            ..GaConfig::default()
        }
        .sanitized();
        assert_eq!(c.population_size, 2);
        assert_eq!(c.tournament_size, 1);
        assert_eq!(c.crossover_rate, 1.0);
        assert_eq!(c.mutation_rate, 0.1);
        assert_eq!(c.bounds, PeriodBounds::new(1, 6, 5));

        let odd = GaConfig {
            population_size: 7,
            ..GaConfig::default()
        }
        .sanitized();
        assert_eq!(odd.population_size, 8);
        assert_eq!(odd.tournament_size, 5);

        let huge = GaConfig {
            population_size: usize::MAX,
            bounds: PeriodBounds::new(5, 200, usize::MAX),
            ..GaConfig::default()
        }
        .sanitized();
        assert_eq!(huge.population_size, usize::MAX - 1);
        assert!(huge.bounds.is_feasible());
    }

    #[test]
    fn deadline_out_of_clock_range_never_fires() {
        assert!(!Deadline::after(Duration::MAX).should_stop());
        assert!(!Deadline::after(Duration::from_secs(u64::MAX)).should_stop());
        assert!(Deadline::after(Duration::ZERO).should_stop());
    }

    #[test]
    fn run_starts_from_the_population_built_by_new() {
        let eval = peak_at_20_60;
        let mut ga = GeneticOptimizer::new(config(10, 5), &eval, StdRng::seed_from_u64(13));
        let initial: Vec<(usize, usize)> = ga.population().iter().map(|c| c.periods()).collect();
        let outcome = ga.run(&AtomicBool::new(true));
        let evaluated: Vec<(usize, usize)> = ga.population().iter().map(|c| c.periods()).collect();
        assert_eq!(evaluated, initial);
        assert_eq!(outcome.generations_completed, 0);
        assert!(ga.population().iter().all(|c| c.fitness().is_some()));
    }

    #[test]
    fn second_parent_is_redrawn_away_from_the_first() {
        let eval = |s: usize, l: usize, _: Criterion| (s * 1000 + l) as f64;
        let cfg = GaConfig {
            tournament_size: 3,
            ..config(20, 1)
        };
        let mut ga = GeneticOptimizer::new(cfg, &eval, StdRng::seed_from_u64(17));
        ga.evaluate();

        let draws = 500;
        let single_draw_repeats = (0..draws)
            .filter(|_| ga.tournament_select() == ga.tournament_select())
            .count();
        let parent_repeats = (0..draws)
            .filter(|_| {
                let (a, b) = ga.select_parents();
                a == b
            })
            .count();
        assert!(single_draw_repeats > 10, "{single_draw_repeats}");
        assert_eq!(parent_repeats, 0);
    }

    #[test]
    fn full_tournament_pairs_the_best_with_itself() {
        let eval = |s: usize, l: usize, _: Criterion| (s * 1000 + l) as f64;
        let cfg = GaConfig {
            tournament_size: 8,
            ..config(8, 1)
        };
        let mut ga = GeneticOptimizer::new(cfg, &eval, StdRng::seed_from_u64(19));
        ga.evaluate();
        let best = ga.tournament_select();
        for _ in 0..5 {
            assert_eq!(ga.select_parents(), (best, best));
        }
    }

    #[test]
    fn initial_population_is_valid_and_best_is_worst() {
        let eval = peak_at_20_60;
        let ga = GeneticOptimizer::new(config(10, 1), &eval, StdRng::seed_from_u64(1));
        assert_eq!(ga.population().len(), 10);
        assert!(ga.population().iter().all(|c| c.is_valid()));
        assert_eq!(ga.best().fitness(), Some(f64::MIN));
    }

    #[test]
    fn full_tournament_returns_population_best() {
        for criterion in [Criterion::NetProfit, Criterion::MaxDrawdown] {
            let eval = |s: usize, l: usize, _: Criterion| (s * 1000 + l) as f64;
            let cfg = GaConfig {
                tournament_size: 50,
                criterion,
                ..config(12, 1)
            };
            let mut ga = GeneticOptimizer::new(cfg, &eval, StdRng::seed_from_u64(3));
            ga.evaluate();
            let expected = (0..12)
                .reduce(|b, i| {
                    let (fi, fb) = (
                        criterion.fitness_of(&ga.population[i]),
                        criterion.fitness_of(&ga.population[b]),
                    );
                    if criterion.is_better(fi, fb) { i } else { b }
                })
                .unwrap();
            for _ in 0..20 {
                let pick = ga.tournament_select();
                assert_eq!(
                    criterion.fitness_of(&ga.population[pick]),
                    criterion.fitness_of(&ga.population[expected])
                );
            }
        }
    }

    #[test]
    fn small_tournament_favours_fitter_members() {
        let eval = |s: usize, _: usize, _: Criterion| s as f64;
        let cfg = GaConfig {
            tournament_size: 3,
            ..config(20, 1)
        };
        let mut ga = GeneticOptimizer::new(cfg, &eval, StdRng::seed_from_u64(8));
        ga.evaluate();
        let mean: f64 = ga.population.iter().map(|c| c.short_period() as f64).sum::<f64>() / 20.0;
        let picked: f64 = (0..200)
            .map(|_| {
                let i = ga.tournament_select();
                ga.population[i].short_period() as f64
            })
            .sum::<f64>()
            / 200.0;
        assert!(picked > mean);
    }

    #[test]
    fn breed_with_full_crossover_swaps_long_genes() {
        let eval = peak_at_20_60;
        let cfg = GaConfig {
            crossover_rate: 1.0,
            ..config(4, 1)
        };
        let mut ga = GeneticOptimizer::new(cfg, &eval, StdRng::seed_from_u64(2));
        let bounds = ga.config().bounds;
        let a = Chromosome::with_periods(bounds, 10, 90);
        let b = Chromosome::with_periods(bounds, 40, 150);
        for _ in 0..10 {
            let (ca, cb) = ga.breed(&a, &b);
            assert_eq!(ca.periods(), (10, 150));
            assert_eq!(cb.periods(), (40, 90));
        }
    }

    #[test]
    fn breed_without_crossover_copies_parents() {
        let eval = peak_at_20_60;
        let cfg = GaConfig {
            crossover_rate: 0.0,
            ..config(4, 1)
        };
        let mut ga = GeneticOptimizer::new(cfg, &eval, StdRng::seed_from_u64(2));
        let bounds = ga.config().bounds;
        let mut a = Chromosome::with_periods(bounds, 10, 90);
        a.set_fitness(4.0);
        let b = Chromosome::with_periods(bounds, 40, 150);
        let (ca, cb) = ga.breed(&a, &b);
        assert_eq!(ca.periods(), a.periods());
        assert_eq!(cb.periods(), b.periods());
        assert_eq!(ca.fitness(), None);
    }

    #[test]
    fn evolve_replaces_population_with_unevaluated_valid_children() {
        let eval = peak_at_20_60;
        let cfg = GaConfig {
            mutation_rate: 0.5,
            ..config(10, 1)
        };
        let mut ga = GeneticOptimizer::new(cfg, &eval, StdRng::seed_from_u64(4));
        ga.evaluate();
        ga.evolve();
        assert_eq!(ga.generation(), 1);
        assert_eq!(ga.population().len(), 10);
        assert!(ga.population().iter().all(|c| c.is_valid() && c.fitness().is_none()));
    }

    #[test]
    fn evolve_without_variation_only_reuses_parent_pairs() {
        let eval = peak_at_20_60;
        let cfg = GaConfig {
            crossover_rate: 0.0,
            mutation_rate: 0.0,
            ..config(10, 1)
        };
        let mut ga = GeneticOptimizer::new(cfg, &eval, StdRng::seed_from_u64(6));
        ga.evaluate();
        let parents: Vec<(usize, usize)> = ga.population().iter().map(|c| c.periods()).collect();
        ga.evolve();
        assert!(ga.population().iter().all(|c| parents.contains(&c.periods())));
    }

    #[test]
    fn best_ever_is_monotone() {
        for criterion in [Criterion::NetProfit, Criterion::MaxDrawdown] {
            let eval = |s: usize, l: usize, c: Criterion| {
                let v = ((s * 7919 + l * 104_729) % 1000) as f64;
                if c == Criterion::MaxDrawdown { v } else { -v }
            };
            let cfg = GaConfig {
                criterion,
                ..config(10, 15)
            };
            let mut ga = GeneticOptimizer::new(cfg, &eval, StdRng::seed_from_u64(12));
            let outcome = ga.run(&NeverStop);
            assert_eq!(outcome.history.len(), 16);
            for w in outcome.history.windows(2) {
                assert!(!criterion.is_better(w[0].best_ever_fitness, w[1].best_ever_fitness));
            }
            assert_eq!(
                outcome.best_fitness(),
                outcome.history.last().unwrap().best_ever_fitness
            );
        }
    }

    #[test]
    fn converges_towards_the_optimum() {
        let eval = peak_at_20_60;
        let cfg = GaConfig {
            bounds: PeriodBounds::new(5, 100, 5),
            ..config(30, 40)
        };
        let mut ga = GeneticOptimizer::new(cfg, &eval, StdRng::seed_from_u64(21));
        let outcome = ga.run(&NeverStop);
        let (s, l) = outcome.best.periods();
        assert!(s.abs_diff(20) <= 8 && l.abs_diff(60) <= 8, "({s}, {l})");
        assert!(!outcome.interrupted);
        assert_eq!(outcome.generations_completed, 40);
    }

    #[test]
    fn stop_signal_ends_run_between_generations() {
        let eval = peak_at_20_60;
        let polls = Cell::new(0);
        let stop = StopWhen(|| {
            polls.set(polls.get() + 1);
            polls.get() > 3
        });
        let mut ga = GeneticOptimizer::new(config(10, 50), &eval, StdRng::seed_from_u64(1));
        let outcome = ga.run(&stop);
        assert!(outcome.interrupted);
        assert_eq!(outcome.generations_completed, 3);
        assert_eq!(outcome.history.len(), 4);
        assert!(outcome.best.is_valid());
        assert!(outcome.best_fitness() > f64::MIN);
    }

    #[test]
    fn atomic_flag_stops_before_first_evolution() {
        let eval = peak_at_20_60;
        let flag = AtomicBool::new(true);
        let mut ga = GeneticOptimizer::new(config(4, 10), &eval, StdRng::seed_from_u64(1));
        let outcome = ga.run(&flag);
        assert!(outcome.interrupted);
        assert_eq!(outcome.generations_completed, 0);
    }

    #[test]
    fn cache_skips_repeat_evaluations() {
        let calls = Cell::new(0_usize);
        let eval = |s: usize, l: usize, c: Criterion| {
            calls.set(calls.get() + 1);
            peak_at_20_60(s, l, c)
        };
        let cfg = GaConfig {
            bounds: PeriodBounds::new(5, 12, 5),
            ..config(10, 5)
        };
        let mut ga = GeneticOptimizer::new(cfg, &eval, StdRng::seed_from_u64(2));
        let outcome = ga.run(&NeverStop);
        assert_eq!(outcome.evaluations, calls.get());
        assert!(calls.get() <= 6);
        assert_eq!(outcome.evaluations + outcome.cache_hits, 60);
    }

    #[test]
    fn degraded_candidates_never_become_best() {
        let eval = |s: usize, _: usize, _: Criterion| if s % 2 == 0 { f64::NAN } else { s as f64 };
        let mut ga = GeneticOptimizer::new(config(10, 5), &eval, StdRng::seed_from_u64(9));
        let outcome = ga.run(&NeverStop);
        assert_eq!(outcome.best.short_period() % 2, 1);
        assert!(outcome.best_fitness().is_finite());
    }
}
