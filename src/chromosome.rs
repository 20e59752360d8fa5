use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Random draws before `init_random` switches to a constructive draw.
pub const MAX_INIT_ATTEMPTS: usize = 100;

/// Period limits shared by every chromosome of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBounds {
    pub min_period: usize,
    pub max_period: usize,
    pub min_gap: usize,
}

impl Default for PeriodBounds {
    fn default() -> Self {
        Self {
            min_period: 5,
            max_period: 200,
            min_gap: 5,
        }
    }
}

impl PeriodBounds {
    pub fn new(min_period: usize, max_period: usize, min_gap: usize) -> Self {
        Self {
            min_period,
            max_period,
            min_gap,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.min_period >= 1
            && self
                .min_period
                .checked_add(self.min_gap)
                .is_some_and(|top| top <= self.max_period)
    }

    pub fn span(&self) -> usize {
        self.max_period.saturating_sub(self.min_period)
    }

    /// Smallest pair honoring the gap, even when it overshoots `max_period`.
    pub fn smallest_pair(&self) -> (usize, usize) {
        let short = self.min_period.max(1);
        (short, short.saturating_add(self.min_gap))
    }

    /// Repairs impossible limits, warning about every change.
    pub fn sanitized(self) -> Self {
        let mut out = self;
        if out.min_period == 0 {
            warn!("min_period 0 is not a valid averaging window, using 1");
            out.min_period = 1;
        }
        if out.min_period.checked_add(out.min_gap).is_none() {
            let gap = usize::MAX - out.min_period;
            warn!(
                "min_period {} + min_gap {} overflows, using min_gap {}",
                out.min_period, out.min_gap, gap
            );
            out.min_gap = gap;
        }
        let widened = out.min_period + out.min_gap;
        if out.max_period < widened {
            warn!(
                "max_period {} cannot hold min_period {} + min_gap {}, widening to {}",
                out.max_period, out.min_period, out.min_gap, widened
            );
            out.max_period = widened;
        }
        out
    }

    /// Mutation step: about 10% of the period range, never below 1.
    pub fn mutation_magnitude(&self) -> usize {
        ((self.span() as f64 * 0.1).round() as usize).max(1)
    }
}

/// One candidate `(short, long)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    short_period: usize,
    long_period: usize,
    fitness: Option<f64>,
    bounds: PeriodBounds,
}

impl Chromosome {
    pub fn new(bounds: PeriodBounds) -> Self {
        let (short_period, long_period) = bounds.smallest_pair();
        let mut c = Self {
            short_period,
            long_period,
            fitness: None,
            bounds,
        };
        c.validate();
        c
    }

    pub fn with_periods(bounds: PeriodBounds, short_period: usize, long_period: usize) -> Self {
        let mut c = Self {
            short_period,
            long_period,
            fitness: None,
            bounds,
        };
        c.validate();
        c
    }

    pub fn short_period(&self) -> usize {
        self.short_period
    }

    pub fn long_period(&self) -> usize {
        self.long_period
    }

    pub fn periods(&self) -> (usize, usize) {
        (self.short_period, self.long_period)
    }

    pub fn period_gap(&self) -> usize {
        self.long_period.saturating_sub(self.short_period)
    }

    /// `None` until the chromosome has been evaluated.
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn bounds(&self) -> &PeriodBounds {
        &self.bounds
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    pub fn reset_fitness(&mut self) {
        self.fitness = None;
    }

    pub fn is_valid(&self) -> bool {
        let b = &self.bounds;
        b.is_feasible()
            && self.short_period >= b.min_period
            && self.period_gap() >= b.min_gap
            && self.short_period <= self.long_period
            && self.long_period <= b.max_period
    }

    pub fn init_random<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let b = self.bounds;
        if !b.is_feasible() {
            self.degenerate();
            return;
        }

        for _ in 0..MAX_INIT_ATTEMPTS {
            let short = rng.random_range(b.min_period..=b.max_period);
            let long = rng.random_range(b.min_period..=b.max_period);
            if short.checked_add(b.min_gap).is_some_and(|s| s <= long) {
                self.short_period = short;
                self.long_period = long;
                return;
            }
        }

        let short = rng.random_range(b.min_period..=b.max_period - b.min_gap);
        let long = rng.random_range(short + b.min_gap..=b.max_period);
        self.short_period = short;
        self.long_period = long;
    }

    pub fn set_short_period(&mut self, value: usize) {
        let b = self.bounds;
        let upper = self
            .long_period
            .saturating_sub(b.min_gap)
            .max(b.min_period);
        self.short_period = value.clamp(b.min_period, upper);
        self.validate();
    }

    pub fn set_long_period(&mut self, value: usize) {
        let b = self.bounds;
        let lower = self.short_period.saturating_add(b.min_gap);
        self.long_period = value.clamp(lower, b.max_period.max(lower));
        self.validate();
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, rate: f64, rng: &mut R) {
        let rate = if rate.is_finite() {
            rate.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let magnitude = self.bounds.mutation_magnitude();

        if rng.random_bool(rate) {
            self.short_period = shift(self.short_period, magnitude, rng);
        }
        if rng.random_bool(rate) {
            self.long_period = shift(self.long_period, magnitude, rng);
        }
        self.validate();
    }

    /// Swaps the long genes of two parents: `(a.short, b.long)` and `(b.short, a.long)`.
    pub fn crossover(a: &Chromosome, b: &Chromosome) -> (Chromosome, Chromosome) {
        let mut child_a = *a;
        let mut child_b = *b;
        child_a.long_period = b.long_period;
        child_b.long_period = a.long_period;
        child_a.fitness = None;
        child_b.fitness = None;
        child_a.validate();
        child_b.validate();
        (child_a, child_b)
    }

    pub fn copy_from(&mut self, other: &Chromosome) {
        debug_assert_eq!(self.bounds, other.bounds);
        *self = *other;
    }

    /// Re-establishes `min <= short`, `short + gap <= long <= max`.
    pub fn validate(&mut self) {
        let b = self.bounds;
        if !b.is_feasible() {
            self.degenerate();
            return;
        }
        self.short_period = self
            .short_period
            .clamp(b.min_period, b.max_period - b.min_gap);
        self.long_period = self
            .long_period
            .clamp(self.short_period + b.min_gap, b.max_period);
    }

    fn degenerate(&mut self) {
        let (short, long) = self.bounds.smallest_pair();
        warn!(
            "infeasible period bounds {:?}, falling back to ({}, {})",
            self.bounds, short, long
        );
        self.short_period = short;
        self.long_period = long;
    }
}

fn shift<R: Rng + ?Sized>(value: usize, magnitude: usize, rng: &mut R) -> usize {
    let step = rng.random_range(1..=magnitude);
    if rng.random_bool(0.5) {
        value.saturating_add(step)
    } else {
        value.saturating_sub(step)
    }
}
