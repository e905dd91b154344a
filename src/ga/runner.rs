//! Evolution loop.
//!
//! A single control thread drives the generational cycle: elitism,
//! tournament selection, crossover, mutation. Every random draw happens
//! on the control thread before offspring are handed to the worker pool,
//! so the evolved sequence is bit-identical for any worker count — only
//! decoding (the expensive part) runs in parallel, and results are
//! reassembled in generation order.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::ga::chromosome::PriorityList;
use crate::ga::operators::{pox_crossover, swap_mutation};
use crate::models::{ProjectIndex, Schedule, Time};
use crate::scheduler::{decode, Ssgs};

/// A set of individuals evolved together.
pub type Population = Vec<PriorityList>;

/// Evolution parameters.
///
/// # Example
/// ```
/// use rcpsp_solver::GaConfig;
///
/// let config = GaConfig::default()
///     .with_generations(100)
///     .with_population_size(80)
///     .with_seed(42)
///     .with_workers(4);
/// assert_eq!(config.tournament_k, 3);
/// assert_eq!(config.elitism, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaConfig {
    /// Maximum number of generations to run.
    pub generations: u32,
    /// Individuals per generation.
    pub population_size: usize,
    /// Tournament size for parent selection.
    pub tournament_k: usize,
    /// Individuals carried over unchanged each generation.
    pub elitism: usize,
    /// Probability of crossover per parent pair (else the parents are
    /// cloned).
    pub crossover_rate: f64,
    /// Probability of mutation per offspring.
    pub mutation_rate: f64,
    /// Resample attempts before a mutation gives up.
    pub mutation_swap_budget: u32,
    /// Stop after this many consecutive generations without improvement
    /// of the best makespan (`None` = run the full budget).
    pub no_improve_stop: Option<u32>,
    /// PRNG seed; fixes the entire evolution together with the config.
    pub seed: u64,
    /// Worker threads for fitness evaluation (1 = in-thread).
    pub workers: usize,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            generations: 200,
            population_size: 50,
            tournament_k: 3,
            elitism: 1,
            crossover_rate: 0.8,
            mutation_rate: 0.15,
            mutation_swap_budget: 8,
            no_improve_stop: None,
            seed: 0,
            workers: 1,
        }
    }
}

impl GaConfig {
    /// Sets the generation budget.
    pub fn with_generations(mut self, generations: u32) -> Self {
        self.generations = generations;
        self
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, population_size: usize) -> Self {
        self.population_size = population_size;
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_k(mut self, tournament_k: usize) -> Self {
        self.tournament_k = tournament_k;
        self
    }

    /// Sets the number of elites carried over per generation.
    pub fn with_elitism(mut self, elitism: usize) -> Self {
        self.elitism = elitism;
        self
    }

    /// Sets the crossover probability (clamped to `[0, 1]`).
    pub fn with_crossover_rate(mut self, crossover_rate: f64) -> Self {
        self.crossover_rate = crossover_rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the per-individual mutation probability (clamped to `[0, 1]`).
    pub fn with_mutation_rate(mut self, mutation_rate: f64) -> Self {
        self.mutation_rate = mutation_rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation resample budget.
    pub fn with_mutation_swap_budget(mut self, budget: u32) -> Self {
        self.mutation_swap_budget = budget;
        self
    }

    /// Stops early after `generations` without improvement.
    pub fn with_no_improve_stop(mut self, generations: u32) -> Self {
        self.no_improve_stop = Some(generations);
        self
    }

    /// Sets the PRNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the evaluation worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Why the evolution loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The generation budget was exhausted.
    MaxGenerations,
    /// The best makespan stagnated for the configured window.
    NoImprovement,
    /// The caller signalled cancellation; the result holds the best
    /// schedule found so far.
    Cancelled,
}

/// Outcome of an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Best priority list ever seen.
    pub best: PriorityList,
    /// Schedule decoded from the best list.
    pub best_schedule: Schedule,
    /// Makespan of the best schedule.
    pub best_makespan: Time,
    /// Best makespan in the population after each generation.
    pub history: Vec<Time>,
    /// Generation steps actually executed.
    pub generations_run: u32,
    /// Why the loop stopped.
    pub stopped_reason: StopReason,
}

/// Samples an initial population of independent admissible permutations.
///
/// Deterministic for a given seed. Individuals are unevaluated; `evolve`
/// scores them before the first generation.
pub fn initial_population(index: &ProjectIndex, size: usize, seed: u64) -> Population {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..size)
        .map(|_| PriorityList::random(index, &mut rng))
        .collect()
}

/// Evolves a population and returns the best schedule found.
///
/// `cancel` is checked between generations; on cancellation the result
/// carries the best-so-far schedule with
/// [`StopReason::Cancelled`]. Reproducible: a fixed seed and config give
/// a bit-identical result for any `workers` value.
pub fn evolve(
    index: &ProjectIndex,
    config: &GaConfig,
    mut population: Population,
    cancel: Option<&AtomicBool>,
) -> EvolutionResult {
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let pool = build_pool(config.workers);
    let population_size = config.population_size.max(1);

    if population.is_empty() {
        population.push(PriorityList::baseline(index));
    }
    evaluate(index, pool.as_ref(), &mut population);

    let mut best = best_of(&population).clone();
    let mut best_schedule = decode(index, &best);
    log::debug!(
        "initial population of {}: best makespan {}",
        population.len(),
        best.makespan
    );

    let mut history = Vec::with_capacity(config.generations as usize);
    let mut generations_run = 0;
    let mut stopped_reason = StopReason::MaxGenerations;
    let mut stagnant = 0u32;

    for generation in 0..config.generations {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            stopped_reason = StopReason::Cancelled;
            log::debug!("cancelled after {generations_run} generations");
            break;
        }

        // Elites survive unchanged; ties broken by position for stability.
        let elite_count = config.elitism.min(population_size).min(population.len());
        let mut ranked: Vec<usize> = (0..population.len()).collect();
        ranked.sort_by_key(|&i| (population[i].makespan, i));
        let elites: Vec<PriorityList> = ranked[..elite_count]
            .iter()
            .map(|&i| population[i].clone())
            .collect();

        // All operator randomness is drawn here, on the control thread,
        // before any parallel work is dispatched.
        let target = population_size - elite_count;
        let mut offspring: Vec<PriorityList> = Vec::with_capacity(target + 1);
        while offspring.len() < target {
            let p1 = tournament(&population, config.tournament_k, &mut rng);
            let p2 = tournament(&population, config.tournament_k, &mut rng);
            let (mut c1, mut c2) = if rng.random_bool(config.crossover_rate.clamp(0.0, 1.0)) {
                pox_crossover(&population[p1], &population[p2], &mut rng)
            } else {
                (population[p1].clone(), population[p2].clone())
            };
            if rng.random_bool(config.mutation_rate.clamp(0.0, 1.0)) {
                swap_mutation(&mut c1, index, config.mutation_swap_budget, &mut rng);
            }
            if rng.random_bool(config.mutation_rate.clamp(0.0, 1.0)) {
                swap_mutation(&mut c2, index, config.mutation_swap_budget, &mut rng);
            }
            offspring.push(c1);
            if offspring.len() < target {
                offspring.push(c2);
            }
        }

        evaluate(index, pool.as_ref(), &mut offspring);

        let mut next = elites;
        next.extend(offspring);
        population = next;
        generations_run = generation + 1;

        let generation_best = best_of(&population);
        history.push(generation_best.makespan);
        if generation_best.makespan < best.makespan {
            best = generation_best.clone();
            best_schedule = decode(index, &best);
            stagnant = 0;
            log::debug!(
                "generation {generation}: improved best makespan to {}",
                best.makespan
            );
        } else {
            stagnant += 1;
        }
        log::trace!(
            "generation {generation}: population best {}, best ever {}",
            generation_best.makespan,
            best.makespan
        );

        if let Some(window) = config.no_improve_stop {
            if stagnant >= window {
                stopped_reason = StopReason::NoImprovement;
                log::debug!("stagnant for {stagnant} generations, stopping");
                break;
            }
        }
    }

    let best_makespan = best.makespan;
    EvolutionResult {
        best,
        best_schedule,
        best_makespan,
        history,
        generations_run,
        stopped_reason,
    }
}

/// Best individual by makespan; ties keep the earlier position.
fn best_of(population: &[PriorityList]) -> &PriorityList {
    let mut best = &population[0];
    for list in &population[1..] {
        if list.makespan < best.makespan {
            best = list;
        }
    }
    best
}

/// Tournament selection: `k` uniform draws with replacement, lowest
/// makespan wins, ties go to the earlier index.
fn tournament<R: Rng>(population: &[PriorityList], k: usize, rng: &mut R) -> usize {
    let mut winner = rng.random_range(0..population.len());
    for _ in 1..k.max(1) {
        let challenger = rng.random_range(0..population.len());
        if (population[challenger].makespan, challenger) < (population[winner].makespan, winner) {
            winner = challenger;
        }
    }
    winner
}

/// Scores every unevaluated individual in place.
///
/// Each worker keeps its own decoder (private resource profile); the
/// batch order is untouched, so results are independent of worker
/// interleaving. Already-evaluated clones are skipped — `decode` is pure,
/// so their cached makespan is still exact.
fn evaluate(index: &ProjectIndex, pool: Option<&ThreadPool>, batch: &mut [PriorityList]) {
    match pool {
        Some(pool) => pool.install(|| {
            batch.par_iter_mut().for_each_init(
                || Ssgs::new(index),
                |ssgs, list| {
                    if !list.is_evaluated() {
                        list.makespan = ssgs.schedule(&list.order).makespan();
                    }
                },
            );
        }),
        None => {
            let mut ssgs = Ssgs::new(index);
            for list in batch.iter_mut() {
                if !list.is_evaluated() {
                    list.makespan = ssgs.schedule(&list.order).makespan();
                }
            }
        }
    }
}

fn build_pool(workers: usize) -> Option<ThreadPool> {
    if workers <= 1 {
        return None;
    }
    match ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => Some(pool),
        Err(err) => {
            log::warn!("worker pool unavailable ({err}), evaluating in-thread");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{verify, RawProject};

    fn contention_index() -> ProjectIndex {
        // 0 -> {1, 2, 3} -> 4 on capacity 2; the optimum packs 1 and 3
        // beside each other for makespan 4.
        let raw = RawProject::new(
            vec![0, 2, 2, 2, 0],
            vec![vec![0], vec![1], vec![2], vec![1], vec![0]],
            vec![2],
            vec![(0, 1), (0, 2), (0, 3), (1, 4), (2, 4), (3, 4)],
        );
        ProjectIndex::build(&raw).unwrap()
    }

    fn ladder_index() -> ProjectIndex {
        // Three chains of two tasks each competing for capacity 2.
        let raw = RawProject::new(
            vec![0, 3, 2, 4, 1, 2, 3, 0],
            vec![
                vec![0],
                vec![1],
                vec![1],
                vec![2],
                vec![1],
                vec![1],
                vec![2],
                vec![0],
            ],
            vec![2],
            vec![
                (0, 1),
                (0, 3),
                (0, 5),
                (1, 2),
                (3, 4),
                (5, 6),
                (2, 7),
                (4, 7),
                (6, 7),
            ],
        );
        ProjectIndex::build(&raw).unwrap()
    }

    #[test]
    fn test_initial_population_is_deterministic_and_admissible() {
        let index = contention_index();
        let a = initial_population(&index, 20, 42);
        let b = initial_population(&index, 20, 42);
        assert_eq!(a, b);
        assert!(a.iter().all(|list| list.is_admissible(&index)));
    }

    #[test]
    fn test_evolve_finds_contention_optimum() {
        let index = contention_index();
        let config = GaConfig::default()
            .with_generations(40)
            .with_population_size(30)
            .with_seed(42);
        let population = initial_population(&index, 30, 42);
        let result = evolve(&index, &config, population, None);

        assert_eq!(result.best_makespan, 4);
        assert_eq!(result.best_schedule.makespan(), 4);
        assert!(result.best.is_admissible(&index));
        assert!(verify(&index, &result.best_schedule).is_empty());
        assert_eq!(result.stopped_reason, StopReason::MaxGenerations);
        assert_eq!(result.generations_run, 40);
        assert_eq!(result.history.len(), 40);
    }

    #[test]
    fn test_history_is_monotone_with_elitism() {
        let index = ladder_index();
        let config = GaConfig::default()
            .with_generations(30)
            .with_population_size(20)
            .with_seed(7);
        let population = initial_population(&index, 20, 7);
        let result = evolve(&index, &config, population, None);

        for window in result.history.windows(2) {
            assert!(window[1] <= window[0]);
        }
        assert_eq!(result.best_makespan, *result.history.last().unwrap());
    }

    #[test]
    fn test_optimized_never_worse_than_baseline() {
        let index = ladder_index();
        let baseline = decode(&index, &PriorityList::baseline(&index));
        let config = GaConfig::default()
            .with_generations(50)
            .with_population_size(30)
            .with_seed(3);
        let population = initial_population(&index, 30, 3);
        let result = evolve(&index, &config, population, None);

        assert!(result.best_makespan <= baseline.makespan());
    }

    #[test]
    fn test_same_seed_same_result() {
        let index = ladder_index();
        let config = GaConfig::default()
            .with_generations(25)
            .with_population_size(16)
            .with_seed(99);

        let first = evolve(&index, &config, initial_population(&index, 16, 99), None);
        let second = evolve(&index, &config, initial_population(&index, 16, 99), None);

        assert_eq!(first.best.order, second.best.order);
        assert_eq!(first.history, second.history);
        assert_eq!(first.best_makespan, second.best_makespan);
    }

    #[test]
    fn test_worker_count_does_not_change_result() {
        let index = ladder_index();
        let serial_config = GaConfig::default()
            .with_generations(25)
            .with_population_size(16)
            .with_seed(11)
            .with_workers(1);
        let parallel_config = serial_config.clone().with_workers(4);

        let serial = evolve(
            &index,
            &serial_config,
            initial_population(&index, 16, 11),
            None,
        );
        let parallel = evolve(
            &index,
            &parallel_config,
            initial_population(&index, 16, 11),
            None,
        );

        assert_eq!(serial.best.order, parallel.best.order);
        assert_eq!(serial.history, parallel.history);
    }

    #[test]
    fn test_cancellation_returns_best_so_far() {
        let index = ladder_index();
        let cancel = AtomicBool::new(true);
        let config = GaConfig::default()
            .with_generations(100)
            .with_population_size(12)
            .with_seed(5);
        let population = initial_population(&index, 12, 5);
        let result = evolve(&index, &config, population, Some(&cancel));

        // Pre-set flag: the loop stops before the first generation but
        // still reports the evaluated initial best.
        assert_eq!(result.stopped_reason, StopReason::Cancelled);
        assert_eq!(result.generations_run, 0);
        assert!(result.history.is_empty());
        assert!(result.best.is_evaluated());
        assert!(verify(&index, &result.best_schedule).is_empty());
    }

    #[test]
    fn test_no_improve_stop() {
        let index = contention_index();
        let config = GaConfig::default()
            .with_generations(500)
            .with_population_size(20)
            .with_seed(42)
            .with_no_improve_stop(5);
        let population = initial_population(&index, 20, 42);
        let result = evolve(&index, &config, population, None);

        assert_eq!(result.stopped_reason, StopReason::NoImprovement);
        assert!(result.generations_run < 500);
    }

    #[test]
    fn test_population_size_is_held() {
        let index = ladder_index();
        let config = GaConfig::default()
            .with_generations(10)
            .with_population_size(17)
            .with_elitism(3)
            .with_seed(1);
        // Start from a smaller population; the loop grows it to size.
        let population = initial_population(&index, 5, 1);
        let result = evolve(&index, &config, population, None);
        assert!(result.best.is_admissible(&index));
        assert_eq!(result.generations_run, 10);
    }

    #[test]
    fn test_config_builder_clamps_rates() {
        let config = GaConfig::default()
            .with_crossover_rate(1.7)
            .with_mutation_rate(-0.2)
            .with_workers(0);
        assert_eq!(config.crossover_rate, 1.0);
        assert_eq!(config.mutation_rate, 0.0);
        assert_eq!(config.workers, 1);
    }
}
