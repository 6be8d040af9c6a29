pub mod mutation;
pub mod runner;

pub use self::runner::{RunnerStatus, SequenceRunner};

use crate::config::EvolutionParams;
use crate::consts::{MEMBER_SEED_STRIDE, MIN_POPULATION_SIZE};
use crate::fitness::FitnessRecord;
use crate::genome::{Genome, Population, RateDomain};
use fastrand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct DeParams {
    pub master_beta: f32,
    pub beta_decay: f32,
    pub beta_floor: f32,
    pub cr_proba: f32,
    pub reinit_fraction: f32,
}

impl From<&EvolutionParams> for DeParams {
    fn from(p: &EvolutionParams) -> Self {
        Self {
            master_beta: p.master_beta,
            beta_decay: p.beta_decay,
            beta_floor: p.beta_floor,
            cr_proba: p.cr_proba,
            reinit_fraction: p.reinit_fraction,
        }
    }
}

impl Default for DeParams {
    fn default() -> Self {
        DeParams::from(&EvolutionParams::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberOutcome {
    Elite,
    Degenerate,
    Crossed { repaired: usize },
}

/// What one call to [`DifferentialEvolution::evolve`] did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub v_beta: f32,
    pub best_fitness: f32,
    pub fittest: Option<usize>,
    pub epoch_best: f32,
    pub crossed: usize,
    pub degenerate: usize,
    pub repaired: usize,
    pub diversity_reinit: usize,
    /// Every member was reinitialized because nobody was fit this epoch.
    pub bulk_reinit: bool,
}

pub struct DifferentialEvolution {
    params: DeParams,
    v_beta: f32,
    generation: usize,
    record: FitnessRecord,
    cache: Option<Vec<Genome>>,
    rng: Rng,
}

impl DifferentialEvolution {
    pub fn new(params: DeParams, population_size: usize, seed: Option<u64>) -> Self {
        let rng = if let Some(s) = seed {
            Rng::with_seed(s)
        } else {
            Rng::new()
        };

        Self {
            params,
            v_beta: params.master_beta,
            generation: 0,
            record: FitnessRecord::new(population_size),
            cache: None,
            rng,
        }
    }

    pub fn v_beta(&self) -> f32 {
        self.v_beta
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn record(&self) -> &FitnessRecord {
        &self.record
    }

    /// Post-update genomes from the last generation, used to seed the next one.
    pub fn cached_genomes(&self) -> Option<&[Genome]> {
        self.cache.as_deref()
    }

    /// Starts a new epoch: full mutation scale, no memory, no bests.
    pub fn reset_epoch(&mut self) {
        self.v_beta = self.params.master_beta;
        self.generation = 0;
        self.cache = None;
        self.record.reset_epoch();
    }

    /// Scores the finished generation and rewrites the population in place.
    ///
    /// The current fittest member is never touched. Every other member is
    /// rebuilt from a snapshot taken before any write, so member updates are
    /// independent and run in parallel.
    pub fn evolve(
        &mut self,
        population: &mut Population,
        scores: &[f32],
        seq_len: usize,
        domain: &RateDomain,
    ) -> GenerationSummary {
        let n = population.len();
        assert!(
            n >= MIN_POPULATION_SIZE,
            "differential evolution needs at least {} members, got {}",
            MIN_POPULATION_SIZE,
            n
        );

        let snapshot = population.genomes();
        self.record.record(scores, &snapshot);

        let mut summary = GenerationSummary {
            generation: self.generation,
            v_beta: self.v_beta,
            best_fitness: self.record.current_best,
            fittest: self.record.current_fittest,
            epoch_best: self.record.epoch_best,
            ..Default::default()
        };

        if !self.record.any_fit_this_epoch() {
            warn!(
                "No fit individual this epoch (gen {}). Reinitializing all {} genomes.",
                self.generation, n
            );
            population.reinitialize_all(seq_len, domain, &mut self.rng);
            self.cache = None;
            summary.bulk_reinit = true;
        } else {
            let elite = self.record.current_fittest;
            let v_beta = self.v_beta;
            let keep_parent = self.params.cr_proba;
            let base_seed = self.rng.u64(..);

            let outcomes: Vec<MemberOutcome> = population
                .agents
                .par_iter_mut()
                .enumerate()
                .map(|(i, agent)| {
                    if Some(i) == elite {
                        return MemberOutcome::Elite;
                    }
                    let mut rng =
                        Rng::with_seed(base_seed.wrapping_add((i as u64).wrapping_mul(MEMBER_SEED_STRIDE)));

                    let [a, b, c] = mutation::select_donors(&mut rng, n, i);
                    let mutant = mutation::differential_mutant(
                        &snapshot[a],
                        &snapshot[b],
                        &snapshot[c],
                        v_beta,
                        domain,
                    );

                    if mutant == snapshot[i] {
                        agent.reinitialize_with_random_values(seq_len, domain, &mut rng);
                        return MemberOutcome::Degenerate;
                    }

                    let trial =
                        mutation::binomial_crossover(&snapshot[i], &mutant, keep_parent, &mut rng);
                    let repaired = agent.set_values_with_clamping(&trial, seq_len, domain, &mut rng);
                    MemberOutcome::Crossed { repaired }
                })
                .collect();

            for outcome in outcomes {
                match outcome {
                    MemberOutcome::Elite => {}
                    MemberOutcome::Degenerate => summary.degenerate += 1,
                    MemberOutcome::Crossed { repaired } => {
                        summary.crossed += 1;
                        summary.repaired += repaired;
                    }
                }
            }

            let quota = (self.params.reinit_fraction * n as f32).floor() as usize;
            let targets = mutation::forced_diversity_targets(&self.record.scores, quota, elite);
            for &idx in &targets {
                population.agents[idx].reinitialize_with_random_values(
                    seq_len,
                    domain,
                    &mut self.rng,
                );
            }
            summary.diversity_reinit = targets.len();

            self.cache = Some(population.genomes());
        }

        self.v_beta = (self.v_beta - self.params.beta_decay).max(self.params.beta_floor);
        self.generation += 1;

        debug!(
            "Gen {:3} | best {:.2} (#{:?}) | epoch {:.2} | beta {:.3} | x{} deg{} div{}",
            summary.generation,
            summary.best_fitness,
            summary.fittest,
            summary.epoch_best,
            summary.v_beta,
            summary.crossed,
            summary.degenerate,
            summary.diversity_reinit
        );

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> RateDomain {
        RateDomain::new(-2.0, 2.0, 1.0)
    }

    #[test]
    fn test_beta_anneals_to_floor() {
        let mut de = DifferentialEvolution::new(DeParams::default(), 4, Some(1));
        let mut pop = Population::new(4, 2, 3);
        let mut rng = Rng::with_seed(2);
        pop.reinitialize_all(3, &domain(), &mut rng);

        let mut last = de.v_beta();
        for _ in 0..100 {
            de.evolve(&mut pop, &[1.0, 0.0, 0.0, 0.0], 3, &domain());
            assert!(de.v_beta() <= last);
            assert!(de.v_beta() >= 1.0 / 40.0);
            last = de.v_beta();
        }
        assert_eq!(de.v_beta(), 1.0 / 40.0);
    }

    #[test]
    fn test_reset_epoch_restores_master_beta() {
        let mut de = DifferentialEvolution::new(DeParams::default(), 4, Some(1));
        let mut pop = Population::new(4, 1, 2);
        de.evolve(&mut pop, &[2.0, 0.0, 0.0, 0.0], 2, &domain());
        assert!(de.v_beta() < 2.0);
        assert!(de.cached_genomes().is_some());

        de.reset_epoch();
        assert_eq!(de.v_beta(), 2.0);
        assert!(de.cached_genomes().is_none());
        assert_eq!(de.record().epoch_best, 0.0);
    }

    #[test]
    #[should_panic(expected = "at least 4 members")]
    fn test_small_population_fails_fast() {
        let mut de = DifferentialEvolution::new(DeParams::default(), 3, Some(1));
        let mut pop = Population::new(3, 1, 2);
        de.evolve(&mut pop, &[1.0, 0.0, 0.0], 2, &domain());
    }
}
