/// Generational genetic search over continuous variable bounds
use std::time::Duration;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::evaluator::Evaluator;
use super::results::{Provenance, ResultsTable, TrialRecord};
use super::variable::{Output, Variable};
use crate::error::StudyError;
use crate::session::FemSession;

/// Genetic operator parameters. Defaults follow the classic
/// blend-crossover / Gaussian-mutation setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaParams {
    pub population_size: usize,
    pub generations: usize,
    /// Crossover probability per adjacent pair.
    pub cxpb: f64,
    /// Mutation probability per individual.
    pub mutpb: f64,
    /// Per-gene mutation probability within a mutating individual.
    pub indpb: f64,
    /// Blend-crossover interpolation width.
    pub blend_alpha: f64,
    /// Gaussian mutation standard deviation.
    pub sigma: f64,
    /// RNG seed. Seeding is an explicit contract: the same seed and config
    /// reproduce an identical results table.
    pub seed: u64,
}

impl Default for GaParams {
    fn default() -> Self {
        Self {
            population_size: 8,
            generations: 5,
            cxpb: 0.7,
            mutpb: 0.3,
            indpb: 0.2,
            blend_alpha: 0.5,
            sigma: 1.0,
            seed: 0,
        }
    }
}

/// Fixed-generation, fixed-population minimization with truncation
/// selection. Every evaluated individual lands in the results table tagged
/// with its generation before selection runs, so the best trial is picked
/// over the full multi-generation history, not just the final elite.
pub struct GeneticExplorer {
    pub params: GaParams,
    pub max_retries: u32,
    pub settle_delay: Duration,
}

impl GeneticExplorer {
    pub fn run<S: FemSession>(
        &self,
        session: &mut S,
        variables: &[Variable],
        outputs: &[Output],
        table: &mut ResultsTable,
    ) -> Result<(), StudyError> {
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mutation = Normal::new(0.0, self.params.sigma)
            .map_err(|e| StudyError::DataShape(format!("invalid mutation sigma: {}", e)))?;

        // One uniformly-sampled gene per variable bound.
        let mut population: Vec<Vec<f64>> = (0..self.params.population_size)
            .map(|_| {
                variables
                    .iter()
                    .map(|v| rng.random_range(v.min..=v.max))
                    .collect()
            })
            .collect();

        let mut evaluator = Evaluator::new(session, outputs)
            .with_retry_bound(self.max_retries)
            .with_settle_delay(self.settle_delay);

        for generation in 1..=self.params.generations {
            self.vary(&mut population, &mutation, &mut rng);

            let mut fitnesses = Vec::with_capacity(population.len());
            for (member, individual) in population.iter().enumerate() {
                let reduced = evaluator.evaluate(variables, individual)?;
                fitnesses.push(reduced[0]);
                table.append(TrialRecord {
                    values: individual.clone(),
                    outputs: reduced,
                    provenance: Provenance::Generation { generation, member },
                })?;
            }

            let best = fitnesses
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min);
            info!(
                "generation {}/{}: best objective {}",
                generation, self.params.generations, best
            );

            // Truncation selection: rank by fitness, keep the best
            // population_size. The sort is stable, so ties keep their
            // first-seen order.
            let mut ranked: Vec<(Vec<f64>, f64)> = population
                .drain(..)
                .zip(fitnesses)
                .collect();
            ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
            population = ranked
                .into_iter()
                .take(self.params.population_size)
                .map(|(individual, _)| individual)
                .collect();
        }
        Ok(())
    }

    /// Crossover-then-mutation variation of the whole population in place.
    fn vary(&self, population: &mut [Vec<f64>], mutation: &Normal<f64>, rng: &mut StdRng) {
        let alpha = self.params.blend_alpha;

        // Blend crossover on adjacent pairs: each offspring gene is an
        // interpolation between the parent genes, with the interpolation
        // point drawn fresh per gene.
        for i in (1..population.len()).step_by(2) {
            if rng.random::<f64>() >= self.params.cxpb {
                continue;
            }
            let (left, right) = population.split_at_mut(i);
            let first = &mut left[i - 1];
            let second = &mut right[0];
            for gene in 0..first.len().min(second.len()) {
                let gamma = (1.0 + 2.0 * alpha) * rng.random::<f64>() - alpha;
                let x = first[gene];
                let y = second[gene];
                first[gene] = (1.0 - gamma) * x + gamma * y;
                second[gene] = gamma * x + (1.0 - gamma) * y;
            }
        }

        // Additive Gaussian perturbation, independently per gene.
        for individual in population.iter_mut() {
            if rng.random::<f64>() >= self.params.mutpb {
                continue;
            }
            for gene in individual.iter_mut() {
                if rng.random::<f64>() < self.params.indpb {
                    *gene += mutation.sample(rng);
                }
            }
        }
    }
}
