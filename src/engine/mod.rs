//! Genetic search over antenna layouts
//!
//! The engine owns the live population, a `(P, N, 2)` array of antenna
//! coordinates, and advances it one generation per [`GeneticEngine::step`]:
//!
//! 1. snapshot the population,
//! 2. score it with the [`CoverageEvaluator`],
//! 3. resample it by roulette-wheel selection,
//! 4. recombine adjacent pairs at a single cutoff,
//! 5. displace antennae with Gaussian noise and wrap them onto the torus.
//!
//! Each completed generation appends one [`GenerationRecord`] and one
//! snapshot to the [`RunHistory`]. A generation that fails leaves the history
//! untouched and terminates the engine.

pub mod operators;

use crate::config::GaConfig;
use crate::coverage::CoverageEvaluator;
use crate::error::{AntennaError, AntennaResult};
use crate::grid::SpatialIndex;
use crate::history::{argmax, GenerationRecord, RunHistory};
use ndarray::{Array1, Array3, ArrayView2, ArrayView3, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Sub-phase of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Scoring,
    Selecting,
    Recombining,
    Mutating,
}

/// Lifecycle of an engine. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Initialized,
    /// Executing (or about to execute) `phase` of `generation`
    Running { generation: usize, phase: Phase },
    Terminated,
}

pub struct GeneticEngine<R: Rng = StdRng> {
    config: GaConfig,
    index: Arc<SpatialIndex>,
    evaluator: CoverageEvaluator,
    noise: Normal<f64>,
    population: Array3<f64>,
    history: RunHistory,
    iteration: usize,
    state: EngineState,
    rng: R,
}

impl GeneticEngine<StdRng> {
    /// Engine seeded from `config.seed`, or from entropy when unset.
    pub fn from_config(config: GaConfig, index: Arc<SpatialIndex>) -> AntennaResult<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(config, index, rng)
    }

    pub fn with_seed(config: GaConfig, index: Arc<SpatialIndex>, seed: u64) -> AntennaResult<Self> {
        Self::new(config, index, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> GeneticEngine<R> {
    /// Every individual starts with all antennae at the domain centre.
    pub fn new(config: GaConfig, index: Arc<SpatialIndex>, rng: R) -> AntennaResult<Self> {
        config.validate()?;
        if config.k_neighbors > index.len() {
            return Err(AntennaError::Configuration(format!(
                "k_neighbors ({}) exceeds the number of weighted points ({})",
                config.k_neighbors,
                index.len()
            )));
        }
        let noise = Normal::new(0.0, config.mutation_std)
            .map_err(|e| AntennaError::Configuration(format!("mutation_std: {}", e)))?;
        let evaluator = CoverageEvaluator::new(config.k_neighbors)?.parallel(config.parallel_scoring);

        let center = index.domain().center();
        let population = Array3::from_shape_fn(
            (config.population_size, config.n_antennae, 2),
            |(_, _, axis)| center[axis],
        );

        info!(
            population = config.population_size,
            antennae = config.n_antennae,
            generations = config.n_generations,
            k_neighbors = config.k_neighbors,
            "genetic engine initialized"
        );

        Ok(Self {
            config,
            index,
            evaluator,
            noise,
            population,
            history: RunHistory::new(),
            iteration: 0,
            state: EngineState::Initialized,
            rng,
        })
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn evaluator(&self) -> &CoverageEvaluator {
        &self.evaluator
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Number of completed generations.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn population(&self) -> ArrayView3<f64> {
        self.population.view()
    }

    pub fn individual(&self, i: usize) -> Option<ArrayView2<f64>> {
        (i < self.population.len_of(Axis(0))).then(|| self.population.index_axis(Axis(0), i))
    }

    pub fn history(&self) -> &RunHistory {
        &self.history
    }

    pub fn into_history(self) -> RunHistory {
        self.history
    }

    pub fn is_finished(&self) -> bool {
        self.state == EngineState::Terminated || self.iteration >= self.config.n_generations
    }

    /// Fitness of the live population, without advancing the run.
    pub fn current_fitness(&self) -> AntennaResult<Array1<f64>> {
        self.evaluator.evaluate(self.population.view(), &self.index)
    }

    /// Best individual of the live population as (index, fitness).
    pub fn current_best(&self) -> AntennaResult<(usize, f64)> {
        Ok(argmax(&self.current_fitness()?))
    }

    fn enter(&mut self, generation: usize, phase: Phase) {
        self.state = EngineState::Running { generation, phase };
    }

    /// Advance exactly one generation and return its record.
    pub fn step(&mut self) -> AntennaResult<GenerationRecord> {
        if self.is_finished() {
            self.state = EngineState::Terminated;
            return Err(AntennaError::InvalidArgument(format!(
                "engine has terminated after {} generation(s)",
                self.iteration
            )));
        }

        let generation = self.iteration;
        match self.advance(generation) {
            Ok(record) => {
                self.iteration += 1;
                self.state = if self.iteration >= self.config.n_generations {
                    EngineState::Terminated
                } else {
                    EngineState::Running {
                        generation: self.iteration,
                        phase: Phase::Scoring,
                    }
                };
                Ok(record)
            }
            Err(err) => {
                warn!(generation, state = ?self.state, error = %err, "generation aborted");
                self.state = EngineState::Terminated;
                Err(err)
            }
        }
    }

    fn advance(&mut self, generation: usize) -> AntennaResult<GenerationRecord> {
        let snapshot = self.population.clone();

        self.enter(generation, Phase::Scoring);
        let fitness = self.evaluator.evaluate(self.population.view(), &self.index)?;

        self.enter(generation, Phase::Selecting);
        let selected = operators::roulette_select(fitness.view(), &mut self.rng).ok_or(
            AntennaError::DegenerateFitness {
                generation,
                population: self.config.population_size,
            },
        )?;
        self.population = operators::resample(&self.population, &selected);

        self.enter(generation, Phase::Recombining);
        let crossovers =
            operators::crossover_cutoff(&mut self.population, self.config.p_crossover, &mut self.rng);

        self.enter(generation, Phase::Mutating);
        let domain = self.index.domain();
        let moved = operators::mutate(
            &mut self.population,
            self.config.p_mutation,
            &self.noise,
            &domain,
            &mut self.rng,
        );

        let record = GenerationRecord::from_fitness(generation, &fitness, crossovers);
        self.history.append(record, snapshot);

        debug!(
            generation,
            max = record.max_fitness,
            mean = record.mean_fitness,
            std = record.std_fitness,
            crossovers,
            moved,
            "generation complete"
        );
        Ok(record)
    }

    /// Run the remaining generations.
    pub fn run(&mut self) -> AntennaResult<&RunHistory> {
        while !self.is_finished() {
            self.step()?;
        }
        self.state = EngineState::Terminated;
        if let Some(last) = self.history.records().last() {
            info!(
                generations = self.history.len(),
                max = last.max_fitness,
                mean = last.mean_fitness,
                "run complete"
            );
        }
        Ok(&self.history)
    }
}
