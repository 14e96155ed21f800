//! Serializable run summaries for reporting collaborators

use crate::config::GaConfig;
use crate::engine::GeneticEngine;
use crate::error::AntennaResult;
use crate::history::{GenerationRecord, RunHistory};
use antennae_spatial::Point;
use ndarray::{ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One layout singled out for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutReport {
    /// Generation the layout belongs to; `None` for the final population
    pub generation: Option<usize>,
    pub individual: usize,
    pub fitness: f64,
    pub antennae: Vec<Point>,
}

impl LayoutReport {
    fn new(generation: Option<usize>, individual: usize, fitness: f64, layout: ArrayView2<f64>) -> Self {
        Self {
            generation,
            individual,
            fitness,
            antennae: layout.outer_iter().map(|a| [a[0], a[1]]).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub config: GaConfig,
    pub generations: Vec<GenerationRecord>,
    /// Best layouts of the sampled generations
    pub snapshots: Vec<LayoutReport>,
    /// Best layout of the population left after the last generation
    pub final_best: LayoutReport,
}

impl RunSummary {
    pub fn to_json(&self) -> AntennaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Best layout of a stored generation.
pub fn generation_best<R: Rng>(
    engine: &GeneticEngine<R>,
    history: &RunHistory,
    generation: usize,
) -> AntennaResult<LayoutReport> {
    let (individual, fitness) = history.best_individual(generation, engine.index(), engine.evaluator())?;
    let snapshot = history.snapshot(generation)?;
    Ok(LayoutReport::new(
        Some(generation),
        individual,
        fitness,
        snapshot.index_axis(Axis(0), individual),
    ))
}

/// Summarize a finished (or partially run) engine, reporting the best
/// layout of `sample_count` evenly spaced generations.
pub fn summarize<R: Rng>(engine: &GeneticEngine<R>, sample_count: usize) -> AntennaResult<RunSummary> {
    let history = engine.history();
    let snapshots = history
        .sample_generations(sample_count)
        .into_iter()
        .map(|g| generation_best(engine, history, g))
        .collect::<AntennaResult<Vec<_>>>()?;

    let (individual, fitness) = engine.current_best()?;
    let final_best = LayoutReport::new(
        None,
        individual,
        fitness,
        engine.population().index_axis(Axis(0), individual),
    );

    Ok(RunSummary {
        config: engine.config().clone(),
        generations: history.records().to_vec(),
        snapshots,
        final_best,
    })
}
