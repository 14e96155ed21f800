//! Per-generation run history
//!
//! Append-only record of fitness statistics and population snapshots. The
//! engine appends exactly one record and one snapshot per completed
//! generation; reporting code reads them back by generation index.

use crate::coverage::CoverageEvaluator;
use crate::error::{AntennaError, AntennaResult};
use crate::grid::SpatialIndex;
use ndarray::{Array1, Array3, ArrayView3};
use serde::{Deserialize, Serialize};

/// Fitness statistics of one generation, taken before selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    pub max_fitness: f64,
    pub mean_fitness: f64,
    pub std_fitness: f64,
    pub crossover_count: usize,
}

impl GenerationRecord {
    /// Population statistics of a fitness vector (standard deviation with
    /// zero degrees-of-freedom correction).
    pub fn from_fitness(generation: usize, fitness: &Array1<f64>, crossover_count: usize) -> Self {
        let max_fitness = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            generation,
            max_fitness,
            mean_fitness: fitness.mean().unwrap_or(0.0),
            std_fitness: fitness.std(0.0),
            crossover_count,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunHistory {
    records: Vec<GenerationRecord>,
    snapshots: Vec<Array3<f64>>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, record: GenerationRecord, snapshot: Array3<f64>) {
        debug_assert_eq!(record.generation, self.records.len());
        self.records.push(record);
        self.snapshots.push(snapshot);
    }

    /// Number of completed generations.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn check(&self, generation: usize) -> AntennaResult<()> {
        if generation >= self.records.len() {
            return Err(AntennaError::IndexOutOfRange {
                generation,
                completed: self.records.len(),
            });
        }
        Ok(())
    }

    pub fn record(&self, generation: usize) -> AntennaResult<&GenerationRecord> {
        self.check(generation)?;
        Ok(&self.records[generation])
    }

    /// Population as it stood at the start of `generation`.
    pub fn snapshot(&self, generation: usize) -> AntennaResult<ArrayView3<f64>> {
        self.check(generation)?;
        Ok(self.snapshots[generation].view())
    }

    pub fn records(&self) -> &[GenerationRecord] {
        &self.records
    }

    pub fn max_fitness_history(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.max_fitness).collect()
    }

    pub fn mean_fitness_history(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.mean_fitness).collect()
    }

    pub fn std_fitness_history(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.std_fitness).collect()
    }

    pub fn crossover_history(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.crossover_count).collect()
    }

    /// Recompute the fitness vector of a stored snapshot.
    pub fn rescore(
        &self,
        generation: usize,
        index: &SpatialIndex,
        evaluator: &CoverageEvaluator,
    ) -> AntennaResult<Array1<f64>> {
        evaluator.evaluate(self.snapshot(generation)?, index)
    }

    /// Individual index and fitness of the best layout in a snapshot.
    /// Ties go to the lowest index.
    pub fn best_individual(
        &self,
        generation: usize,
        index: &SpatialIndex,
        evaluator: &CoverageEvaluator,
    ) -> AntennaResult<(usize, f64)> {
        let fitness = self.rescore(generation, index, evaluator)?;
        Ok(argmax(&fitness))
    }

    /// `count` evenly spaced generation indices starting at 0, excluding the
    /// end point; duplicates are dropped when `count` exceeds the history.
    pub fn sample_generations(&self, count: usize) -> Vec<usize> {
        let n = self.records.len();
        if n == 0 || count == 0 {
            return Vec::new();
        }
        let mut sampled: Vec<usize> = (0..count).map(|i| i * n / count).collect();
        sampled.dedup();
        sampled
    }
}

pub(crate) fn argmax(fitness: &Array1<f64>) -> (usize, f64) {
    fitness
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, f)| if f > best.1 { (i, f) } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn filled(generations: usize) -> RunHistory {
        let mut history = RunHistory::new();
        for g in 0..generations {
            let fitness = array![0.1 * g as f64, 0.2, 0.3];
            history.append(
                GenerationRecord::from_fitness(g, &fitness, g),
                Array3::from_elem((3, 1, 2), g as f64 / 10.0),
            );
        }
        history
    }

    #[test]
    fn test_statistics() {
        let record = GenerationRecord::from_fitness(0, &array![0.2, 0.4, 0.6, 0.8], 1);
        assert!((record.max_fitness - 0.8).abs() < 1e-12);
        assert!((record.mean_fitness - 0.5).abs() < 1e-12);
        assert!((record.std_fitness - 0.05f64.sqrt()).abs() < 1e-12);
        assert_eq!(record.crossover_count, 1);
    }

    #[test]
    fn test_out_of_range() {
        let history = filled(2);
        assert!(history.record(1).is_ok());
        assert!(matches!(
            history.record(2),
            Err(AntennaError::IndexOutOfRange { generation: 2, completed: 2 })
        ));
        assert!(matches!(
            RunHistory::new().snapshot(0),
            Err(AntennaError::IndexOutOfRange { generation: 0, completed: 0 })
        ));
    }

    #[test]
    fn test_columns() {
        let history = filled(3);
        assert_eq!(history.crossover_history(), vec![0, 1, 2]);
        assert_eq!(history.mean_fitness_history().len(), 3);
        assert!((history.max_fitness_history()[2] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_sample_generations() {
        assert_eq!(filled(200).sample_generations(5), vec![0, 40, 80, 120, 160]);
        assert_eq!(filled(3).sample_generations(5), vec![0, 1, 2]);
        assert!(RunHistory::new().sample_generations(5).is_empty());
    }

    #[test]
    fn test_argmax_prefers_first() {
        assert_eq!(argmax(&array![0.5, 0.7, 0.7]), (1, 0.7));
    }
}
