//! Genetic operators over a population array of shape `(P, N, 2)`

use crate::grid::Domain;
use ndarray::{s, Array1, Array3, ArrayView1, Axis, Zip};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::instrument;

/// Cumulative distribution of the normalized fitness, in population order.
///
/// Returns `None` when the fitness mass is zero (or not finite), in which
/// case there is nothing to select proportionally from.
pub fn cumulative_distribution(fitness: ArrayView1<f64>) -> Option<Array1<f64>> {
    let total = fitness.sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    let mut running = 0.0;
    Some(
        fitness
            .iter()
            .map(|f| {
                running += f / total;
                running
            })
            .collect(),
    )
}

/// Map uniform draws in `[0, 1)` to individuals: each draw selects the
/// number of cumulative boundaries it exceeds.
pub fn select_indices(cdf: ArrayView1<f64>, draws: &[f64]) -> Vec<usize> {
    let last = cdf.len().saturating_sub(1);
    draws
        .iter()
        .map(|&x| cdf.iter().filter(|&&c| x > c).count().min(last))
        .collect()
}

/// Fitness-proportionate selection with replacement; one draw per individual.
#[instrument(level = "debug", skip_all, fields(size = fitness.len()))]
pub fn roulette_select<R: Rng>(fitness: ArrayView1<f64>, rng: &mut R) -> Option<Vec<usize>> {
    let cdf = cumulative_distribution(fitness)?;
    let draws: Vec<f64> = (0..fitness.len()).map(|_| rng.gen::<f64>()).collect();
    Some(select_indices(cdf.view(), &draws))
}

/// Rebuild the population from selected indices, in draw order.
pub fn resample(population: &Array3<f64>, selected: &[usize]) -> Array3<f64> {
    population.select(Axis(0), selected)
}

/// Single-cutoff crossover over disjoint adjacent pairs `(0, 1), (2, 3), ...`.
///
/// With an odd population the last individual is never paired. Returns
/// the number of pairs that recombined.
#[instrument(level = "debug", skip(population, rng), fields(size = population.len_of(Axis(0))))]
pub fn crossover_cutoff<R: Rng>(
    population: &mut Array3<f64>,
    p_crossover: f64,
    rng: &mut R,
) -> usize {
    let (size, n_antennae, _) = population.dim();
    let mut crossovers = 0;
    for i in (0..size).step_by(2) {
        if i + 1 < size && rng.gen::<f64>() < p_crossover {
            crossovers += 1;
            let cutoff = rng.gen_range(0..n_antennae);
            let (lhs, rhs) =
                population.multi_slice_mut((s![i, cutoff.., ..], s![i + 1, cutoff.., ..]));
            Zip::from(lhs).and(rhs).for_each(|a, b| std::mem::swap(a, b));
        }
    }
    crossovers
}

/// Gaussian displacement of whole antennae followed by the toroidal wrap.
///
/// Each antenna moves with probability `p_mutation`; a moving antenna gets
/// independent noise on both coordinates. Every coordinate is then mapped
/// into `[0, extent)` of its axis.
#[instrument(level = "debug", skip(population, noise, domain, rng), fields(size = population.len_of(Axis(0))))]
pub fn mutate<R: Rng>(
    population: &mut Array3<f64>,
    p_mutation: f64,
    noise: &Normal<f64>,
    domain: &Domain,
    rng: &mut R,
) -> usize {
    let mut moved = 0;
    for mut individual in population.outer_iter_mut() {
        for mut antenna in individual.outer_iter_mut() {
            if rng.gen::<f64>() < p_mutation {
                moved += 1;
                antenna[0] += noise.sample(rng);
                antenna[1] += noise.sample(rng);
            }
            antenna[0] = domain.wrap(antenna[0], 0);
            antenna[1] = domain.wrap(antenna[1], 1);
        }
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn labelled_population(size: usize, n_antennae: usize) -> Array3<f64> {
        // Coordinates encode (individual, antenna) so swaps are traceable
        Array3::from_shape_fn((size, n_antennae, 2), |(p, a, c)| {
            (p * 10 + a) as f64 / 100.0 + c as f64 * 0.001
        })
    }

    #[test]
    fn test_cdf_zero_mass() {
        assert!(cumulative_distribution(array![0.0, 0.0].view()).is_none());
    }

    #[test]
    fn test_cdf_values() {
        let cdf = cumulative_distribution(array![1.0, 1.0, 2.0].view()).unwrap();
        assert!((cdf[0] - 0.25).abs() < 1e-12);
        assert!((cdf[1] - 0.5).abs() < 1e-12);
        assert!((cdf[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_select_indices_counts_boundaries() {
        let cdf = array![0.25, 0.5, 1.0];
        let selected = select_indices(cdf.view(), &[0.0, 0.3, 0.5, 0.51, 0.99]);
        assert_eq!(selected, vec![0, 1, 1, 2, 2]);
    }

    #[test]
    fn test_select_indices_clamps_rounding_overflow() {
        let cdf = array![0.5, 0.999_999_999];
        assert_eq!(select_indices(cdf.view(), &[0.999_999_999_9]), vec![1]);
    }

    #[test]
    fn test_zero_fitness_individual_never_selected() {
        let mut rng = StdRng::seed_from_u64(3);
        let fitness = array![0.0, 1.0, 0.0];
        for _ in 0..20 {
            let selected = roulette_select(fitness.view(), &mut rng).unwrap();
            assert!(selected.iter().all(|&i| i == 1));
        }
    }

    #[test]
    fn test_selection_permutation_invariance() {
        let fitness = array![0.1, 0.6, 0.3];
        let draws = [0.05, 0.2, 0.65, 0.95, 0.4];
        let original = select_indices(cumulative_distribution(fitness.view()).unwrap().view(), &draws);

        // Reverse the order; matching draws are reflected through the cdf
        let permuted = array![0.3, 0.6, 0.1];
        let mirrored: Vec<f64> = draws.iter().map(|d| 1.0 - d).collect();
        let selected = select_indices(cumulative_distribution(permuted.view()).unwrap().view(), &mirrored);
        let mapped: Vec<usize> = selected.iter().map(|&i| 2 - i).collect();
        assert_eq!(original, mapped);
    }

    #[test]
    fn test_resample_in_draw_order() {
        let population = labelled_population(3, 2);
        let next = resample(&population, &[2, 2, 0]);
        assert_eq!(next.index_axis(Axis(0), 0), population.index_axis(Axis(0), 2));
        assert_eq!(next.index_axis(Axis(0), 1), population.index_axis(Axis(0), 2));
        assert_eq!(next.index_axis(Axis(0), 2), population.index_axis(Axis(0), 0));
    }

    #[test]
    fn test_crossover_disabled() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut population = labelled_population(4, 3);
        let before = population.clone();
        assert_eq!(crossover_cutoff(&mut population, 0.0, &mut rng), 0);
        assert_eq!(population, before);
    }

    #[test]
    fn test_crossover_swaps_tails_within_pairs() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut population = labelled_population(5, 4);
        let before = population.clone();
        let count = crossover_cutoff(&mut population, 1.0, &mut rng);
        assert_eq!(count, 2);
        assert_eq!(population.dim(), (5, 4, 2));
        // Unpaired last individual is untouched
        assert_eq!(population.index_axis(Axis(0), 4), before.index_axis(Axis(0), 4));

        for pair in [(0usize, 1usize), (2, 3)] {
            let (a, b) = pair;
            // Antennae either stay or come from the partner at the same slot
            for slot in 0..4 {
                let now_a = population.slice(s![a, slot, ..]);
                let now_b = population.slice(s![b, slot, ..]);
                let was_a = before.slice(s![a, slot, ..]);
                let was_b = before.slice(s![b, slot, ..]);
                assert!((now_a == was_a && now_b == was_b) || (now_a == was_b && now_b == was_a));
            }
            // The last slot is always past the cutoff
            assert_eq!(population.slice(s![a, 3, ..]), before.slice(s![b, 3, ..]));
        }
    }

    #[test]
    fn test_mutation_disabled_only_wraps() {
        let mut rng = StdRng::seed_from_u64(0);
        let noise = Normal::new(0.0, 0.1).unwrap();
        let mut population = Array3::from_elem((2, 2, 2), 0.5);
        population[[1, 1, 0]] = 1.25;
        population[[1, 1, 1]] = -0.25;
        let moved = mutate(&mut population, 0.0, &noise, &Domain::unit(), &mut rng);
        assert_eq!(moved, 0);
        assert_eq!(population[[0, 0, 0]], 0.5);
        assert!((population[[1, 1, 0]] - 0.25).abs() < 1e-12);
        assert!((population[[1, 1, 1]] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_mutation_keeps_coordinates_in_domain() {
        let mut rng = StdRng::seed_from_u64(5);
        let noise = Normal::new(0.0, 3.0).unwrap();
        let domain = Domain::new(2.0, 0.5).unwrap();
        let mut population = Array3::from_elem((8, 6, 2), 0.0);
        for _ in 0..50 {
            let moved = mutate(&mut population, 1.0, &noise, &domain, &mut rng);
            assert_eq!(moved, 48);
            for ((_, _, axis), &v) in population.indexed_iter() {
                assert!(v >= 0.0 && v < domain.extent(axis), "coordinate {} escaped axis {}", v, axis);
            }
        }
    }
}
