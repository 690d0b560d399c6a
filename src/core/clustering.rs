use itertools::{Itertools, MinMaxResult};
use linfa::{DatasetBase, traits::Fit};
use linfa_clustering::KMeans;
use ndarray::Array2;
use rand::{SeedableRng, rngs::StdRng};

use crate::prelude::*;

/// Unsupervised two-cluster split of one-dimensional values.
pub trait Clusterer {
    /// Centroids of the two clusters, in no particular order.
    fn two_centroids(&self, values: &[f64]) -> Result<[f64; 2]>;
}

/// Lloyd's k-means with k-means++ initialisation, seeded for reproducibility.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct KMeansClusterer {
    seed: u64,
}

impl Default for KMeansClusterer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

impl KMeansClusterer {
    pub const DEFAULT_SEED: u64 = 42;

    const MAX_ITERATIONS: u64 = 300;
    const TOLERANCE: f64 = 1e-6;

    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Clusterer for KMeansClusterer {
    #[instrument(skip_all, fields(n_values = values.len(), seed = self.seed))]
    fn two_centroids(&self, values: &[f64]) -> Result<[f64; 2]> {
        let (min, max) = match values.iter().copied().minmax() {
            MinMaxResult::NoElements => bail!("cannot cluster an empty set of values"),
            MinMaxResult::OneElement(value) => (value, value),
            MinMaxResult::MinMax(min, max) => (min, max),
        };
        ensure!(min.is_finite() && max.is_finite(), "values must be finite");
        if max - min <= 0.0 {
            // Both centroids collapse onto the only value there is.
            debug!(value = min, "constant values");
            return Ok([min, max]);
        }

        let records = Array2::from_shape_vec((values.len(), 1), values.to_vec())?;
        let dataset = DatasetBase::from(records);
        let model = KMeans::<f64, _>::params_with_rng(2, StdRng::seed_from_u64(self.seed))
            .max_n_iterations(Self::MAX_ITERATIONS)
            .tolerance(Self::TOLERANCE)
            .fit(&dataset)
            .context("failed to fit the k-means model")?;
        let centroids = model.centroids();
        let centroids = [centroids[[0, 0]], centroids[[1, 0]]];
        debug!(?centroids, "fitted");
        Ok(centroids)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::Cell, rc::Rc};

    use approx::assert_abs_diff_eq;

    use super::*;

    /// Splits at the extremes and counts how many times it has been asked to.
    #[derive(Clone, Default)]
    pub struct CountingClusterer {
        pub n_calls: Rc<Cell<usize>>,
    }

    impl Clusterer for CountingClusterer {
        fn two_centroids(&self, values: &[f64]) -> Result<[f64; 2]> {
            self.n_calls.set(self.n_calls.get() + 1);
            let (min, max) = values.iter().copied().minmax().into_option().context("empty")?;
            Ok([min, max])
        }
    }

    fn sorted([lhs, rhs]: [f64; 2]) -> [f64; 2] {
        if lhs <= rhs { [lhs, rhs] } else { [rhs, lhs] }
    }

    #[test]
    fn test_two_separated_clusters() -> Result {
        let values = [5.0; 50].into_iter().chain([500.0; 50]).collect_vec();
        let [low, high] = sorted(KMeansClusterer::default().two_centroids(&values)?);
        assert_abs_diff_eq!(low, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(high, 500.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_noisy_clusters() -> Result {
        let values = [0.0, 1.0, 2.0, 1.0, 0.0, 98.0, 100.0, 102.0];
        let [low, high] = sorted(KMeansClusterer::new(7).two_centroids(&values)?);
        // Lloyd's iterations stop within the tolerance, not at the exact means:
        assert_abs_diff_eq!(low, 0.8, epsilon = 1e-4);
        assert_abs_diff_eq!(high, 100.0, epsilon = 1e-4);
        Ok(())
    }

    #[test]
    #[expect(clippy::float_cmp)]
    fn test_constant_values() -> Result {
        assert_eq!(KMeansClusterer::default().two_centroids(&[5.0; 20])?, [5.0, 5.0]);
        Ok(())
    }

    #[test]
    #[expect(clippy::float_cmp)]
    fn test_single_value() -> Result {
        assert_eq!(KMeansClusterer::default().two_centroids(&[3.0])?, [3.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_empty_values() {
        assert!(KMeansClusterer::default().two_centroids(&[]).is_err());
    }

    #[test]
    fn test_same_seed_same_centroids() -> Result {
        let values = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0];
        let clusterer = KMeansClusterer::new(1234);
        assert_eq!(clusterer.two_centroids(&values)?, clusterer.two_centroids(&values)?);
        Ok(())
    }
}
