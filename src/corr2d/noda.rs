//! The Noda (discrete Hilbert transform) matrix used for asynchronous correlation.

use ndarray::Array2;
use std::f64::consts::PI;
use std::sync::Arc;

/// Builds the `m x m` Noda matrix: `N[j, k] = 0` on the diagonal and
/// `1 / (pi * (k - j))` elsewhere.
pub fn noda_matrix(m: usize) -> Array2<f64> {
    Array2::from_shape_fn((m, m), |(j, k)| {
        if j == k {
            0.0
        } else {
            1.0 / (PI * (k as f64 - j as f64))
        }
    })
}

/// Keeps the last Noda matrix and rebuilds it only when the column count changes.
#[derive(Debug, Default)]
pub struct NodaCache {
    matrix: Option<Arc<Array2<f64>>>,
}

impl NodaCache {
    pub fn get(&mut self, m: usize) -> Arc<Array2<f64>> {
        if let Some(matrix) = &self.matrix {
            if matrix.nrows() == m {
                return Arc::clone(matrix);
            }
        }
        log::debug!("building {m}x{m} Noda matrix");
        let matrix = Arc::new(noda_matrix(m));
        self.matrix = Some(Arc::clone(&matrix));
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_noda_matrix_is_antisymmetric_with_zero_diagonal() {
        for m in [1, 2, 5, 12] {
            let n = noda_matrix(m);
            for j in 0..m {
                assert_eq!(n[[j, j]], 0.0);
                for k in 0..m {
                    assert_abs_diff_eq!(n[[j, k]], -n[[k, j]], epsilon = 1e-15);
                }
            }
        }
    }

    #[test]
    fn test_noda_matrix_entries() {
        let n = noda_matrix(4);
        assert_abs_diff_eq!(n[[0, 1]], 1.0 / PI, epsilon = 1e-15);
        assert_abs_diff_eq!(n[[0, 3]], 1.0 / (3.0 * PI), epsilon = 1e-15);
        assert_abs_diff_eq!(n[[3, 1]], -1.0 / (2.0 * PI), epsilon = 1e-15);
    }

    #[test]
    fn test_cache_rebuilds_only_on_size_change() {
        let mut cache = NodaCache::default();
        let a = cache.get(6);
        let b = cache.get(6);
        assert!(Arc::ptr_eq(&a, &b));
        let c = cache.get(7);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.dim(), (7, 7));
    }
}
