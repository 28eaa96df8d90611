//! Small numeric helpers shared by the intensity conversions, the baseline fitter and the
//! 2D correlation engine: row-wise statistics, outer products and label lookups.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;

/// Computes the mean of every row of a matrix, i.e. across its columns.
///
/// # Arguments
/// - `data`: The matrix, rows are spectral variables.
///
/// # Returns
/// One mean per row. Rows of a matrix without columns yield NaN.
pub fn row_mean(data: &ArrayView2<f64>) -> Array1<f64> {
    let n = data.ncols() as f64;
    data.sum_axis(Axis(1)).mapv(|s| s / n)
}

/// Computes the variance of every row with `ddof` delta degrees of freedom.
///
/// `sum((x - mean)^2) / (n - ddof)`, rows are processed in parallel.
///
/// # Arguments
/// - `data`: The matrix, rows are spectral variables.
/// - `ddof`: Delta degrees of freedom, `1` for the sample variance.
///
/// # Returns
/// One variance per row. Non-positive denominators yield NaN or Inf.
pub fn row_var(data: &ArrayView2<f64>, ddof: f64) -> Array1<f64> {
    let n = data.ncols() as f64;
    let denominator = n - ddof;
    let variances: Vec<f64> = data
        .axis_iter(Axis(0))
        .into_par_iter()
        .map(|row| {
            let m = row.sum() / n;
            row.iter().map(|&x| (x - m) * (x - m)).sum::<f64>() / denominator
        })
        .collect();
    Array1::from_vec(variances)
}

/// Computes the standard deviation of every row with `ddof` delta degrees of freedom.
pub fn row_std(data: &ArrayView2<f64>, ddof: f64) -> Array1<f64> {
    row_var(data, ddof).mapv(f64::sqrt)
}

/// Outer product `a_i * b_j`.
pub fn outer(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> Array2<f64> {
    let column = a.view().insert_axis(Axis(1));
    let row = b.view().insert_axis(Axis(0));
    &column * &row
}

/// Views a per-row vector as a single column, ready to broadcast against a matrix
/// whose rows it labels.
pub fn as_column(v: ArrayView1<'_, f64>) -> ArrayView2<'_, f64> {
    v.insert_axis(Axis(1))
}

/// Finds the index of the label closest to `target`. NaN labels are ignored.
///
/// # Returns
/// `None` for an empty (or all-NaN) axis.
pub fn nearest_index(values: &ArrayView1<f64>, target: f64) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .min_by(|a, b| (a.1 - target).abs().total_cmp(&(b.1 - target).abs()))
        .map(|(i, _)| i)
}

/// Indices of all labels within `[lo, hi]` (bounds may be given in either order).
pub fn indices_within(values: &ArrayView1<f64>, lo: f64, hi: f64) -> Vec<usize> {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v >= lo && **v <= hi)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_row_statistics_with_ddof() {
        let data = array![[1.0, 2.0, 3.0, 4.0], [2.0, 2.0, 2.0, 2.0]];
        let mean = row_mean(&data.view());
        assert_abs_diff_eq!(mean[0], 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(mean[1], 2.0, epsilon = 1e-12);

        let var = row_var(&data.view(), 1.0);
        assert_abs_diff_eq!(var[0], 5.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(var[1], 0.0, epsilon = 1e-12);

        let var_pop = row_var(&data.view(), 0.0);
        assert_abs_diff_eq!(var_pop[0], 1.25, epsilon = 1e-12);

        let std = row_std(&data.view(), 1.0);
        assert_abs_diff_eq!(std[0], (5.0f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_outer_product() {
        let a = array![1.0, 2.0];
        let b = array![3.0, 4.0, 5.0];
        let o = outer(&a.view(), &b.view());
        assert_eq!(o, array![[3.0, 4.0, 5.0], [6.0, 8.0, 10.0]]);
    }

    #[test]
    fn test_nearest_and_range_lookups_ignore_sort_order() {
        let labels = array![700.0, 600.0, f64::NAN, 500.0, 400.0];
        assert_eq!(nearest_index(&labels.view(), 520.0), Some(3));
        assert_eq!(nearest_index(&labels.view(), 10_000.0), Some(0));
        assert_eq!(indices_within(&labels.view(), 650.0, 450.0), vec![1, 3]);
        assert_eq!(nearest_index(&Array1::<f64>::zeros(0).view(), 1.0), None);
    }
}
