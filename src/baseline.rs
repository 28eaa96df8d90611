//! Dynamic multi-region linear baseline.
//!
//! The baseline of every column is the least-squares straight line through the samples
//! found in a set of axis regions (single labels or label ranges), evaluated over the
//! whole axis. Columns are fitted independently and in parallel; each column's result
//! depends only on that column, so the output does not depend on the thread count.

use crate::error::{ensure_len, Result, SpectraError};
use crate::math_tools::{indices_within, nearest_index};
use ndarray::{Array2, ArrayView1, ArrayView2, Zip};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A part of the axis that is known to contain baseline only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BaselineRegion {
    /// The label nearest to this value.
    Point(f64),
    /// Every label within the bounds (inclusive, either order).
    Range(f64, f64),
}

/// Collects the sample indices selected by `regions`, sorted and without duplicates.
pub fn region_indices(axis: &ArrayView1<f64>, regions: &[BaselineRegion]) -> Vec<usize> {
    let mut selected = BTreeSet::new();
    for region in regions {
        match *region {
            BaselineRegion::Point(x) => selected.extend(nearest_index(axis, x)),
            BaselineRegion::Range(lo, hi) => selected.extend(indices_within(axis, lo, hi)),
        }
    }
    selected.into_iter().collect()
}

/// First-degree polynomial `slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Abscissae shared by all columns, with the sums the fit needs precomputed.
struct Abscissa {
    values: Vec<f64>,
    mean: f64,
    sxx: f64,
}

impl Abscissa {
    fn new(values: Vec<f64>) -> Result<Self> {
        if values.len() < 2 {
            return Err(SpectraError::SingularFit(format!(
                "{} sample(s) selected, at least 2 are required",
                values.len()
            )));
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let sxx = values.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>();
        if sxx == 0.0 || !sxx.is_finite() {
            return Err(SpectraError::SingularFit(
                "selected samples do not span distinct axis values".to_string(),
            ));
        }
        Ok(Abscissa { values, mean, sxx })
    }

    fn fit<I: Iterator<Item = f64>>(&self, ys: I) -> LinearFit {
        let ys: Vec<f64> = ys.collect();
        let y_mean = ys.iter().sum::<f64>() / ys.len() as f64;
        let sxy = self
            .values
            .iter()
            .zip(ys.iter())
            .map(|(x, y)| (x - self.mean) * (y - y_mean))
            .sum::<f64>();
        let slope = sxy / self.sxx;
        LinearFit {
            slope,
            intercept: y_mean - slope * self.mean,
        }
    }
}

/// Least-squares line through `(x, y)`.
///
/// # Errors
/// `SingularFit` when fewer than two distinct abscissae are given, `DimensionMismatch`
/// when `x` and `y` differ in length.
pub fn linear_fit(x: &ArrayView1<f64>, y: &ArrayView1<f64>) -> Result<LinearFit> {
    ensure_len("fit ordinate length", x.len(), y.len())?;
    let abscissa = Abscissa::new(x.to_vec())?;
    Ok(abscissa.fit(y.iter().copied()))
}

/// Builds a baseline matrix of the same shape as `data`.
///
/// # Arguments
/// - `axis`: Labels of the rows of `data`.
/// - `data`: The matrix, one spectrum per column.
/// - `regions`: Baseline-only parts of the axis.
///
/// # Returns
/// For every column, the fitted line evaluated at every label. Subtracting it from
/// `data` removes the linear baseline.
pub fn dynamic_baseline(
    axis: &ArrayView1<f64>,
    data: &ArrayView2<f64>,
    regions: &[BaselineRegion],
) -> Result<Array2<f64>> {
    ensure_len("baseline axis length", data.nrows(), axis.len())?;
    let indices = region_indices(axis, regions);
    let abscissa = Abscissa::new(indices.iter().map(|&i| axis[i]).collect())?;
    log::debug!(
        "fitting linear baseline through {} samples for {} columns",
        indices.len(),
        data.ncols()
    );

    let mut baseline = Array2::zeros(data.raw_dim());
    Zip::from(baseline.columns_mut())
        .and(data.columns())
        .par_for_each(|mut out, column| {
            let fit = abscissa.fit(indices.iter().map(|&i| column[i]));
            Zip::from(&mut out)
                .and(axis)
                .for_each(|o, &x| *o = fit.eval(x));
        });
    Ok(baseline)
}

/// Returns `data` with its dynamic linear baseline removed.
pub fn subtract_baseline(
    axis: &ArrayView1<f64>,
    data: &ArrayView2<f64>,
    regions: &[BaselineRegion],
) -> Result<Array2<f64>> {
    let baseline = dynamic_baseline(axis, data, regions)?;
    Ok(data - &baseline)
}
