//! Generalized two-dimensional correlation analysis.
//!
//! Given a matrix `D` with spectral variables in rows and a perturbation (time,
//! temperature, concentration) along the columns, the engine builds the dynamic
//! spectrum `Δ` and the [`Corr2dResult`] computes from it
//!
//! * the synchronous spectrum `S = Δ Δᵀ / (m - 1)`,
//! * the asynchronous spectrum `A = Δ N Δᵀ / (m - 1)` with the Noda matrix `N`,
//! * correlation and disrelation coefficients, scaled spectra and the phase map.
//!
//! Divisions by zero variance and `atan(0 / 0)` are not errors; they show up as
//! NaN/Inf in the affected cells.

mod noda;

pub use noda::{noda_matrix, NodaCache};

use crate::axis::ConvertibleAxis;
use crate::config::{Corr2dConfig, ScalingConfig};
use crate::error::{ensure_len, Result, SpectraError};
use crate::math_tools::{as_column, outer, row_mean, row_std, row_var};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewD, Ix2, Zip};
use once_cell::unsync::OnceCell;
use std::sync::Arc;

/// Builds [`Corr2dResult`]s and keeps the Noda matrix of the last column count.
#[derive(Debug, Default)]
pub struct Corr2dEngine {
    config: Corr2dConfig,
    noda: NodaCache,
}

impl Corr2dEngine {
    pub fn new(config: Corr2dConfig) -> Self {
        Corr2dEngine {
            config,
            noda: NodaCache::default(),
        }
    }

    pub fn config(&self) -> &Corr2dConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: Corr2dConfig) {
        self.config = config;
    }

    /// Noda matrix for `m` columns, shared with previous results of the same size.
    pub fn noda(&mut self, m: usize) -> Arc<Array2<f64>> {
        self.noda.get(m)
    }

    /// Runs the analysis on `data` against `reference`.
    ///
    /// # Arguments
    /// - `data`: Spectral variables in rows, perturbation in columns.
    /// - `reference`: Reference spectrum subtracted from every column. Ignored for the
    ///   dynamic spectrum when the engine is configured as centered, but its length is
    ///   still validated.
    /// - `axis`: Optional spectral labels of the rows; they label both dimensions of
    ///   the correlation matrices.
    ///
    /// # Errors
    /// `DimensionMismatch` when the reference or axis length differs from the row
    /// count, or when there are fewer than two columns.
    pub fn analyze(
        &mut self,
        data: ArrayView2<f64>,
        reference: ArrayView1<f64>,
        axis: Option<ConvertibleAxis>,
    ) -> Result<Corr2dResult> {
        let (rows, columns) = data.dim();
        ensure_len("reference length", rows, reference.len())?;
        if let Some(axis) = &axis {
            ensure_len("spectral axis length", rows, axis.len())?;
        }
        if columns < 2 {
            return Err(SpectraError::DimensionMismatch {
                context: "minimum column count",
                expected: 2,
                found: columns,
            });
        }
        if self.config.scaling.is_some() && !self.config.centered {
            log::warn!("scaling a 2D correlation whose dynamic spectrum is not mean-centered");
        }

        let dynamic = if self.config.centered {
            let mean = row_mean(&data);
            &data - &as_column(mean.view())
        } else {
            &data - &as_column(reference)
        };

        Ok(Corr2dResult {
            data: data.to_owned(),
            dynamic,
            noda: self.noda.get(columns),
            axis,
            scaling: self.config.scaling,
            synchronous: OnceCell::new(),
            asynchronous: OnceCell::new(),
            std: OnceCell::new(),
            var: OnceCell::new(),
        })
    }

    /// Like [`Corr2dEngine::analyze`] for arrays whose dimensionality is only known
    /// at runtime.
    ///
    /// # Errors
    /// `Shape` unless `data` is two-dimensional.
    pub fn analyze_dyn(
        &mut self,
        data: ArrayViewD<f64>,
        reference: ArrayView1<f64>,
        axis: Option<ConvertibleAxis>,
    ) -> Result<Corr2dResult> {
        let found = data.ndim();
        let data = data
            .into_dimensionality::<Ix2>()
            .map_err(|_| SpectraError::Shape { expected: 2, found })?;
        self.analyze(data, reference, axis)
    }
}

/// Read-only outcome of a 2D correlation analysis. Matrices are computed on first
/// access and cached.
#[derive(Debug)]
pub struct Corr2dResult {
    data: Array2<f64>,
    dynamic: Array2<f64>,
    noda: Arc<Array2<f64>>,
    axis: Option<ConvertibleAxis>,
    scaling: Option<ScalingConfig>,
    synchronous: OnceCell<Array2<f64>>,
    asynchronous: OnceCell<Array2<f64>>,
    std: OnceCell<Array1<f64>>,
    var: OnceCell<Array1<f64>>,
}

impl Corr2dResult {
    /// The source matrix `D`.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// The dynamic spectrum `Δ`.
    pub fn dynamic(&self) -> &Array2<f64> {
        &self.dynamic
    }

    pub fn noda(&self) -> &Arc<Array2<f64>> {
        &self.noda
    }

    /// Labels of both dimensions of the correlation matrices.
    pub fn axis(&self) -> Option<&ConvertibleAxis> {
        self.axis.as_ref()
    }

    fn normalization(&self) -> f64 {
        (self.dynamic.ncols() - 1) as f64
    }

    pub fn synchronous(&self) -> &Array2<f64> {
        self.synchronous
            .get_or_init(|| self.dynamic.dot(&self.dynamic.t()) / self.normalization())
    }

    pub fn asynchronous(&self) -> &Array2<f64> {
        self.asynchronous.get_or_init(|| {
            self.dynamic.dot(&*self.noda).dot(&self.dynamic.t()) / self.normalization()
        })
    }

    /// Row-wise sample standard deviation of `D`.
    pub fn std(&self) -> &Array1<f64> {
        self.std.get_or_init(|| row_std(&self.data.view(), 1.0))
    }

    /// Row-wise sample variance of `D`.
    pub fn var(&self) -> &Array1<f64> {
        self.var.get_or_init(|| row_var(&self.data.view(), 1.0))
    }

    /// `std_i * std_j`.
    pub fn std_matrix(&self) -> Array2<f64> {
        let std = self.std().view();
        outer(&std, &std)
    }

    /// `var_i * var_j`.
    pub fn var_matrix(&self) -> Array2<f64> {
        let var = self.var().view();
        outer(&var, &var)
    }

    /// Correlation coefficients `S / std`.
    pub fn coeff_corr(&self) -> Array2<f64> {
        self.synchronous() / &self.std_matrix()
    }

    /// Disrelation coefficients `A / std`.
    pub fn coeff_disr(&self) -> Array2<f64> {
        self.asynchronous() / &self.std_matrix()
    }

    fn scale(&self, matrix: &Array2<f64>, alpha: f64, beta: f64) -> Array2<f64> {
        let mut scaled = Array2::zeros(matrix.raw_dim());
        Zip::from(&mut scaled)
            .and(matrix)
            .and(&self.var_matrix())
            .and(&self.std_matrix())
            .for_each(|out, &c, &v, &s| *out = c * v.powf(-alpha) * (c / s).abs().powf(beta));
        scaled
    }

    /// `S * var^(-alpha) * |S / std|^beta`.
    pub fn scaled_synchronous(&self, alpha: f64, beta: f64) -> Array2<f64> {
        self.scale(self.synchronous(), alpha, beta)
    }

    /// `A * var^(-alpha) * |A / std|^beta`.
    pub fn scaled_asynchronous(&self, alpha: f64, beta: f64) -> Array2<f64> {
        self.scale(self.asynchronous(), alpha, beta)
    }

    /// Synchronous spectrum with the configured scaling, unscaled when none is set.
    pub fn sync_scaled(&self) -> Array2<f64> {
        match self.scaling {
            Some(ScalingConfig { alpha, beta }) => self.scaled_synchronous(alpha, beta),
            None => self.synchronous().clone(),
        }
    }

    /// Asynchronous spectrum with the configured scaling, unscaled when none is set.
    pub fn async_scaled(&self) -> Array2<f64> {
        match self.scaling {
            Some(ScalingConfig { alpha, beta }) => self.scaled_asynchronous(alpha, beta),
            None => self.asynchronous().clone(),
        }
    }

    /// Phase map `atan(A / S)` of the (configured) scaled spectra.
    pub fn phase(&self) -> Array2<f64> {
        let synchronous = self.sync_scaled();
        let asynchronous = self.async_scaled();
        let mut phase = Array2::zeros(synchronous.raw_dim());
        Zip::from(&mut phase)
            .and(&asynchronous)
            .and(&synchronous)
            .for_each(|p, &a, &s| *p = (a / s).atan());
        phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::UnitCategory;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array3, Axis};
    use std::f64::consts::PI;

    /// Two bands on a 5-point axis, the first growing and the second delayed.
    fn series() -> Array2<f64> {
        let t = Array1::<f64>::linspace(0.0, 1.0, 9);
        Array2::from_shape_fn((5, t.len()), |(i, j)| {
            let grow = t[j];
            let delayed = t[j] * t[j];
            match i {
                0 => 1.0 + grow,
                1 => 2.0 + 3.0 * grow + 0.5 * delayed,
                2 => 0.5 + delayed,
                3 => 1.0 - 0.2 * delayed + 0.1 * (3.0 * t[j]).sin(),
                _ => 0.25 * (5.0 * t[j]).cos(),
            }
        })
    }

    fn assert_all_close(a: &Array2<f64>, b: &Array2<f64>, epsilon: f64) {
        assert_eq!(a.dim(), b.dim());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!(*x, *y, epsilon = epsilon);
        }
    }

    #[test]
    fn test_identity_against_zero_reference() {
        let data = Array2::<f64>::eye(3);
        let reference = Array1::zeros(3);
        let mut engine = Corr2dEngine::default();
        let result = engine.analyze(data.view(), reference.view(), None).unwrap();
        assert_eq!(result.dynamic(), &data);
        assert_all_close(result.synchronous(), &(data.dot(&data.t()) / 2.0), 1e-15);
    }

    #[test]
    fn test_synchronous_is_symmetric_and_asynchronous_antisymmetric() {
        let data = series();
        let reference = data.column(0).to_owned();
        let mut engine = Corr2dEngine::default();
        let result = engine.analyze(data.view(), reference.view(), None).unwrap();
        let s = result.synchronous();
        let a = result.asynchronous();
        assert_all_close(s, &s.t().to_owned(), 1e-12);
        assert_all_close(a, &a.t().mapv(|x| -x), 1e-12);
    }

    #[test]
    fn test_centered_synchronous_is_the_covariance_matrix() {
        let data = series();
        let mut engine = Corr2dEngine::new(Corr2dConfig::centered());
        let result = engine
            .analyze(data.view(), Array1::zeros(5).view(), None)
            .unwrap();

        let m = data.ncols() as f64;
        let mean = data.mean_axis(Axis(1)).unwrap();
        for i in 0..5 {
            for k in 0..5 {
                let cov = (0..data.ncols())
                    .map(|j| (data[[i, j]] - mean[i]) * (data[[k, j]] - mean[k]))
                    .sum::<f64>()
                    / (m - 1.0);
                assert_abs_diff_eq!(result.synchronous()[[i, k]], cov, epsilon = 1e-12);
            }
        }

        // mean-centering makes the correlation coefficients Pearson coefficients
        let coeff = result.coeff_corr();
        for i in 0..4 {
            assert_abs_diff_eq!(coeff[[i, i]], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_asynchronous_two_column_value() {
        let data = array![[1.0, 0.0], [0.0, 1.0]];
        let mut engine = Corr2dEngine::default();
        let result = engine
            .analyze(data.view(), Array1::zeros(2).view(), None)
            .unwrap();
        assert_abs_diff_eq!(result.asynchronous()[[0, 1]], 1.0 / PI, epsilon = 1e-15);
        assert_abs_diff_eq!(result.asynchronous()[[1, 0]], -1.0 / PI, epsilon = 1e-15);
        assert_abs_diff_eq!(result.asynchronous()[[0, 0]], 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_scaling_with_zero_exponents_is_identity() {
        let data = series();
        let mut engine = Corr2dEngine::new(Corr2dConfig::centered());
        let result = engine
            .analyze(data.view(), Array1::zeros(5).view(), None)
            .unwrap();
        assert_all_close(&result.scaled_synchronous(0.0, 0.0), result.synchronous(), 1e-15);
        assert_all_close(&result.scaled_asynchronous(0.0, 0.0), result.asynchronous(), 1e-15);
        assert_all_close(&result.sync_scaled(), result.synchronous(), 0.0);
    }

    #[test]
    fn test_scaled_values_follow_definition() {
        let data = series();
        let config = Corr2dConfig::centered().with_scaling(0.8, 0.5);
        let mut engine = Corr2dEngine::new(config);
        let result = engine
            .analyze(data.view(), Array1::zeros(5).view(), None)
            .unwrap();
        let (i, k) = (0, 2);
        let s = result.synchronous()[[i, k]];
        let var = result.var()[i] * result.var()[k];
        let std = result.std()[i] * result.std()[k];
        let expected = s * var.powf(-0.8) * (s / std).abs().powf(0.5);
        assert_abs_diff_eq!(result.sync_scaled()[[i, k]], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_phase_is_arctangent_of_async_over_sync() {
        let data = series();
        let config = Corr2dConfig::centered().with_scaling(0.8, 0.0);
        let mut engine = Corr2dEngine::new(config);
        let result = engine
            .analyze(data.view(), Array1::zeros(5).view(), None)
            .unwrap();
        let phase = result.phase();
        let s = result.synchronous();
        let a = result.asynchronous();
        for ((p, a), s) in phase.iter().zip(a.iter()).zip(s.iter()) {
            assert_abs_diff_eq!(*p, (a / s).atan(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_variance_row_yields_nan_not_error() {
        let mut data = series();
        data.row_mut(4).fill(3.0);
        let mut engine = Corr2dEngine::new(Corr2dConfig::centered());
        let result = engine
            .analyze(data.view(), Array1::zeros(5).view(), None)
            .unwrap();
        assert!(result.coeff_corr()[[4, 4]].is_nan());
        assert!(result.phase()[[4, 4]].is_nan());
    }

    #[test]
    fn test_dimension_and_shape_errors() {
        let data = series();
        let mut engine = Corr2dEngine::default();

        let err = engine
            .analyze(data.view(), Array1::zeros(4).view(), None)
            .unwrap_err();
        assert!(matches!(err, SpectraError::DimensionMismatch { expected: 5, found: 4, .. }));

        let axis = ConvertibleAxis::new(Array1::zeros(3), UnitCategory::Spectral);
        let err = engine
            .analyze(data.view(), Array1::zeros(5).view(), Some(axis))
            .unwrap_err();
        assert!(matches!(err, SpectraError::DimensionMismatch { .. }));

        let single = Array2::<f64>::ones((5, 1));
        assert!(engine
            .analyze(single.view(), Array1::zeros(5).view(), None)
            .is_err());

        let cube = Array3::<f64>::zeros((2, 2, 2)).into_dyn();
        let err = engine
            .analyze_dyn(cube.view(), Array1::zeros(2).view(), None)
            .unwrap_err();
        assert_eq!(err, SpectraError::Shape { expected: 2, found: 3 });

        let flat = data.clone().into_dyn();
        assert!(engine
            .analyze_dyn(flat.view(), Array1::zeros(5).view(), None)
            .is_ok());
    }

    #[test]
    fn test_noda_matrix_is_shared_between_results_of_same_width() {
        let data = series();
        let mut engine = Corr2dEngine::default();
        let first = engine
            .analyze(data.view(), Array1::zeros(5).view(), None)
            .unwrap();
        let second = engine
            .analyze(data.view(), Array1::ones(5).view(), None)
            .unwrap();
        assert!(Arc::ptr_eq(first.noda(), second.noda()));
    }

    #[test]
    fn test_axis_labels_are_kept() {
        let data = series();
        let axis = ConvertibleAxis::spectral(Array1::linspace(400.0, 800.0, 5), "nm").unwrap();
        let mut engine = Corr2dEngine::default();
        let result = engine
            .analyze(data.view(), Array1::zeros(5).view(), Some(axis.clone()))
            .unwrap();
        assert_eq!(result.axis(), Some(&axis));
    }
}
