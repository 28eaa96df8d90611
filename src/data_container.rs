//! This module defines the spectra container: a measurement matrix bound to a spectral
//! index, a variable (time, temperature, ...) axis, the current intensity representation
//! and the reference curve that representation is relative to.

use crate::axis::ConvertibleAxis;
use crate::baseline::{dynamic_baseline, BaselineRegion};
use crate::corr2d::{Corr2dEngine, Corr2dResult};
use crate::error::{ensure_len, Result, SpectraError};
use crate::intensity::{self, IntensityConversion, IntensityTable, IntensityUnit, RAW_TITLE};
use crate::units::UnitCategory;
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Labels of the columns of a [`Spectra`] matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableAxis {
    /// Numeric labels with a unit (temperature, elapsed time, concentration).
    Convertible(ConvertibleAxis),
    /// Acquisition time stamps.
    Timestamps(Vec<DateTime<Utc>>),
    /// Free text labels.
    Labels(Vec<String>),
}

impl VariableAxis {
    pub fn len(&self) -> usize {
        match self {
            VariableAxis::Convertible(axis) => axis.len(),
            VariableAxis::Timestamps(stamps) => stamps.len(),
            VariableAxis::Labels(labels) => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn select(&self, indices: &[usize]) -> VariableAxis {
        match self {
            VariableAxis::Convertible(axis) => VariableAxis::Convertible(axis.select(indices)),
            VariableAxis::Timestamps(stamps) => {
                VariableAxis::Timestamps(indices.iter().map(|&i| stamps[i]).collect())
            }
            VariableAxis::Labels(labels) => {
                VariableAxis::Labels(indices.iter().map(|&i| labels[i].clone()).collect())
            }
        }
    }

    /// Time elapsed since the first stamp, expressed in the time unit `code`.
    ///
    /// # Errors
    /// `NotConvertible` unless the axis holds time stamps, `UnitNotFound` for an
    /// unknown time unit.
    pub fn as_intervals(&self, code: &str) -> Result<VariableAxis> {
        let VariableAxis::Timestamps(stamps) = self else {
            return Err(SpectraError::NotConvertible("non-timestamp column"));
        };
        let seconds: Array1<f64> = match stamps.first() {
            Some(&first) => stamps
                .iter()
                .map(|&t| {
                    let delta = t - first;
                    delta
                        .num_microseconds()
                        .map(|us| us as f64 * 1e-6)
                        .unwrap_or_else(|| delta.num_milliseconds() as f64 * 1e-3)
                })
                .collect(),
            None => Array1::zeros(0),
        };
        let elapsed = ConvertibleAxis::with_unit(seconds, UnitCategory::Time, "s")?;
        Ok(VariableAxis::Convertible(elapsed.convert(Some(code))?))
    }

    /// Converts numeric labels to `code`; time stamps become elapsed intervals.
    pub fn convert(&self, code: &str) -> Result<VariableAxis> {
        match self {
            VariableAxis::Convertible(axis) => {
                Ok(VariableAxis::Convertible(axis.convert(Some(code))?))
            }
            VariableAxis::Timestamps(_) => self.as_intervals(code),
            VariableAxis::Labels(_) => Err(SpectraError::NotConvertible("text label column")),
        }
    }
}

/// A set of spectra sharing one spectral index.
///
/// # Fields
/// - `name`: Optional name of the data set.
/// - `data`: The measurement matrix, one spectrum per column.
/// - `index`: Spectral labels of the rows.
/// - `columns`: Labels of the columns (the perturbation axis).
/// - `iunit`: Current intensity representation, `None` for raw counts.
/// - `baseline`: Reference curve the representation is relative to, indexed like the rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectra {
    name: Option<String>,
    data: Array2<f64>,
    index: ConvertibleAxis,
    columns: VariableAxis,
    iunit: Option<IntensityUnit>,
    baseline: Option<Array1<f64>>,
}

impl Spectra {
    /// Creates raw spectra without a baseline.
    ///
    /// # Errors
    /// `DimensionMismatch` when the index or column labels do not match the matrix shape.
    pub fn new(data: Array2<f64>, index: ConvertibleAxis, columns: VariableAxis) -> Result<Self> {
        ensure_len("spectral index length", data.nrows(), index.len())?;
        ensure_len("column label count", data.ncols(), columns.len())?;
        Ok(Spectra {
            name: None,
            data,
            index,
            columns,
            iunit: None,
            baseline: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn index(&self) -> &ConvertibleAxis {
        &self.index
    }

    pub fn columns(&self) -> &VariableAxis {
        &self.columns
    }

    pub fn iunit(&self) -> Option<&IntensityUnit> {
        self.iunit.as_ref()
    }

    pub fn iunit_code(&self) -> Option<&'static str> {
        self.iunit.map(|u| u.code())
    }

    /// Title of the intensity axis for plotting.
    pub fn iunit_title(&self) -> &'static str {
        self.iunit.map(|u| u.full_name()).unwrap_or(RAW_TITLE)
    }

    pub fn baseline(&self) -> Option<&Array1<f64>> {
        self.baseline.as_ref()
    }

    /// `(rows, columns)` of the matrix.
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Replaces the stored baseline of raw data.
    ///
    /// # Errors
    /// `ReferencedBaseline` once the data is in a referenced representation, since the
    /// data would no longer match its baseline. Re-reference such data with
    /// [`Spectra::as_iunit_with_baseline`] instead.
    pub fn set_baseline(&mut self, baseline: Option<Array1<f64>>) -> Result<()> {
        if self.iunit.is_some() {
            return Err(SpectraError::ReferencedBaseline);
        }
        if let Some(b) = &baseline {
            ensure_len("baseline length", self.data.nrows(), b.len())?;
        }
        self.baseline = baseline;
        Ok(())
    }

    /// Stores a labeled baseline after checking its labels match the spectral index.
    pub fn set_baseline_series(
        &mut self,
        labels: &ConvertibleAxis,
        values: Array1<f64>,
    ) -> Result<()> {
        ensure_len("baseline label count", values.len(), labels.len())?;
        ensure_len("baseline length", self.index.len(), labels.len())?;
        if !self.index.approx_eq(labels, 1e-9) {
            let aligned = match (self.index.unit_code(), labels.unit_code()) {
                (Some(code), Some(_)) => labels.convert(Some(code))?,
                _ => labels.clone(),
            };
            let matching = self
                .index
                .values()
                .iter()
                .zip(aligned.values().iter())
                .filter(|(a, b)| (**a - **b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0))
                .count();
            return Err(SpectraError::DimensionMismatch {
                context: "baseline labels matching the spectral index",
                expected: self.index.len(),
                found: matching,
            });
        }
        self.set_baseline(Some(values))
    }

    /// Computes the data in another intensity representation without modifying `self`.
    ///
    /// # Arguments
    /// - `code`: Target representation, `None` for raw counts.
    /// - `baseline`: Explicit reference curve; the stored one is used otherwise.
    pub fn compute_iunit(
        &self,
        code: Option<&str>,
        baseline: Option<ArrayView1<f64>>,
    ) -> Result<IntensityConversion> {
        let to = IntensityTable::global().resolve(code)?;
        intensity::convert(
            self.data.view(),
            self.baseline.as_ref().map(|b| b.view()),
            baseline,
            self.iunit.as_ref(),
            to.as_ref(),
        )
    }

    /// Applies a conversion computed by [`Spectra::compute_iunit`].
    pub fn apply_conversion(&mut self, conversion: IntensityConversion) -> Result<()> {
        ensure_len("converted row count", self.data.nrows(), conversion.data.nrows())?;
        ensure_len("converted column count", self.data.ncols(), conversion.data.ncols())?;
        if let Some(b) = &conversion.baseline {
            ensure_len("baseline length", self.data.nrows(), b.len())?;
        }
        self.data = conversion.data;
        self.baseline = conversion.baseline;
        self.iunit = conversion.iunit;
        Ok(())
    }

    /// Returns a copy in the intensity representation `code` (`None` for raw counts).
    pub fn as_iunit(&self, code: Option<&str>) -> Result<Spectra> {
        self.as_iunit_with_baseline(code, None)
    }

    /// Returns a copy in the representation `code` referenced against `baseline`, which
    /// becomes the copy's stored baseline.
    pub fn as_iunit_with_baseline(
        &self,
        code: Option<&str>,
        baseline: Option<ArrayView1<f64>>,
    ) -> Result<Spectra> {
        let conversion = self.compute_iunit(code, baseline)?;
        Ok(Spectra {
            name: self.name.clone(),
            data: conversion.data,
            index: self.index.clone(),
            columns: self.columns.clone(),
            iunit: conversion.iunit,
            baseline: conversion.baseline,
        })
    }

    /// Returns a copy whose spectral index is expressed in `code`.
    pub fn as_specunit(&self, code: Option<&str>) -> Result<Spectra> {
        let mut out = self.clone();
        out.index = self.index.convert(code)?;
        Ok(out)
    }

    /// Returns a copy whose column labels are expressed in `code`.
    pub fn as_varunit(&self, code: &str) -> Result<Spectra> {
        let mut out = self.clone();
        out.columns = self.columns.convert(code)?;
        Ok(out)
    }

    /// Rows whose spectral labels lie within `[lo, hi]`; the baseline is sliced along.
    pub fn slice_index(&self, lo: f64, hi: f64) -> Spectra {
        let rows = self.index.range_indices(lo, hi);
        Spectra {
            name: self.name.clone(),
            data: self.data.select(Axis(0), &rows),
            index: self.index.select(&rows),
            columns: self.columns.clone(),
            iunit: self.iunit,
            baseline: self.baseline.as_ref().map(|b| b.select(Axis(0), &rows)),
        }
    }

    /// Row nearest to the spectral label `value`.
    pub fn nearest(&self, value: f64) -> Option<ArrayView1<'_, f64>> {
        self.index.nearest_index(value).map(|i| self.data.row(i))
    }

    /// Column `j`, e.g. to use a spectrum as reference.
    pub fn column(&self, j: usize) -> Option<ArrayView1<'_, f64>> {
        (j < self.data.ncols()).then(|| self.data.column(j))
    }

    /// Per-column linear baseline through the given index regions.
    pub fn fitted_baseline(&self, regions: &[BaselineRegion]) -> Result<Array2<f64>> {
        dynamic_baseline(&self.index.values().view(), &self.data.view(), regions)
    }

    /// Returns a copy with the fitted per-column baseline subtracted.
    pub fn subtract_fitted_baseline(&self, regions: &[BaselineRegion]) -> Result<Spectra> {
        let fitted = self.fitted_baseline(regions)?;
        let mut out = self.clone();
        out.data -= &fitted;
        Ok(out)
    }

    /// Runs a 2D correlation analysis of the matrix against `reference`, labeling the
    /// result with the spectral index.
    pub fn corr2d(
        &self,
        engine: &mut Corr2dEngine,
        reference: ArrayView1<f64>,
    ) -> Result<Corr2dResult> {
        engine.analyze(self.data.view(), reference, Some(self.index.clone()))
    }
}
