//! Intensity representations of a spectral matrix.
//!
//! Raw counts (`None`) can be expressed relative to a reference curve (the baseline)
//! as transmittance, absorbance, etc. Every referenced unit registers a transform
//! from the ratio `data / baseline` and its inverse. [`convert`] is a pure function:
//! it returns the converted matrix together with the baseline it used, and leaves
//! applying the result to a container to the caller.

use crate::error::{ensure_len, Result, SpectraError};
use crate::math_tools::as_column;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Zip};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Axis title used for raw (unreferenced) data.
pub const RAW_TITLE: &str = "Counts";

/// A referenced intensity representation.
#[derive(Debug, Clone, Copy)]
pub struct IntensityUnit {
    code: &'static str,
    full_name: &'static str,
    transform: fn(f64) -> f64,
    inverse: fn(f64) -> f64,
}

impl IntensityUnit {
    /// # Arguments
    /// - `code`: Short code used for lookups (e.g. `"a"`).
    /// - `full_name`: Human readable name used for axis titles.
    /// - `transform`: Maps the ratio `data / baseline` to the representation.
    /// - `inverse`: Maps the representation back to the ratio.
    pub fn new(
        code: &'static str,
        full_name: &'static str,
        transform: fn(f64) -> f64,
        inverse: fn(f64) -> f64,
    ) -> Self {
        IntensityUnit {
            code,
            full_name,
            transform,
            inverse,
        }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn full_name(&self) -> &'static str {
        self.full_name
    }

    pub fn transform(&self, ratio: f64) -> f64 {
        (self.transform)(ratio)
    }

    pub fn inverse(&self, value: f64) -> f64 {
        (self.inverse)(value)
    }
}

impl PartialEq for IntensityUnit {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Display for IntensityUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_name)
    }
}

static GLOBAL_INTENSITY_UNITS: Lazy<IntensityTable> = Lazy::new(IntensityTable::standard);

/// Registry of referenced intensity units keyed by code.
#[derive(Debug, Clone, Default)]
pub struct IntensityTable {
    units: BTreeMap<String, IntensityUnit>,
}

impl IntensityTable {
    pub fn empty() -> Self {
        IntensityTable::default()
    }

    pub fn global() -> &'static IntensityTable {
        &GLOBAL_INTENSITY_UNITS
    }

    /// Transmittance, percent transmittance, inverse transmittance and base 10 / base e
    /// absorbance.
    pub fn standard() -> Self {
        IntensityTable::empty()
            .with_unit(IntensityUnit::new("t", "Transmittance", |r| r, |v| v))
            .with_unit(IntensityUnit::new(
                "%t",
                "(%) Transmittance",
                |r| 100.0 * r,
                |v| v / 100.0,
            ))
            .with_unit(IntensityUnit::new(
                "r",
                "Inverse Transmittance (1/T)",
                |r| 1.0 / r,
                |v| 1.0 / v,
            ))
            .with_unit(IntensityUnit::new(
                "a",
                "Absorbance (base 10)",
                |r| -r.log10(),
                |v| 10f64.powf(-v),
            ))
            .with_unit(IntensityUnit::new(
                "a(ln)",
                "Absorbance (base e)",
                |r| -r.ln(),
                |v| (-v).exp(),
            ))
    }

    pub fn with_unit(mut self, unit: IntensityUnit) -> Self {
        self.units.insert(unit.code.to_ascii_lowercase(), unit);
        self
    }

    pub fn lookup(&self, code: &str) -> Result<&IntensityUnit> {
        self.units
            .get(&code.to_ascii_lowercase())
            .ok_or_else(|| SpectraError::UnknownIntensityUnit(code.to_string()))
    }

    /// Resolves an optional code; `None` stands for raw data.
    pub fn resolve(&self, code: Option<&str>) -> Result<Option<IntensityUnit>> {
        code.map(|c| self.lookup(c).copied()).transpose()
    }

    pub fn units(&self) -> impl Iterator<Item = &IntensityUnit> + '_ {
        self.units.values()
    }
}

/// Outcome of an intensity conversion: the new matrix, the baseline that was used
/// (the container's baseline from now on) and the new representation.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityConversion {
    pub data: Array2<f64>,
    pub baseline: Option<Array1<f64>>,
    pub iunit: Option<IntensityUnit>,
}

/// Converts `data` (rows indexed like the baseline) from one representation to another.
///
/// # Arguments
/// - `data`: The matrix in representation `from`.
/// - `stored_baseline`: The baseline the data currently refers to, if any.
/// - `new_baseline`: An explicit baseline to reference against instead of the stored one.
///   Returning referenced data to raw counts needs the baseline it was referenced
///   against, so an explicit baseline is only accepted there when none is stored.
/// - `from`, `to`: Source and target representations, `None` meaning raw counts.
///
/// # Returns
/// The converted matrix and the baseline that was used. Going back to raw keeps the
/// baseline so the data can be referenced again later.
///
/// # Errors
/// - `DimensionMismatch` when a baseline length differs from the row count.
/// - `MissingBaseline` when a referenced representation is involved and no baseline
///   is available to define it.
/// - `ConflictingBaseline` when going back to raw with both a stored and an explicit
///   baseline.
pub fn convert(
    data: ArrayView2<f64>,
    stored_baseline: Option<ArrayView1<f64>>,
    new_baseline: Option<ArrayView1<f64>>,
    from: Option<&IntensityUnit>,
    to: Option<&IntensityUnit>,
) -> Result<IntensityConversion> {
    let stored_baseline = stored_baseline.as_ref().map(|b| b.view());
    let new_baseline = new_baseline.as_ref().map(|b| b.view());
    let rows = data.nrows();
    if let Some(b) = &stored_baseline {
        ensure_len("stored baseline length", rows, b.len())?;
    }
    if let Some(b) = &new_baseline {
        ensure_len("baseline length", rows, b.len())?;
    }

    match (from, to) {
        (None, None) => Ok(IntensityConversion {
            data: data.to_owned(),
            baseline: new_baseline.or(stored_baseline).map(|b| b.to_owned()),
            iunit: None,
        }),
        (Some(a), Some(b)) if a == b && new_baseline.is_none() => Ok(IntensityConversion {
            data: data.to_owned(),
            baseline: stored_baseline.map(|b| b.to_owned()),
            iunit: Some(*a),
        }),
        (None, Some(to)) => {
            let baseline = new_baseline
                .or(stored_baseline)
                .ok_or(SpectraError::MissingBaseline)?;
            let mut out = Array2::zeros(data.raw_dim());
            Zip::from(&mut out)
                .and(&data)
                .and_broadcast(&as_column(baseline.view()))
                .for_each(|o, &d, &b| *o = to.transform(d / b));
            Ok(IntensityConversion {
                data: out,
                baseline: Some(baseline.to_owned()),
                iunit: Some(*to),
            })
        }
        (Some(from), Some(to)) => {
            let old = stored_baseline.ok_or(SpectraError::MissingBaseline)?;
            let new = new_baseline.unwrap_or(old);
            let mut out = Array2::zeros(data.raw_dim());
            Zip::from(&mut out)
                .and(&data)
                .and_broadcast(&as_column(old.view()))
                .and_broadcast(&as_column(new.view()))
                .for_each(|o, &d, &b_old, &b_new| {
                    *o = to.transform(from.inverse(d) * b_old / b_new)
                });
            Ok(IntensityConversion {
                data: out,
                baseline: Some(new.to_owned()),
                iunit: Some(*to),
            })
        }
        (Some(from), None) => {
            let baseline = match (stored_baseline, new_baseline) {
                (Some(_), Some(_)) => return Err(SpectraError::ConflictingBaseline),
                (stored, new) => stored.or(new).ok_or(SpectraError::MissingBaseline)?,
            };
            let mut out = Array2::zeros(data.raw_dim());
            Zip::from(&mut out)
                .and(&data)
                .and_broadcast(&as_column(baseline.view()))
                .for_each(|o, &d, &b| *o = from.inverse(d) * b);
            Ok(IntensityConversion {
                data: out,
                baseline: Some(baseline.to_owned()),
                iunit: None,
            })
        }
    }
}
