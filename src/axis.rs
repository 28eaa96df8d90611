//! Labeled measurement axes that know their physical unit.
//!
//! A [`ConvertibleAxis`] is never converted in place: [`ConvertibleAxis::convert`]
//! returns a new axis. Length is always preserved, ordering is not (reciprocal
//! units such as wavenumbers invert a monotonic wavelength axis).

use crate::error::Result;
use crate::math_tools::{indices_within, nearest_index};
use crate::units::{Unit, UnitCategory, UnitTable};
use ndarray::Array1;

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertibleAxis {
    values: Array1<f64>,
    category: UnitCategory,
    unit: Option<Unit>,
}

impl ConvertibleAxis {
    /// Creates an axis without a unit.
    pub fn new(values: Array1<f64>, category: UnitCategory) -> Self {
        ConvertibleAxis {
            values,
            category,
            unit: None,
        }
    }

    /// Creates an axis whose labels are already expressed in `code`.
    pub fn with_unit(values: Array1<f64>, category: UnitCategory, code: &str) -> Result<Self> {
        Self::with_unit_in(values, category, code, UnitTable::global())
    }

    /// Like [`ConvertibleAxis::with_unit`], resolving `code` in a custom table.
    pub fn with_unit_in(
        values: Array1<f64>,
        category: UnitCategory,
        code: &str,
        table: &UnitTable,
    ) -> Result<Self> {
        let unit = *table.lookup(category, code)?;
        Ok(ConvertibleAxis {
            values,
            category,
            unit: Some(unit),
        })
    }

    /// Shorthand for a spectral axis in `code` (e.g. `"nm"`).
    pub fn spectral(values: Array1<f64>, code: &str) -> Result<Self> {
        Self::with_unit(values, UnitCategory::Spectral, code)
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn category(&self) -> UnitCategory {
        self.category
    }

    pub fn unit(&self) -> Option<&Unit> {
        self.unit.as_ref()
    }

    pub fn unit_code(&self) -> Option<&'static str> {
        self.unit.map(|u| u.short_code())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts the axis to `target` using the standard unit table.
    pub fn convert(&self, target: Option<&str>) -> Result<ConvertibleAxis> {
        self.convert_with(target, UnitTable::global())
    }

    /// Converts the axis to `target`, resolving codes in `table`.
    ///
    /// - no unit -> no unit: unchanged.
    /// - no unit -> unit: the unit is assigned, labels are *not* rescaled.
    /// - unit -> no unit: the unit is dropped, labels unchanged.
    /// - unit -> same unit: unchanged.
    /// - unit -> other unit: every label is routed through the canonical unit.
    pub fn convert_with(&self, target: Option<&str>, table: &UnitTable) -> Result<ConvertibleAxis> {
        let Some(code) = target else {
            return Ok(ConvertibleAxis {
                values: self.values.clone(),
                category: self.category,
                unit: None,
            });
        };
        let target = *table.lookup(self.category, code)?;

        let values = match self.unit {
            // assigning a unit to unitless labels is a relabel, not a conversion
            None => self.values.clone(),
            Some(current) if current == target => self.values.clone(),
            Some(current) => self.values.mapv(|x| current.convert_unchecked(&target, x)),
        };

        Ok(ConvertibleAxis {
            values,
            category: self.category,
            unit: Some(target),
        })
    }

    /// Index of the label nearest to `value`.
    pub fn nearest_index(&self, value: f64) -> Option<usize> {
        nearest_index(&self.values.view(), value)
    }

    /// Indices of all labels within `[lo, hi]`, in axis order.
    pub fn range_indices(&self, lo: f64, hi: f64) -> Vec<usize> {
        indices_within(&self.values.view(), lo, hi)
    }

    /// New axis holding only the labels at `indices`.
    pub fn select(&self, indices: &[usize]) -> ConvertibleAxis {
        ConvertibleAxis {
            values: indices.iter().map(|&i| self.values[i]).collect(),
            category: self.category,
            unit: self.unit,
        }
    }

    /// Axis title handed to plotting code, e.g. `"Nanometers (nm)"`.
    pub fn title(&self) -> String {
        match &self.unit {
            Some(unit) => unit.to_string(),
            None => "No unit".to_string(),
        }
    }

    /// Compares labels with the relative tolerance `tol`, after bringing `other`
    /// into this axis' unit when both carry one.
    pub fn approx_eq(&self, other: &ConvertibleAxis, tol: f64) -> bool {
        if self.category != other.category || self.len() != other.len() {
            return false;
        }
        let other_values = match (self.unit, other.unit) {
            (Some(mine), Some(theirs)) if mine != theirs => {
                other.values.mapv(|x| theirs.convert_unchecked(&mine, x))
            }
            _ => other.values.clone(),
        };
        self.values
            .iter()
            .zip(other_values.iter())
            .all(|(a, b)| (a - b).abs() <= tol * a.abs().max(b.abs()).max(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpectraError;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn nm_axis() -> ConvertibleAxis {
        ConvertibleAxis::spectral(array![400.0, 500.0, 600.0, 700.0], "nm").unwrap()
    }

    #[test]
    fn test_nanometers_to_centimeters() {
        let cm = nm_axis().convert(Some("cm")).unwrap();
        assert_eq!(cm.unit_code(), Some("cm"));
        for (got, want) in cm.values().iter().zip([4.0e-5, 5.0e-5, 6.0e-5, 7.0e-5]) {
            assert_relative_eq!(*got, want, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_reciprocal_conversion_reverses_order_and_round_trips() {
        let axis = nm_axis();
        let ev = axis.convert(Some("ev")).unwrap();
        assert_relative_eq!(ev.values()[1], 2.4797, max_relative = 1e-4);
        assert!(ev.values()[0] > ev.values()[3]);

        let back = ev.convert(Some("nm")).unwrap();
        for (a, b) in back.values().iter().zip(axis.values().iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_assigning_unit_to_unitless_axis_does_not_rescale() {
        let bare = ConvertibleAxis::new(array![400.0, 500.0], UnitCategory::Spectral);
        let labelled = bare.convert(Some("cm")).unwrap();
        assert_eq!(labelled.values(), bare.values());
        assert_eq!(labelled.unit_code(), Some("cm"));
    }

    #[test]
    fn test_clearing_and_same_unit_leave_values_untouched() {
        let axis = nm_axis();
        let cleared = axis.convert(None).unwrap();
        assert_eq!(cleared.unit(), None);
        assert_eq!(cleared.values(), axis.values());

        let same = axis.convert(Some("nm")).unwrap();
        assert_eq!(same, axis);

        let bare = ConvertibleAxis::new(array![1.0], UnitCategory::Temperature);
        assert_eq!(bare.convert(None).unwrap(), bare);
    }

    #[test]
    fn test_unknown_target_unit_is_an_error() {
        let err = nm_axis().convert(Some("furlong")).unwrap_err();
        assert!(matches!(err, SpectraError::UnitNotFound { .. }));

        let bare = ConvertibleAxis::new(array![20.0], UnitCategory::Temperature);
        assert!(bare.convert(Some("nm")).is_err());
    }

    #[test]
    fn test_custom_table_conversion() {
        let table = UnitTable::empty()
            .with_unit(Unit::new("m", "Meters", "m", UnitCategory::Spectral, false, |x| x, |x| x))
            .with_unit(Unit::new(
                "a",
                "Angstrom",
                "\u{c5}",
                UnitCategory::Spectral,
                false,
                |x| x * 1e-10,
                |x| x * 1e10,
            ));
        let axis =
            ConvertibleAxis::with_unit_in(array![5000.0], UnitCategory::Spectral, "a", &table)
                .unwrap();
        let m = axis.convert_with(Some("m"), &table).unwrap();
        assert_relative_eq!(m.values()[0], 5e-7, max_relative = 1e-12);
        assert!(axis.convert_with(Some("nm"), &table).is_err());
    }

    #[test]
    fn test_lookup_helpers_and_title() {
        let axis = nm_axis();
        assert_eq!(axis.nearest_index(540.0), Some(1));
        assert_eq!(axis.range_indices(450.0, 650.0), vec![1, 2]);
        let sub = axis.select(&[3, 0]);
        assert_eq!(sub.values(), &array![700.0, 400.0]);
        assert_eq!(axis.title(), "Nanometers (nm)");
        assert_eq!(axis.convert(None).unwrap().title(), "No unit");
    }

    #[test]
    fn test_approx_eq_compares_across_units() {
        let axis = nm_axis();
        let um = axis.convert(Some("um")).unwrap();
        assert!(axis.approx_eq(&um, 1e-9));
        let shifted = ConvertibleAxis::spectral(array![401.0, 500.0, 600.0, 700.0], "nm").unwrap();
        assert!(!axis.approx_eq(&shifted, 1e-9));
    }
}
