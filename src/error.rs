//! Error type shared by every module of the crate.
//!
//! Numeric domain problems (log of a non-positive ratio, division by a zero
//! variance) are not errors: they surface as IEEE NaN/Inf in the results.

use crate::units::UnitCategory;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpectraError {
    #[error("unit '{code}' is not registered in the {category} category")]
    UnitNotFound { category: UnitCategory, code: String },

    #[error("cannot convert between {from} and {to} units")]
    CategoryMismatch {
        from: UnitCategory,
        to: UnitCategory,
    },

    #[error("intensity unit '{0}' is not registered")]
    UnknownIntensityUnit(String),

    #[error("a baseline is required for this intensity conversion but none is available")]
    MissingBaseline,

    #[error("{context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("expected a {expected}-dimensional array, found {found} dimensions")]
    Shape { expected: usize, found: usize },

    #[error("the baseline of referenced data only changes through an intensity conversion")]
    ReferencedBaseline,

    #[error("an explicit baseline cannot be used to return referenced data to raw counts")]
    ConflictingBaseline,

    #[error("singular linear fit: {0}")]
    SingularFit(String),

    #[error("the {0} axis cannot be converted")]
    NotConvertible(&'static str),
}

pub type Result<T> = std::result::Result<T, SpectraError>;

/// Returns a `DimensionMismatch` unless `found == expected`.
pub(crate) fn ensure_len(context: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(SpectraError::DimensionMismatch {
            context,
            expected,
            found,
        })
    }
}
