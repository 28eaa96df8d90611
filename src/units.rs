//! Registries of convertible physical units.
//!
//! Every unit belongs to exactly one [`UnitCategory`] and carries a pair of pure
//! functions mapping values to and from the canonical unit of that category.
//! Cross conversions are always `to.from_canonical(from.to_canonical(x))`, so
//! adding a unit only means registering one more record.

use crate::error::{Result, SpectraError};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt::{Display, Formatter};

/// Speed of light in vacuum in m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
/// Planck constant in J·s.
pub const PLANCK: f64 = 6.626_070_15e-34;
/// Joules per electron-volt.
pub const JOULES_PER_EV: f64 = 1.602_176_634e-19;

/// Physical quantity a unit measures. Conversions never cross categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitCategory {
    /// Wavelength and its reciprocal quantities; canonical unit is meters.
    Spectral,
    /// Canonical unit is Kelvin.
    Temperature,
    /// Solute concentration; canonical unit is molar.
    Concentration,
    /// Elapsed time; canonical unit is seconds.
    Time,
}

impl UnitCategory {
    /// Short code of the canonical unit of this category.
    pub fn canonical_code(&self) -> &'static str {
        match self {
            UnitCategory::Spectral => "m",
            UnitCategory::Temperature => "k",
            UnitCategory::Concentration => "m",
            UnitCategory::Time => "s",
        }
    }
}

impl Display for UnitCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitCategory::Spectral => write!(f, "spectral"),
            UnitCategory::Temperature => write!(f, "temperature"),
            UnitCategory::Concentration => write!(f, "concentration"),
            UnitCategory::Time => write!(f, "time"),
        }
    }
}

/// Immutable description of a single unit.
#[derive(Debug, Clone, Copy)]
pub struct Unit {
    short_code: &'static str,
    full_name: &'static str,
    symbol: &'static str,
    category: UnitCategory,
    is_reciprocal: bool,
    to_canonical: fn(f64) -> f64,
    from_canonical: fn(f64) -> f64,
}

impl Unit {
    pub fn new(
        short_code: &'static str,
        full_name: &'static str,
        symbol: &'static str,
        category: UnitCategory,
        is_reciprocal: bool,
        to_canonical: fn(f64) -> f64,
        from_canonical: fn(f64) -> f64,
    ) -> Self {
        Unit {
            short_code,
            full_name,
            symbol,
            category,
            is_reciprocal,
            to_canonical,
            from_canonical,
        }
    }

    pub fn short_code(&self) -> &'static str {
        self.short_code
    }

    pub fn full_name(&self) -> &'static str {
        self.full_name
    }

    pub fn symbol(&self) -> &'static str {
        self.symbol
    }

    pub fn category(&self) -> UnitCategory {
        self.category
    }

    /// True when the quantity is inversely related to the canonical unit
    /// (wavenumber, frequency, energy). Conversions to such a unit reverse
    /// the ordering of an axis.
    pub fn is_reciprocal(&self) -> bool {
        self.is_reciprocal
    }

    pub fn to_canonical(&self, value: f64) -> f64 {
        (self.to_canonical)(value)
    }

    pub fn from_canonical(&self, value: f64) -> f64 {
        (self.from_canonical)(value)
    }

    /// Converts `value` expressed in `self` into `target`, pivoting through the
    /// canonical unit.
    ///
    /// # Errors
    /// `CategoryMismatch` when the units measure different quantities.
    pub fn convert_to(&self, target: &Unit, value: f64) -> Result<f64> {
        if self.category != target.category {
            return Err(SpectraError::CategoryMismatch {
                from: self.category,
                to: target.category,
            });
        }
        Ok(self.convert_unchecked(target, value))
    }

    /// [`Unit::convert_to`] for callers that already resolved both units in one category.
    pub(crate) fn convert_unchecked(&self, target: &Unit, value: f64) -> f64 {
        target.from_canonical(self.to_canonical(value))
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category && self.short_code == other.short_code
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.full_name, self.symbol)
    }
}

static GLOBAL_UNITS: Lazy<UnitTable> = Lazy::new(UnitTable::standard);

/// Lookup table from short code to [`Unit`], partitioned by category.
///
/// The table is read-only once built. [`UnitTable::global`] exposes the
/// standard table; custom tables can be assembled with [`UnitTable::with_unit`]
/// and passed explicitly wherever a conversion takes a table.
#[derive(Debug, Clone, Default)]
pub struct UnitTable {
    categories: BTreeMap<UnitCategory, BTreeMap<String, Unit>>,
}

impl UnitTable {
    pub fn empty() -> Self {
        UnitTable::default()
    }

    /// The process-wide standard table.
    pub fn global() -> &'static UnitTable {
        &GLOBAL_UNITS
    }

    /// Builds the standard spectral, temperature, concentration and time units.
    pub fn standard() -> Self {
        use UnitCategory::*;

        UnitTable::empty()
            // spectral: proportional wavelength units
            .with_unit(Unit::new("m", "Meters", "m", Spectral, false, |x| x, |x| x))
            .with_unit(Unit::new(
                "cm",
                "Centimeters",
                "cm",
                Spectral,
                false,
                |x| x * 1e-2,
                |x| x * 1e2,
            ))
            .with_unit(Unit::new(
                "um",
                "Micrometers",
                "\u{3bc}m",
                Spectral,
                false,
                |x| x * 1e-6,
                |x| x * 1e6,
            ))
            .with_unit(Unit::new(
                "nm",
                "Nanometers",
                "nm",
                Spectral,
                false,
                |x| x * 1e-9,
                |x| x * 1e9,
            ))
            // spectral: reciprocal quantities
            .with_unit(Unit::new(
                "m-1",
                "Inverse meters",
                "m\u{207b}\u{b9}",
                Spectral,
                true,
                |x| 1.0 / x,
                |x| 1.0 / x,
            ))
            .with_unit(Unit::new(
                "cm-1",
                "Wavenumber",
                "cm\u{207b}\u{b9}",
                Spectral,
                true,
                |x| 1e-2 / x,
                |x| 1e-2 / x,
            ))
            .with_unit(Unit::new(
                "hz",
                "Hertz",
                "Hz",
                Spectral,
                true,
                |x| SPEED_OF_LIGHT / x,
                |x| SPEED_OF_LIGHT / x,
            ))
            .with_unit(Unit::new(
                "ghz",
                "Gigahertz",
                "GHz",
                Spectral,
                true,
                |x| SPEED_OF_LIGHT / (x * 1e9),
                |x| SPEED_OF_LIGHT / x * 1e-9,
            ))
            .with_unit(Unit::new(
                "thz",
                "Terahertz",
                "THz",
                Spectral,
                true,
                |x| SPEED_OF_LIGHT / (x * 1e12),
                |x| SPEED_OF_LIGHT / x * 1e-12,
            ))
            .with_unit(Unit::new(
                "rad/s",
                "Angular frequency",
                "rad/s",
                Spectral,
                true,
                |x| 2.0 * PI * SPEED_OF_LIGHT / x,
                |x| 2.0 * PI * SPEED_OF_LIGHT / x,
            ))
            .with_unit(Unit::new(
                "ev",
                "Electron volts",
                "eV",
                Spectral,
                true,
                |x| PLANCK * SPEED_OF_LIGHT / (JOULES_PER_EV * x),
                |x| PLANCK * SPEED_OF_LIGHT / (JOULES_PER_EV * x),
            ))
            // temperature
            .with_unit(Unit::new("k", "Kelvin", "K", Temperature, false, |x| x, |x| x))
            .with_unit(Unit::new(
                "c",
                "Celsius",
                "\u{b0}C",
                Temperature,
                false,
                |x| x + 273.15,
                |x| x - 273.15,
            ))
            .with_unit(Unit::new(
                "f",
                "Fahrenheit",
                "\u{b0}F",
                Temperature,
                false,
                |x| (x - 32.0) / 1.8 + 273.15,
                |x| (x - 273.15) * 1.8 + 32.0,
            ))
            // solute concentration
            .with_unit(Unit::new("m", "Molar", "M", Concentration, false, |x| x, |x| x))
            .with_unit(Unit::new(
                "mm",
                "Millimolar",
                "mM",
                Concentration,
                false,
                |x| x * 1e-3,
                |x| x * 1e3,
            ))
            .with_unit(Unit::new(
                "um",
                "Micromolar",
                "\u{3bc}M",
                Concentration,
                false,
                |x| x * 1e-6,
                |x| x * 1e6,
            ))
            .with_unit(Unit::new(
                "nm",
                "Nanomolar",
                "nM",
                Concentration,
                false,
                |x| x * 1e-9,
                |x| x * 1e9,
            ))
            .with_unit(Unit::new(
                "pm",
                "Picomolar",
                "pM",
                Concentration,
                false,
                |x| x * 1e-12,
                |x| x * 1e12,
            ))
            // elapsed time
            .with_unit(Unit::new("s", "Seconds", "s", Time, false, |x| x, |x| x))
            .with_unit(Unit::new(
                "ms",
                "Milliseconds",
                "ms",
                Time,
                false,
                |x| x * 1e-3,
                |x| x * 1e3,
            ))
            .with_unit(Unit::new(
                "us",
                "Microseconds",
                "\u{3bc}s",
                Time,
                false,
                |x| x * 1e-6,
                |x| x * 1e6,
            ))
            .with_unit(Unit::new(
                "ns",
                "Nanoseconds",
                "ns",
                Time,
                false,
                |x| x * 1e-9,
                |x| x * 1e9,
            ))
            .with_unit(Unit::new(
                "min",
                "Minutes",
                "min",
                Time,
                false,
                |x| x * 60.0,
                |x| x / 60.0,
            ))
            .with_unit(Unit::new(
                "h",
                "Hours",
                "h",
                Time,
                false,
                |x| x * 3600.0,
                |x| x / 3600.0,
            ))
            .with_unit(Unit::new(
                "d",
                "Days",
                "d",
                Time,
                false,
                |x| x * 86400.0,
                |x| x / 86400.0,
            ))
    }

    /// Adds (or replaces) a unit and returns the table.
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.insert(unit);
        self
    }

    /// Adds a unit, returning the one it replaced, if any. Codes are matched
    /// case-insensitively, so `"A"` and `"a"` name the same entry.
    pub fn insert(&mut self, unit: Unit) -> Option<Unit> {
        self.categories
            .entry(unit.category)
            .or_default()
            .insert(unit.short_code.to_ascii_lowercase(), unit)
    }

    /// Looks up `code` (case-insensitive) within `category`.
    pub fn lookup(&self, category: UnitCategory, code: &str) -> Result<&Unit> {
        let key = code.to_ascii_lowercase();
        self.categories
            .get(&category)
            .and_then(|units| units.get(&key))
            .ok_or_else(|| SpectraError::UnitNotFound {
                category,
                code: code.to_string(),
            })
    }

    pub fn contains(&self, category: UnitCategory, code: &str) -> bool {
        self.lookup(category, code).is_ok()
    }

    /// All units registered for `category`, ordered by short code.
    pub fn units(&self, category: UnitCategory) -> impl Iterator<Item = &Unit> + '_ {
        self.categories
            .get(&category)
            .into_iter()
            .flat_map(|units| units.values())
    }

    /// Converts a single value between two units of the same category.
    pub fn convert(&self, category: UnitCategory, value: f64, from: &str, to: &str) -> Result<f64> {
        let from = self.lookup(category, from)?;
        let to = self.lookup(category, to)?;
        Ok(from.convert_unchecked(to, value))
    }
}
