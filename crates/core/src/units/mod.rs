//! Unit tables and lightweight unit detection for CAD exchange files.
//!
//! Conversion is plain table lookup through the SI base unit of each kind;
//! nothing here tries to be a general units library.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::Units;

/// Physical quantity a unit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Length,
    Angle,
    Area,
    Volume,
    Mass,
}

impl UnitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UnitKind::Length => "length",
            UnitKind::Angle => "angle",
            UnitKind::Area => "area",
            UnitKind::Volume => "volume",
            UnitKind::Mass => "mass",
        }
    }

    /// SI base unit for this kind.
    pub fn si_unit(self) -> &'static str {
        match self {
            UnitKind::Length => "m",
            UnitKind::Angle => "rad",
            UnitKind::Area => "m²",
            UnitKind::Volume => "m³",
            UnitKind::Mass => "kg",
        }
    }

    fn table(self) -> &'static [(&'static str, f64)] {
        match self {
            UnitKind::Length => LENGTH_UNITS,
            UnitKind::Angle => ANGLE_UNITS,
            UnitKind::Area => AREA_UNITS,
            UnitKind::Volume => VOLUME_UNITS,
            UnitKind::Mass => MASS_UNITS,
        }
    }
}

impl FromStr for UnitKind {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "length" => Ok(UnitKind::Length),
            "angle" => Ok(UnitKind::Angle),
            "area" => Ok(UnitKind::Area),
            "volume" => Ok(UnitKind::Volume),
            "mass" => Ok(UnitKind::Mass),
            other => Err(UnitError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("Unknown unit type: {0}")]
    UnknownKind(String),

    #[error("Unknown {kind} unit: {unit}")]
    UnknownUnit { kind: UnitKind, unit: String },
}

// Factors to the SI base unit of each kind.
const LENGTH_UNITS: &[(&str, f64)] = &[
    ("m", 1.0),
    ("mm", 0.001),
    ("cm", 0.01),
    ("km", 1000.0),
    ("μm", 1e-6),
    ("micron", 1e-6),
    ("nm", 1e-9),
    ("in", 0.0254),
    ("inch", 0.0254),
    ("ft", 0.3048),
    ("foot", 0.3048),
    ("yd", 0.9144),
    ("yard", 0.9144),
    ("mile", 1609.344),
    ("thou", 2.54e-5),
    ("mil", 2.54e-5),
];

const ANGLE_UNITS: &[(&str, f64)] = &[
    ("rad", 1.0),
    ("radian", 1.0),
    ("deg", std::f64::consts::PI / 180.0),
    ("degree", std::f64::consts::PI / 180.0),
    ("°", std::f64::consts::PI / 180.0),
    ("grad", std::f64::consts::PI / 200.0),
    ("turn", std::f64::consts::TAU),
];

const AREA_UNITS: &[(&str, f64)] = &[
    ("m²", 1.0),
    ("mm²", 1e-6),
    ("cm²", 1e-4),
    ("in²", 0.00064516),
    ("ft²", 0.09290304),
];

const VOLUME_UNITS: &[(&str, f64)] = &[
    ("m³", 1.0),
    ("mm³", 1e-9),
    ("cm³", 1e-6),
    ("in³", 1.6387064e-5),
    ("ft³", 0.028316846592),
    ("l", 0.001),
    ("liter", 0.001),
];

const MASS_UNITS: &[(&str, f64)] = &[
    ("kg", 1.0),
    ("g", 0.001),
    ("mg", 1e-6),
    ("t", 1000.0),
    ("lb", 0.45359237),
    ("oz", 0.028349523125),
];

/// Default unit set for STEP-derived models.
pub fn default_step_units() -> Units {
    [("length", "mm"), ("angle", "deg"), ("area", "mm²"), ("volume", "mm³"), ("mass", "kg")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Map STEP/IGES spellings (`MILLIMETRE`, `DEGREES`, ...) to short names.
/// Unknown names come back lower-cased and trimmed.
pub fn normalize_unit_name(unit: &str) -> String {
    let lowered = unit.trim().to_lowercase();
    let mapped = match lowered.as_str() {
        "millimetre" | "millimeter" => "mm",
        "metre" | "meter" => "m",
        "centimetre" | "centimeter" => "cm",
        "kilometre" | "kilometer" => "km",
        "micrometre" | "micrometer" => "μm",
        "nanometre" | "nanometer" => "nm",
        "degree" | "degrees" => "deg",
        "radian" | "radians" => "rad",
        "inch" | "inches" => "in",
        "foot" | "feet" => "ft",
        "yard" | "yards" => "yd",
        "kilogram" => "kg",
        "gram" => "g",
        "pound" => "lb",
        "ounce" => "oz",
        _ => return lowered,
    };
    mapped.to_string()
}

fn factor_to_si(unit: &str, kind: UnitKind) -> Result<f64, UnitError> {
    let normalized = normalize_unit_name(unit);
    kind.table()
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, factor)| *factor)
        .ok_or_else(|| UnitError::UnknownUnit { kind, unit: unit.to_string() })
}

/// Multiplication factor converting `from` into `to`.
pub fn conversion_factor(from: &str, to: &str, kind: UnitKind) -> Result<f64, UnitError> {
    Ok(factor_to_si(from, kind)? / factor_to_si(to, kind)?)
}

pub fn convert(value: f64, from: &str, to: &str, kind: UnitKind) -> Result<f64, UnitError> {
    Ok(value * conversion_factor(from, to, kind)?)
}

pub fn to_si(value: f64, unit: &str, kind: UnitKind) -> Result<f64, UnitError> {
    convert(value, unit, kind.si_unit(), kind)
}

/// Guess length and angle units from header text.
///
/// Starts from `{length: mm, angle: deg}`. Millimetres are checked before
/// metres (every `MILLIMETRE` also contains `METRE`), metres before inches.
pub fn detect_units(header: &str) -> Units {
    let mut units = crate::model::default_units();
    let text = header.to_uppercase();

    if text.contains("MILLIMETRE") || text.contains(".MILLI.,.METRE.") {
        units.insert("length".into(), "mm".into());
    } else if text.contains("METRE") || text.contains("METER") {
        units.insert("length".into(), "m".into());
    } else if text.contains("INCH") {
        units.insert("length".into(), "in".into());
    }

    if text.contains("DEGREE") {
        units.insert("angle".into(), "deg".into());
    } else if text.contains("RADIAN") {
        units.insert("angle".into(), "rad".into());
    }

    units
}

/// Human-readable unit listing, with SI factors where they are not 1.
pub fn format_units(units: &Units) -> String {
    let mut lines = vec!["Units:".to_string()];
    for (kind_name, unit) in units {
        let mut line = format!("  {kind_name}: {unit}");
        let factor = kind_name
            .parse::<UnitKind>()
            .ok()
            .and_then(|kind| conversion_factor(unit, kind.si_unit(), kind).ok());
        if let Some(factor) = factor.filter(|f| *f != 1.0) {
            line.push_str(&format!(" (×{factor} to SI)"));
        }
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn converts_lengths_through_si() {
        assert!(approx(convert(1000.0, "mm", "m", UnitKind::Length).unwrap(), 1.0));
        assert!(approx(convert(1.0, "in", "mm", UnitKind::Length).unwrap(), 25.4));
        assert!(approx(convert(1.0, "INCHES", "mm", UnitKind::Length).unwrap(), 25.4));
    }

    #[test]
    fn converts_angles() {
        let rad = convert(90.0, "deg", "rad", UnitKind::Angle).unwrap();
        assert!(approx(rad, std::f64::consts::FRAC_PI_2));
        assert!(approx(to_si(1.0, "turn", UnitKind::Angle).unwrap(), std::f64::consts::TAU));
    }

    #[test]
    fn unknown_units_and_kinds_fail() {
        let err = convert(1.0, "furlong", "m", UnitKind::Length).unwrap_err();
        assert_eq!(err, UnitError::UnknownUnit { kind: UnitKind::Length, unit: "furlong".into() });
        assert_eq!("speed".parse::<UnitKind>().unwrap_err(), UnitError::UnknownKind("speed".into()));
    }

    #[test]
    fn normalizes_step_spellings() {
        assert_eq!(normalize_unit_name("MILLIMETRE"), "mm");
        assert_eq!(normalize_unit_name(" Degree "), "deg");
        assert_eq!(normalize_unit_name("parsec"), "parsec");
    }

    #[test]
    fn detects_units_from_header_keywords() {
        let defaults = detect_units("ISO-10303-21; HEADER; ENDSEC;");
        assert_eq!(defaults["length"], "mm");
        assert_eq!(defaults["angle"], "deg");

        let inch = detect_units("#10=CONVERSION_BASED_UNIT('INCH',#11);");
        assert_eq!(inch["length"], "in");

        let metre = detect_units("#5=( LENGTH_UNIT() NAMED_UNIT(*) SI_UNIT($,.METRE.) ); #6=SI_UNIT($,.RADIAN.)");
        assert_eq!(metre["length"], "m");
        assert_eq!(metre["angle"], "rad");

        let milli = detect_units("SI_UNIT(.MILLI.,.METRE.)");
        assert_eq!(milli["length"], "mm");
    }

    #[test]
    fn format_units_lists_si_factors() {
        let text = format_units(&default_step_units());
        assert!(text.starts_with("Units:"));
        assert!(text.contains("length: mm (×0.001 to SI)"));
        assert!(text.contains("mass: kg\n") || text.ends_with("mass: kg"));
    }
}
