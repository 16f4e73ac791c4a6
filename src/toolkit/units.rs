//! Unit conversion over fixed category tables

use super::{format_number, CalcError, CalcResult};
use serde::Serialize;
use std::fmt;

const ABSOLUTE_ZERO_C: f64 = -273.15;

/// How a unit pair converts
#[derive(Debug, Clone, Copy)]
enum Conversion {
    Factor(f64),
    Affine(fn(f64) -> f64),
}

impl Conversion {
    fn apply(self, value: f64) -> f64 {
        match self {
            Conversion::Factor(factor) => value * factor,
            Conversion::Affine(f) => f(value),
        }
    }
}

struct Category {
    name: &'static str,
    pairs: &'static [(&'static str, Conversion)],
}

fn c_to_f(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

fn f_to_c(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

fn c_to_k(c: f64) -> f64 {
    c + 273.15
}

fn k_to_c(k: f64) -> f64 {
    k - 273.15
}

fn f_to_k(f: f64) -> f64 {
    c_to_k(f_to_c(f))
}

fn k_to_f(k: f64) -> f64 {
    c_to_f(k_to_c(k))
}

static CATEGORIES: &[Category] = &[
    Category {
        name: "length",
        pairs: &[
            ("m_to_ft", Conversion::Factor(3.280_84)),
            ("ft_to_m", Conversion::Factor(0.3048)),
            ("m_to_in", Conversion::Factor(39.3701)),
            ("in_to_m", Conversion::Factor(0.0254)),
            ("km_to_mi", Conversion::Factor(0.621_371)),
            ("mi_to_km", Conversion::Factor(1.609_34)),
            ("km_to_m", Conversion::Factor(1000.0)),
            ("m_to_km", Conversion::Factor(0.001)),
            ("cm_to_in", Conversion::Factor(0.393_701)),
            ("in_to_cm", Conversion::Factor(2.54)),
        ],
    },
    Category {
        name: "mass",
        pairs: &[
            ("kg_to_lb", Conversion::Factor(2.204_62)),
            ("lb_to_kg", Conversion::Factor(0.453_592)),
            ("g_to_oz", Conversion::Factor(0.035_274)),
            ("oz_to_g", Conversion::Factor(28.3495)),
            ("kg_to_g", Conversion::Factor(1000.0)),
            ("g_to_kg", Conversion::Factor(0.001)),
        ],
    },
    Category {
        name: "temperature",
        pairs: &[
            ("c_to_f", Conversion::Affine(c_to_f)),
            ("f_to_c", Conversion::Affine(f_to_c)),
            ("c_to_k", Conversion::Affine(c_to_k)),
            ("k_to_c", Conversion::Affine(k_to_c)),
            ("f_to_k", Conversion::Affine(f_to_k)),
            ("k_to_f", Conversion::Affine(k_to_f)),
        ],
    },
];

/// Result of a successful conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub value: f64,
    pub from_unit: String,
    pub result: f64,
    pub to_unit: String,
    pub category: &'static str,
}

impl fmt::Display for ConversionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = format_number(self.value);
        let result = format_number(round_to(self.result, 4));
        if self.category == "temperature" {
            write!(
                f,
                "{value}°{} = {result}°{}",
                self.from_unit.to_uppercase(),
                self.to_unit.to_uppercase()
            )
        } else {
            write!(f, "{value} {} = {result} {}", self.from_unit, self.to_unit)
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Every supported `from_to` pair, for error messages and tool descriptions
pub fn supported_pairs() -> impl Iterator<Item = &'static str> {
    CATEGORIES
        .iter()
        .flat_map(|c| c.pairs.iter().map(|(key, _)| *key))
}

/// Convert `value` between two units. Units are matched case-insensitively.
pub fn convert(value: f64, from_unit: &str, to_unit: &str) -> CalcResult<ConversionResult> {
    if !value.is_finite() {
        return Err(CalcError::domain(format!("Cannot convert non-finite value {value}")));
    }

    let from = from_unit.trim().to_lowercase();
    let to = to_unit.trim().to_lowercase();
    let key = format!("{from}_to_{to}");

    for category in CATEGORIES {
        let Some((_, conversion)) = category.pairs.iter().find(|(k, _)| *k == key) else {
            continue;
        };

        if category.name == "temperature" {
            check_above_absolute_zero(value, &from)?;
        }

        let result = conversion.apply(value);
        return Ok(ConversionResult {
            value,
            from_unit: from,
            result,
            to_unit: to,
            category: category.name,
        });
    }

    let available = supported_pairs().collect::<Vec<_>>().join(", ");
    Err(CalcError::unsupported(format!(
        "Conversion from {from} to {to} not supported. Available: {available}"
    )))
}

fn check_above_absolute_zero(value: f64, unit: &str) -> CalcResult<()> {
    let celsius = match unit {
        "f" => f_to_c(value),
        "k" => k_to_c(value),
        _ => value,
    };
    // Small tolerance so exactly 0 K or -459.67 F survives float rounding
    if celsius < ABSOLUTE_ZERO_C - 1e-9 {
        return Err(CalcError::domain(format!(
            "{} {unit} is below absolute zero",
            format_number(value)
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::CalcErrorKind;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_length_conversion() {
        let r = convert(5.0, "m", "ft").unwrap();
        assert!(approx(r.result, 16.4042));
        assert_eq!(r.category, "length");
        assert_eq!(r.to_string(), "5 m = 16.4042 ft");
    }

    #[test]
    fn test_units_case_insensitive() {
        let r = convert(1.0, "KM", "Mi").unwrap();
        assert!(approx(r.result, 0.621_371));
        assert_eq!(r.from_unit, "km");
    }

    #[test]
    fn test_temperature_affine() {
        let r = convert(100.0, "C", "F").unwrap();
        assert!(approx(r.result, 212.0));
        assert_eq!(r.to_string(), "100°C = 212°F");

        let r = convert(32.0, "f", "c").unwrap();
        assert!(approx(r.result, 0.0));

        let r = convert(0.0, "c", "k").unwrap();
        assert!(approx(r.result, 273.15));
        assert_eq!(r.category, "temperature");
    }

    #[test]
    fn test_absolute_zero_boundary() {
        assert!(convert(0.0, "k", "c").is_ok());
        assert!(convert(-273.15, "c", "k").is_ok());

        let err = convert(-300.0, "c", "k").unwrap_err();
        assert_eq!(err.kind, CalcErrorKind::Domain);
        assert!(err.message.contains("below absolute zero"));

        assert_eq!(convert(-1.0, "k", "f").unwrap_err().kind, CalcErrorKind::Domain);
    }

    #[test]
    fn test_negative_lengths_are_allowed() {
        let r = convert(-2.0, "kg", "g").unwrap();
        assert!(approx(r.result, -2000.0));
    }

    #[test]
    fn test_unsupported_pair_lists_available() {
        let err = convert(1.0, "m", "kg").unwrap_err();
        assert_eq!(err.kind, CalcErrorKind::Unsupported);
        assert!(err.message.starts_with("Conversion from m to kg not supported"));
        assert!(err.message.contains("m_to_ft"));
        assert!(err.message.contains("k_to_f"));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert_eq!(
            convert(f64::NAN, "m", "ft").unwrap_err().kind,
            CalcErrorKind::Domain
        );
        assert_eq!(
            convert(f64::INFINITY, "c", "f").unwrap_err().kind,
            CalcErrorKind::Domain
        );
    }

    #[test]
    fn test_display_rounds_to_four_places() {
        let r = convert(1.0, "lb", "kg").unwrap();
        assert_eq!(r.to_string(), "1 lb = 0.4536 kg");
    }
}
