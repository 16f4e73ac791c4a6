//! Deterministic science calculators
//!
//! Every calculator is a pure function returning `Result<T, CalcError>`.
//! Report types implement `Display` so the tool layer can hand the text
//! straight to the caller.

pub mod chemistry;
mod error;
pub mod expr;
pub mod formula;
pub mod genetics;
pub mod math;
pub mod physics;
pub mod tables;
pub mod units;

#[cfg(test)]
mod proptests;

pub use error::{CalcError, CalcErrorKind, CalcResult};

/// Normalize a lookup key: trimmed, lower-case, inner whitespace as underscores
pub(crate) fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Format a number for display.
///
/// Integral values print without a fractional part, very large or very small
/// magnitudes use scientific notation, everything else uses the shortest
/// round-trip representation.
pub(crate) fn format_number(value: f64) -> String {
    // 12 significant digits: 10.0 * 9.8 prints as 98, not 98.00000000000001
    let value = format!("{value:.11e}").parse::<f64>().unwrap_or(value);
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if value.fract() == 0.0 && magnitude < 1e15 {
        return format!("{value:.0}");
    }
    if !(1e-4..1e15).contains(&magnitude) {
        return format!("{value:e}");
    }
    format!("{value}")
}

/// Title-case a snake_case key: `golgi_apparatus` -> `Golgi Apparatus`
pub(crate) fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Golgi   Apparatus "), "golgi_apparatus");
        assert_eq!(normalize_key("H"), "h");
        assert_eq!(normalize_key(""), "");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(32.0), "32");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(16.4042), "16.4042");
        assert_eq!(format_number(299_792_458.0), "299792458");
        assert_eq!(format_number(6.626_070_15e-34), "6.62607015e-34");
        assert_eq!(format_number(6.022_140_76e23), "6.02214076e23");
        assert_eq!(format_number(10.0 * 9.8), "98");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("endoplasmic_reticulum"), "Endoplasmic Reticulum");
        assert_eq!(title_case("found_in"), "Found In");
        assert_eq!(title_case("dna_bases"), "Dna Bases");
    }
}
