//! Property-based tests for the calculators

use super::chemistry::{ph, Classification};
use super::expr::{self, SolutionSet};
use super::formula::{molar_mass, tokenize};
use super::genetics::{dna_complement, hardy_weinberg, punnett_square};
use super::tables::ELEMENTS;
use super::units::convert;
use super::CalcErrorKind;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_element() -> impl Strategy<Value = &'static str> {
    prop::sample::select(ELEMENTS.iter().map(|e| e.symbol).collect::<Vec<_>>())
}

/// A formula built from known symbols with counts 1..=20
fn arb_formula() -> impl Strategy<Value = (String, Vec<(&'static str, u32)>)> {
    proptest::collection::vec((arb_element(), 1u32..=20), 1..6).prop_map(|parts| {
        let formula = parts
            .iter()
            .map(|(symbol, count)| {
                if *count == 1 {
                    (*symbol).to_string()
                } else {
                    format!("{symbol}{count}")
                }
            })
            .collect::<String>();
        (formula, parts)
    })
}

fn arb_allele_pair() -> impl Strategy<Value = String> {
    ("[A-Za-z]", "[A-Za-z]").prop_map(|(a, b)| format!("{a}{b}"))
}

proptest! {
    /// AA + Aa + aa = 1 for any single valid allele frequency
    #[test]
    fn prop_hardy_weinberg_sums_to_one(p in 0.0f64..=1.0) {
        let hw = hardy_weinberg(Some(p), None).unwrap();
        let total = hw.homozygous_dominant + hw.heterozygous + hw.homozygous_recessive;
        prop_assert!((total - 1.0).abs() < 1e-9, "sum was {}", total);
        prop_assert!((hw.p + hw.q - 1.0).abs() < 1e-9);
    }

    /// Supplying q instead of p gives the mirrored result
    #[test]
    fn prop_hardy_weinberg_p_q_symmetry(p in 0.0f64..=1.0) {
        let from_p = hardy_weinberg(Some(p), None).unwrap();
        let from_q = hardy_weinberg(None, Some(1.0 - p)).unwrap();
        prop_assert!((from_p.heterozygous - from_q.heterozygous).abs() < 1e-9);
    }

    /// Out-of-range frequencies are domain errors, never panics
    #[test]
    fn prop_hardy_weinberg_rejects_out_of_range(p in prop_oneof![-100.0f64..-1e-6, 1.000_001f64..100.0]) {
        let err = hardy_weinberg(Some(p), None).unwrap_err();
        prop_assert_eq!(err.kind, CalcErrorKind::Domain);
    }

    /// Molar mass equals the sum of atomic mass × count over the written tokens
    #[test]
    fn prop_molar_mass_is_token_sum((formula, parts) in arb_formula()) {
        let expected: f64 = parts
            .iter()
            .map(|(symbol, count)| {
                let element = ELEMENTS.iter().find(|e| e.symbol == *symbol).unwrap();
                element.atomic_mass * f64::from(*count)
            })
            .sum();
        let result = molar_mass(&formula).unwrap();
        prop_assert!((result.total - expected).abs() < 1e-6, "{} vs {}", result.total, expected);
    }

    /// Tokenizing never panics; errors are always classified
    #[test]
    fn prop_tokenize_total(input in "\\PC{0,24}") {
        if let Err(err) = tokenize(&input) {
            prop_assert!(!err.message.is_empty());
        }
    }

    /// Parsing and evaluating arbitrary text never panics
    #[test]
    fn prop_expression_parser_total(input in "[0-9x+\\-*/^(). a-z]{0,32}") {
        if let Ok(parsed) = expr::parse(&input) {
            let _ = parsed.eval(Some(1.5));
        }
    }

    /// c -> f -> c returns the starting temperature
    #[test]
    fn prop_celsius_round_trip(c in -273.15f64..10_000.0) {
        let f = convert(c, "c", "f").unwrap().result;
        let back = convert(f, "f", "c").unwrap().result;
        prop_assert!((back - c).abs() < 1e-6);
    }

    /// Nothing converts to below absolute zero
    #[test]
    fn prop_kelvin_never_negative(c in -273.15f64..10_000.0) {
        let k = convert(c, "c", "k").unwrap().result;
        prop_assert!(k >= -1e-9);
    }

    /// pH + pOH = 14 and the classification matches the pH
    #[test]
    fn prop_ph_poh_sum(exponent in -14.0f64..0.0, is_acid in any::<bool>()) {
        let report = ph(10f64.powf(exponent), is_acid).unwrap();
        prop_assert!((report.ph + report.poh - 14.0).abs() < 1e-9);
        match report.classification {
            Classification::Acidic => prop_assert!(report.ph < 7.0),
            Classification::Basic => prop_assert!(report.ph > 7.0),
            Classification::Neutral => prop_assert!((report.ph - 7.0).abs() <= 1e-9),
        }
    }

    /// Complementing twice gives back the normalized input
    #[test]
    fn prop_dna_complement_involution(seq in "[ATGCatgc]{1,40}") {
        let once = dna_complement(&seq).unwrap();
        let twice = dna_complement(&once.complement).unwrap();
        prop_assert_eq!(twice.complement, once.original);
    }

    /// A Punnett square always has four offspring
    #[test]
    fn prop_punnett_counts_sum_to_four(p1 in arb_allele_pair(), p2 in arb_allele_pair()) {
        let square = punnett_square(&p1, &p2).unwrap();
        let total: u32 = square.offspring.iter().map(|g| g.count).sum();
        prop_assert_eq!(total, 4);
    }

    /// Linear equations a*x + b = 0 (a != 0) have the single root -b/a
    #[test]
    fn prop_linear_root(a in prop_oneof![-50i32..-1, 1i32..50], b in -50i32..50) {
        let lhs = expr::parse(&format!("({a})*x + ({b})")).unwrap();
        let rhs = expr::parse("0").unwrap();
        let solution = expr::solve(&lhs, &rhs).unwrap();
        match solution.set {
            SolutionSet::Finite(roots) => {
                prop_assert_eq!(roots.len(), 1);
                match roots[0] {
                    expr::Root::Real { value } => {
                        prop_assert!((value + f64::from(b) / f64::from(a)).abs() < 1e-9);
                    }
                    expr::Root::Complex { .. } => prop_assert!(false, "complex root"),
                }
            }
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }
}
