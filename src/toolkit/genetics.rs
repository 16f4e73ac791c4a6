//! Population and Mendelian genetics, DNA pairing, organism classification

use super::{CalcError, CalcErrorKind, CalcResult};
use serde::Serialize;
use std::fmt;

/// Allowed drift of `p + q` from 1 when both are supplied
const SUM_TOLERANCE: f64 = 0.001;

// ============================================================================
// Hardy-Weinberg
// ============================================================================

/// Genotype frequencies at Hardy-Weinberg equilibrium
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HardyWeinberg {
    pub p: f64,
    pub q: f64,
    pub homozygous_dominant: f64,
    pub heterozygous: f64,
    pub homozygous_recessive: f64,
}

/// Compute AA/Aa/aa from either allele frequency. A missing one is `1 - given`.
pub fn hardy_weinberg(p: Option<f64>, q: Option<f64>) -> CalcResult<HardyWeinberg> {
    for (name, value) in [("p", p), ("q", q)] {
        if let Some(v) = value {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(CalcError::domain(format!(
                    "Allele frequency {name} = {v} must be between 0 and 1"
                )));
            }
        }
    }

    let (p, q) = match (p, q) {
        (Some(p), None) => (p, 1.0 - p),
        (None, Some(q)) => (1.0 - q, q),
        (Some(p), Some(q)) => {
            if (p + q - 1.0).abs() > SUM_TOLERANCE {
                return Err(CalcError::domain(format!(
                    "p + q must equal 1 (got {p} + {q} = {})",
                    p + q
                )));
            }
            (p, q)
        }
        (None, None) => {
            return Err(CalcError::parse(
                "Provide either p (dominant frequency) or q (recessive frequency)",
            ));
        }
    };

    Ok(HardyWeinberg {
        p,
        q,
        homozygous_dominant: p * p,
        heterozygous: 2.0 * p * q,
        homozygous_recessive: q * q,
    })
}

impl fmt::Display for HardyWeinberg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hardy-Weinberg Equilibrium:")?;
        writeln!(f, "Allele frequencies: p = {:.3}, q = {:.3}", self.p, self.q)?;
        writeln!(f, "Genotype frequencies:")?;
        let rows = [
            ("AA (homozygous dominant)", self.homozygous_dominant),
            ("Aa (heterozygous)", self.heterozygous),
            ("aa (homozygous recessive)", self.homozygous_recessive),
        ];
        for (i, (label, freq)) in rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "- {label}: {freq:.3} ({:.1}%)", freq * 100.0)?;
        }
        Ok(())
    }
}

// ============================================================================
// Punnett square
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenotypeCount {
    pub genotype: String,
    pub count: u32,
}

/// Offspring genotype tallies for a single-locus cross
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PunnettSquare {
    pub parent1: String,
    pub parent2: String,
    /// First-occurrence order
    pub offspring: Vec<GenotypeCount>,
    pub total: u32,
}

impl PunnettSquare {
    pub fn percentage(&self, genotype: &str) -> Option<f64> {
        self.offspring
            .iter()
            .find(|g| g.genotype == genotype)
            .map(|g| f64::from(g.count) * 100.0 / f64::from(self.total))
    }
}

/// Cross two 2-allele genotypes
pub fn punnett_square(parent1: &str, parent2: &str) -> CalcResult<PunnettSquare> {
    let p1 = alleles(parent1, "parent1")?;
    let p2 = alleles(parent2, "parent2")?;

    let mut offspring: Vec<GenotypeCount> = Vec::new();
    for a in &p1 {
        for b in &p2 {
            let genotype = order_pair(*a, *b);
            match offspring.iter_mut().find(|g| g.genotype == genotype) {
                Some(entry) => entry.count += 1,
                None => offspring.push(GenotypeCount { genotype, count: 1 }),
            }
        }
    }

    Ok(PunnettSquare {
        parent1: p1.iter().collect(),
        parent2: p2.iter().collect(),
        offspring,
        total: 4,
    })
}

fn alleles(genotype: &str, which: &str) -> CalcResult<Vec<char>> {
    let genotype = genotype.trim();
    if genotype.is_empty() {
        return Err(CalcError::parse(format!(
            "Provide a genotype for {which} (e.g. 'Aa')"
        )));
    }
    let chars: Vec<char> = genotype.chars().collect();
    if let Some(bad) = chars.iter().find(|c| !c.is_alphabetic()) {
        return Err(CalcError::parse(format!(
            "Invalid allele '{bad}' in {which}; alleles are letters"
        )));
    }
    if chars.len() != 2 {
        return Err(CalcError::unsupported(format!(
            "Only single-locus crosses with two alleles per parent are supported (got '{genotype}')"
        )));
    }
    Ok(chars)
}

/// Same-gene alleles are written dominant (uppercase) first
fn order_pair(a: char, b: char) -> String {
    let same_gene = a.to_lowercase().eq(b.to_lowercase());
    if same_gene && a.is_lowercase() && b.is_uppercase() {
        format!("{b}{a}")
    } else {
        format!("{a}{b}")
    }
}

impl fmt::Display for PunnettSquare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Punnett Square Results ({} × {}):", self.parent1, self.parent2)?;
        for g in &self.offspring {
            write!(
                f,
                "\n- {}: {}/{} ({:.1}%)",
                g.genotype,
                g.count,
                self.total,
                f64::from(g.count) * 100.0 / f64::from(self.total)
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// DNA complement
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnaComplement {
    pub original: String,
    pub complement: String,
}

pub fn dna_complement(sequence: &str) -> CalcResult<DnaComplement> {
    let original: String = sequence
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect();
    if original.is_empty() {
        return Err(CalcError::parse("Empty DNA sequence"));
    }

    let complement = original
        .chars()
        .map(|base| match base {
            'A' => Ok('T'),
            'T' => Ok('A'),
            'G' => Ok('C'),
            'C' => Ok('G'),
            other => Err(CalcError::parse(format!(
                "Invalid DNA base '{other}'. Use A, T, G, C only."
            ))),
        })
        .collect::<CalcResult<String>>()?;

    Ok(DnaComplement {
        original,
        complement,
    })
}

impl fmt::Display for DnaComplement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Original:    5'-{}-3'\nComplement:  3'-{}-5'",
            self.original, self.complement
        )
    }
}

// ============================================================================
// Organism classification
// ============================================================================

/// `(label, keywords)`; the first rule with any matching keyword wins
type Rules = &'static [(&'static str, &'static [&'static str])];

static KINGDOM_RULES: Rules = &[
    ("Plantae", &["plant", "photosynthesis", "chlorophyll", "cell wall"]),
    ("Animalia", &["animal", "multicellular", "heterotrophic", "mobile"]),
    ("Fungi", &["fungus", "fungi", "decomposer", "spores"]),
    ("Bacteria", &["bacteria", "prokaryotic", "single cell"]),
];

// "no nucleus" is checked before "nucleus"
static CELL_TYPE_RULES: Rules = &[
    ("Prokaryotic", &["no nucleus", "prokaryotic"]),
    ("Eukaryotic", &["nucleus", "organelles", "membrane bound"]),
];

static NUTRITION_RULES: Rules = &[
    ("Autotrophic", &["photosynthesis", "autotrophic", "makes own food"]),
    ("Heterotrophic", &["heterotrophic", "consumes", "eats"]),
];

fn first_match(rules: Rules, text: &str) -> Option<&'static str> {
    rules
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(label, _)| *label)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganismClassification {
    pub kingdom: Option<&'static str>,
    pub cell_type: Option<&'static str>,
    pub nutrition: Option<&'static str>,
}

/// Keyword-based classification from a free-text trait description
pub fn classify_organism(characteristics: &str) -> CalcResult<OrganismClassification> {
    let text = characteristics.to_lowercase();
    let result = OrganismClassification {
        kingdom: first_match(KINGDOM_RULES, &text),
        cell_type: first_match(CELL_TYPE_RULES, &text),
        nutrition: first_match(NUTRITION_RULES, &text),
    };

    if result.kingdom.is_none() && result.cell_type.is_none() && result.nutrition.is_none() {
        return Err(CalcError::new(
            CalcErrorKind::LookupMiss,
            "Unable to classify based on given characteristics. Please provide more specific traits \
             (e.g. photosynthesis, nucleus, decomposer, heterotrophic).",
        ));
    }
    Ok(result)
}

impl fmt::Display for OrganismClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Classification based on characteristics:")?;
        let fields = [
            ("Kingdom", self.kingdom),
            ("Cell Type", self.cell_type),
            ("Nutrition", self.nutrition),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                write!(f, "\n{name}: {value}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_hardy_weinberg_from_p() {
        let hw = hardy_weinberg(Some(0.7), None).unwrap();
        assert!(approx(hw.q, 0.3));
        assert!(approx(hw.homozygous_dominant, 0.49));
        assert!(approx(hw.heterozygous, 0.42));
        assert!(approx(hw.homozygous_recessive, 0.09));
        assert_eq!(
            hw.to_string(),
            "Hardy-Weinberg Equilibrium:\n\
             Allele frequencies: p = 0.700, q = 0.300\n\
             Genotype frequencies:\n\
             - AA (homozygous dominant): 0.490 (49.0%)\n\
             - Aa (heterozygous): 0.420 (42.0%)\n\
             - aa (homozygous recessive): 0.090 (9.0%)"
        );
    }

    #[test]
    fn test_hardy_weinberg_from_q() {
        let hw = hardy_weinberg(None, Some(0.2)).unwrap();
        assert!(approx(hw.p, 0.8));
    }

    #[test]
    fn test_hardy_weinberg_both_within_tolerance() {
        assert!(hardy_weinberg(Some(0.6), Some(0.4005)).is_ok());

        let err = hardy_weinberg(Some(0.6), Some(0.5)).unwrap_err();
        assert_eq!(err.kind, CalcErrorKind::Domain);
        assert!(err.message.starts_with("p + q must equal 1"));
    }

    #[test]
    fn test_hardy_weinberg_rejects_bad_input() {
        assert_eq!(hardy_weinberg(None, None).unwrap_err().kind, CalcErrorKind::Parse);
        assert_eq!(hardy_weinberg(Some(1.5), None).unwrap_err().kind, CalcErrorKind::Domain);
        assert_eq!(hardy_weinberg(None, Some(-0.1)).unwrap_err().kind, CalcErrorKind::Domain);
        assert_eq!(
            hardy_weinberg(Some(f64::NAN), None).unwrap_err().kind,
            CalcErrorKind::Domain
        );
    }

    #[test]
    fn test_dihybrid_letters_give_four_even_combinations() {
        let square = punnett_square("Aa", "Bb").unwrap();
        let genotypes: Vec<_> = square.offspring.iter().map(|g| g.genotype.as_str()).collect();
        assert_eq!(genotypes, vec!["AB", "Ab", "aB", "ab"]);
        for g in &square.offspring {
            assert!(approx(square.percentage(&g.genotype).unwrap(), 25.0));
        }
    }

    #[test]
    fn test_monohybrid_cross_normalizes_order() {
        let square = punnett_square("Aa", "Aa").unwrap();
        assert_eq!(
            square.to_string(),
            "Punnett Square Results (Aa × Aa):\n- AA: 1/4 (25.0%)\n- Aa: 2/4 (50.0%)\n- aa: 1/4 (25.0%)"
        );
    }

    #[test]
    fn test_punnett_rejects_bad_genotypes() {
        assert_eq!(punnett_square("AaBb", "AaBb").unwrap_err().kind, CalcErrorKind::Unsupported);
        assert_eq!(punnett_square("", "Aa").unwrap_err().kind, CalcErrorKind::Parse);
        assert_eq!(punnett_square("A1", "Aa").unwrap_err().kind, CalcErrorKind::Parse);
    }

    #[test]
    fn test_dna_complement() {
        let dna = dna_complement("atg c").unwrap();
        assert_eq!(dna.original, "ATGC");
        assert_eq!(dna.complement, "TACG");
        assert_eq!(dna.to_string(), "Original:    5'-ATGC-3'\nComplement:  3'-TACG-5'");
    }

    #[test]
    fn test_dna_complement_invalid_base() {
        let err = dna_complement("ATGU").unwrap_err();
        assert_eq!(err.kind, CalcErrorKind::Parse);
        assert!(err.message.contains("'U'"));
        assert_eq!(dna_complement("  ").unwrap_err().kind, CalcErrorKind::Parse);
    }

    #[test]
    fn test_classify_plant() {
        let c = classify_organism("Green, does photosynthesis, has a nucleus").unwrap();
        assert_eq!(c.kingdom, Some("Plantae"));
        assert_eq!(c.cell_type, Some("Eukaryotic"));
        assert_eq!(c.nutrition, Some("Autotrophic"));
        assert_eq!(
            c.to_string(),
            "Classification based on characteristics:\n\
             Kingdom: Plantae\nCell Type: Eukaryotic\nNutrition: Autotrophic"
        );
    }

    #[test]
    fn test_classify_no_nucleus_is_prokaryotic() {
        let c = classify_organism("single cell with no nucleus").unwrap();
        assert_eq!(c.kingdom, Some("Bacteria"));
        assert_eq!(c.cell_type, Some("Prokaryotic"));
        assert_eq!(c.nutrition, None);
        assert!(!c.to_string().contains("Nutrition"));
    }

    #[test]
    fn test_classify_without_keywords() {
        let err = classify_organism("it is blue").unwrap_err();
        assert_eq!(err.kind, CalcErrorKind::LookupMiss);
        assert!(err.message.starts_with("Unable to classify"));
    }
}
