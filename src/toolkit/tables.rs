//! Static reference data: elements, constants, biology topics
//!
//! Keys are matched case-insensitively with whitespace folded to
//! underscores. A miss always lists the valid keys.

use super::{format_number, normalize_key, title_case, CalcError, CalcResult};
use serde::Serialize;
use std::fmt;

// ============================================================================
// Elements
// ============================================================================

/// One periodic-table entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Element {
    pub symbol: &'static str,
    pub name: &'static str,
    pub atomic_number: u8,
    /// Standard atomic weight in u
    pub atomic_mass: f64,
}

const fn el(symbol: &'static str, name: &'static str, atomic_number: u8, atomic_mass: f64) -> Element {
    Element {
        symbol,
        name,
        atomic_number,
        atomic_mass,
    }
}

pub static ELEMENTS: &[Element] = &[
    el("H", "Hydrogen", 1, 1.008),
    el("He", "Helium", 2, 4.003),
    el("Li", "Lithium", 3, 6.941),
    el("Be", "Beryllium", 4, 9.012),
    el("B", "Boron", 5, 10.811),
    el("C", "Carbon", 6, 12.011),
    el("N", "Nitrogen", 7, 14.007),
    el("O", "Oxygen", 8, 15.999),
    el("F", "Fluorine", 9, 18.998),
    el("Ne", "Neon", 10, 20.180),
    el("Na", "Sodium", 11, 22.990),
    el("Mg", "Magnesium", 12, 24.305),
    el("Al", "Aluminum", 13, 26.982),
    el("Si", "Silicon", 14, 28.086),
    el("P", "Phosphorus", 15, 30.974),
    el("S", "Sulfur", 16, 32.065),
    el("Cl", "Chlorine", 17, 35.453),
    el("Ar", "Argon", 18, 39.948),
    el("K", "Potassium", 19, 39.098),
    el("Ca", "Calcium", 20, 40.078),
    el("Sc", "Scandium", 21, 44.956),
    el("Ti", "Titanium", 22, 47.867),
    el("V", "Vanadium", 23, 50.942),
    el("Cr", "Chromium", 24, 51.996),
    el("Mn", "Manganese", 25, 54.938),
    el("Fe", "Iron", 26, 55.845),
    el("Co", "Cobalt", 27, 58.933),
    el("Ni", "Nickel", 28, 58.693),
    el("Cu", "Copper", 29, 63.546),
    el("Zn", "Zinc", 30, 65.380),
    el("Ga", "Gallium", 31, 69.723),
    el("Ge", "Germanium", 32, 72.630),
    el("As", "Arsenic", 33, 74.922),
    el("Se", "Selenium", 34, 78.971),
    el("Br", "Bromine", 35, 79.904),
    el("Kr", "Krypton", 36, 83.798),
    el("Ag", "Silver", 47, 107.868),
    el("Sn", "Tin", 50, 118.710),
    el("I", "Iodine", 53, 126.904),
    el("Ba", "Barium", 56, 137.327),
    el("Pt", "Platinum", 78, 195.084),
    el("Au", "Gold", 79, 196.967),
    el("Hg", "Mercury", 80, 200.592),
    el("Pb", "Lead", 82, 207.200),
    el("U", "Uranium", 92, 238.029),
];

/// Exact, case-sensitive symbol match used by the formula parser
pub fn element_by_symbol(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

/// Look up an element by symbol or name, case-insensitively
pub fn find_element(query: &str) -> CalcResult<&'static Element> {
    let key = normalize_key(query);
    ELEMENTS
        .iter()
        .find(|e| e.symbol.eq_ignore_ascii_case(&key) || e.name.eq_ignore_ascii_case(&key))
        .ok_or_else(|| CalcError::lookup_miss("Element", &key, ELEMENTS.iter().map(|e| e.symbol)))
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})\nAtomic Number: {}\nAtomic Mass: {} u",
            self.name, self.symbol, self.atomic_number, self.atomic_mass
        )
    }
}

// ============================================================================
// Constants
// ============================================================================

/// A named physical or chemical constant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Constant {
    pub key: &'static str,
    pub symbol: &'static str,
    pub value: f64,
    pub unit: &'static str,
}

const fn constant(key: &'static str, symbol: &'static str, value: f64, unit: &'static str) -> Constant {
    Constant {
        key,
        symbol,
        value,
        unit,
    }
}

pub static PHYSICS_CONSTANTS: &[Constant] = &[
    constant("speed_of_light", "c", 299_792_458.0, "m/s"),
    constant("gravitational_constant", "G", 6.674_30e-11, "N⋅m²/kg²"),
    constant("planck_constant", "h", 6.626_070_15e-34, "J⋅Hz⁻¹"),
    constant("electron_charge", "e", 1.602_176_634e-19, "C"),
    constant("avogadro_number", "Nₐ", 6.022_140_76e23, "mol⁻¹"),
    constant("boltzmann_constant", "k", 1.380_649e-23, "J/K"),
    constant("gas_constant", "R", 8.314_462_618, "J/(mol⋅K)"),
    constant("standard_gravity", "g", 9.806_65, "m/s²"),
];

pub static CHEMISTRY_CONSTANTS: &[Constant] = &[
    constant("avogadro_number", "Nₐ", 6.022_140_76e23, "mol⁻¹"),
    constant("gas_constant", "R", 8.314, "J/(mol⋅K)"),
    constant("planck_constant", "h", 6.626_070_15e-34, "J⋅s"),
    constant("speed_of_light", "c", 2.998e8, "m/s"),
    constant("electron_charge", "e", 1.602_176_634e-19, "C"),
    constant("atomic_mass_unit", "u", 1.660_54e-27, "kg"),
    constant("faraday_constant", "F", 96_485.332_12, "C/mol"),
];

/// Look up a constant in one of the constant tables
pub fn find_constant(table: &'static [Constant], name: &str) -> CalcResult<&'static Constant> {
    let key = normalize_key(name);
    table
        .iter()
        .find(|c| c.key == key)
        .ok_or_else(|| CalcError::lookup_miss("Constant", &key, table.iter().map(|c| c.key)))
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} {}", self.symbol, format_number(self.value), self.unit)
    }
}

// ============================================================================
// Biology topics
// ============================================================================

/// A value in a nested reference table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entry {
    Text(&'static str),
    List(&'static [&'static str]),
    Record(&'static [(&'static str, Entry)]),
}

impl Entry {
    /// One-line rendering: lists comma-joined, records as `Field: value; ...`
    fn inline(&self) -> String {
        match self {
            Entry::Text(text) => (*text).to_string(),
            Entry::List(items) => items.join(", "),
            Entry::Record(fields) => fields
                .iter()
                .map(|(k, v)| format!("{}: {}", title_case(k), v.inline()))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }

    fn field(&self, name: &str) -> Option<&Entry> {
        match self {
            Entry::Record(fields) => fields.iter().find(|(k, _)| *k == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// A named two-level table: topic -> entry
pub struct Table {
    pub name: &'static str,
    pub topics: &'static [(&'static str, &'static [(&'static str, Entry)])],
}

impl Table {
    /// Format one topic, or one entry within it when `subkey` is given
    pub fn lookup(&self, key: &str, subkey: Option<&str>) -> CalcResult<String> {
        let topic_key = normalize_key(key);
        let entries = self
            .topics
            .iter()
            .find(|(name, _)| *name == topic_key)
            .map(|(_, entries)| *entries)
            .ok_or_else(|| {
                CalcError::lookup_miss("Topic", &topic_key, self.topics.iter().map(|(name, _)| *name))
            })?;

        let Some(subkey) = subkey.map(normalize_key).filter(|s| !s.is_empty()) else {
            return Ok(summarize(&topic_key, entries));
        };

        let entry = entries
            .iter()
            .find(|(name, _)| *name == subkey)
            .map(|(_, entry)| entry)
            .ok_or_else(|| {
                CalcError::lookup_miss("Subtopic", &subkey, entries.iter().map(|(name, _)| *name))
            })?;

        Ok(match entry {
            Entry::Record(fields) => {
                let mut out = format!("{}:", title_case(&subkey));
                for (field, value) in *fields {
                    out.push_str(&format!("\n- {}: {}", title_case(field), value.inline()));
                }
                out
            }
            other => format!("{}: {}", title_case(&subkey), other.inline()),
        })
    }
}

fn summarize(topic: &str, entries: &[(&str, Entry)]) -> String {
    let mut out = format!("{}:", title_case(topic));
    for (name, entry) in entries {
        let line = match entry.field("description") {
            Some(description) => description.inline(),
            None => entry.inline(),
        };
        out.push_str(&format!("\n- {}: {}", title_case(name), line));
    }
    out
}

pub static BIOLOGY: Table = Table {
    name: "biology",
    topics: &[
        (
            "cell_types",
            &[
                (
                    "prokaryotic",
                    Entry::Record(&[
                        ("description", Entry::Text("Cells without membrane-bound nucleus")),
                        ("examples", Entry::List(&["bacteria", "archaea"])),
                    ]),
                ),
                (
                    "eukaryotic",
                    Entry::Record(&[
                        ("description", Entry::Text("Cells with membrane-bound nucleus")),
                        ("examples", Entry::List(&["plant cells", "animal cells", "fungal cells"])),
                    ]),
                ),
            ],
        ),
        (
            "organelles",
            &[
                (
                    "nucleus",
                    Entry::Record(&[
                        ("function", Entry::Text("Controls cell activities and contains DNA")),
                        ("found_in", Entry::Text("eukaryotic cells")),
                    ]),
                ),
                (
                    "mitochondria",
                    Entry::Record(&[
                        ("function", Entry::Text("Produces ATP through cellular respiration")),
                        ("found_in", Entry::Text("eukaryotic cells")),
                    ]),
                ),
                (
                    "chloroplasts",
                    Entry::Record(&[
                        ("function", Entry::Text("Conducts photosynthesis")),
                        ("found_in", Entry::Text("plant cells")),
                    ]),
                ),
                (
                    "ribosomes",
                    Entry::Record(&[
                        ("function", Entry::Text("Protein synthesis")),
                        ("found_in", Entry::Text("all cells")),
                    ]),
                ),
                (
                    "endoplasmic_reticulum",
                    Entry::Record(&[
                        ("function", Entry::Text("Protein and lipid synthesis")),
                        ("found_in", Entry::Text("eukaryotic cells")),
                    ]),
                ),
                (
                    "golgi_apparatus",
                    Entry::Record(&[
                        ("function", Entry::Text("Modifies and packages proteins")),
                        ("found_in", Entry::Text("eukaryotic cells")),
                    ]),
                ),
            ],
        ),
        (
            "body_systems",
            &[
                (
                    "circulatory",
                    Entry::Record(&[
                        ("function", Entry::Text("Transports blood, nutrients, and oxygen")),
                        ("organs", Entry::List(&["heart", "blood vessels", "blood"])),
                    ]),
                ),
                (
                    "respiratory",
                    Entry::Record(&[
                        ("function", Entry::Text("Gas exchange (oxygen and carbon dioxide)")),
                        ("organs", Entry::List(&["lungs", "trachea", "bronchi"])),
                    ]),
                ),
                (
                    "digestive",
                    Entry::Record(&[
                        ("function", Entry::Text("Breaks down food and absorbs nutrients")),
                        ("organs", Entry::List(&["stomach", "intestines", "liver"])),
                    ]),
                ),
                (
                    "nervous",
                    Entry::Record(&[
                        ("function", Entry::Text("Controls body functions and processes information")),
                        ("organs", Entry::List(&["brain", "spinal cord", "nerves"])),
                    ]),
                ),
                (
                    "skeletal",
                    Entry::Record(&[
                        ("function", Entry::Text("Provides structure and protects organs")),
                        ("organs", Entry::List(&["bones", "cartilage", "ligaments"])),
                    ]),
                ),
            ],
        ),
        (
            "genetics",
            &[
                ("dna_bases", Entry::List(&["adenine", "thymine", "guanine", "cytosine"])),
                ("rna_bases", Entry::List(&["adenine", "uracil", "guanine", "cytosine"])),
                (
                    "base_pairs",
                    Entry::Record(&[
                        ("adenine", Entry::Text("thymine")),
                        ("thymine", Entry::Text("adenine")),
                        ("guanine", Entry::Text("cytosine")),
                        ("cytosine", Entry::Text("guanine")),
                    ]),
                ),
            ],
        ),
    ],
};

/// Tables reachable through [`lookup`], by category name
static CATEGORIES: &[&Table] = &[&BIOLOGY];

/// Generic entry point: `category` selects a table, `key` a topic, `subkey` an entry.
///
/// `elements`, `physics_constants` and `chemistry_constants` are flat
/// categories; for them `key` names the record and `subkey` is ignored.
pub fn lookup(category: &str, key: &str, subkey: Option<&str>) -> CalcResult<String> {
    let category = normalize_key(category);
    match category.as_str() {
        "elements" => find_element(key).map(ToString::to_string),
        "physics_constants" => find_constant(PHYSICS_CONSTANTS, key).map(ToString::to_string),
        "chemistry_constants" => find_constant(CHEMISTRY_CONSTANTS, key).map(ToString::to_string),
        _ => CATEGORIES
            .iter()
            .find(|t| t.name == category)
            .ok_or_else(|| {
                CalcError::lookup_miss(
                    "Category",
                    &category,
                    CATEGORIES
                        .iter()
                        .map(|t| t.name)
                        .chain(["elements", "physics_constants", "chemistry_constants"]),
                )
            })?
            .lookup(key, subkey),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::CalcErrorKind;
    use std::collections::HashSet;

    #[test]
    fn test_element_symbols_unique_and_masses_positive() {
        let mut seen = HashSet::new();
        for element in ELEMENTS {
            assert!(seen.insert(element.symbol), "duplicate symbol {}", element.symbol);
            assert!(element.atomic_mass > 0.0);
        }
    }

    #[test]
    fn test_find_element_by_symbol_or_name() {
        assert_eq!(find_element("c").unwrap().name, "Carbon");
        assert_eq!(find_element(" Carbon ").unwrap().symbol, "C");
        assert_eq!(find_element("NA").unwrap().name, "Sodium");
    }

    #[test]
    fn test_element_display() {
        let carbon = find_element("C").unwrap();
        assert_eq!(
            carbon.to_string(),
            "Carbon (C)\nAtomic Number: 6\nAtomic Mass: 12.011 u"
        );
    }

    #[test]
    fn test_unknown_element_lists_symbols() {
        let err = find_element("Xx").unwrap_err();
        assert_eq!(err.kind, CalcErrorKind::LookupMiss);
        assert!(err.message.contains("'xx'"));
        assert!(err.message.contains("H, He, Li"));
    }

    #[test]
    fn test_constant_lookup_normalizes_key() {
        let c = find_constant(PHYSICS_CONSTANTS, "Speed Of Light").unwrap();
        assert_eq!(c.to_string(), "c = 299792458 m/s");

        let r = find_constant(CHEMISTRY_CONSTANTS, "gas constant").unwrap();
        assert_eq!(r.to_string(), "R = 8.314 J/(mol⋅K)");
    }

    #[test]
    fn test_constant_miss_lists_keys() {
        let err = find_constant(PHYSICS_CONSTANTS, "warp factor").unwrap_err();
        assert_eq!(err.kind, CalcErrorKind::LookupMiss);
        assert!(err.message.starts_with("Constant 'warp_factor' not found"));
        assert!(err.message.contains("speed_of_light"));
    }

    #[test]
    fn test_constants_finite_nonzero() {
        for c in PHYSICS_CONSTANTS.iter().chain(CHEMISTRY_CONSTANTS) {
            assert!(c.value.is_finite() && c.value != 0.0, "{}", c.key);
        }
    }

    #[test]
    fn test_biology_summary_uses_description() {
        let text = BIOLOGY.lookup("cell types", None).unwrap();
        assert_eq!(
            text,
            "Cell Types:\n\
             - Prokaryotic: Cells without membrane-bound nucleus\n\
             - Eukaryotic: Cells with membrane-bound nucleus"
        );
    }

    #[test]
    fn test_biology_summary_without_description_uses_raw_value() {
        let text = BIOLOGY.lookup("genetics", None).unwrap();
        assert!(text.contains("- Dna Bases: adenine, thymine, guanine, cytosine"));
        assert!(text.contains("- Base Pairs: Adenine: thymine;"));
    }

    #[test]
    fn test_biology_subtopic_record() {
        let text = BIOLOGY.lookup("Organelles", Some("Golgi Apparatus")).unwrap();
        assert_eq!(
            text,
            "Golgi Apparatus:\n\
             - Function: Modifies and packages proteins\n\
             - Found In: eukaryotic cells"
        );
    }

    #[test]
    fn test_biology_subtopic_list() {
        let text = BIOLOGY.lookup("genetics", Some("rna_bases")).unwrap();
        assert_eq!(text, "Rna Bases: adenine, uracil, guanine, cytosine");
    }

    #[test]
    fn test_biology_misses() {
        let err = BIOLOGY.lookup("ecology", None).unwrap_err();
        assert_eq!(
            err.message,
            "Topic 'ecology' not found. Available: cell_types, organelles, body_systems, genetics"
        );

        let err = BIOLOGY.lookup("organelles", Some("lysosome")).unwrap_err();
        assert!(err.message.starts_with("Subtopic 'lysosome' not found"));
        assert!(err.message.contains("golgi_apparatus"));
    }

    #[test]
    fn test_generic_lookup_routes_categories() {
        assert!(lookup("Biology", "organelles", Some("nucleus"))
            .unwrap()
            .contains("Controls cell activities"));
        assert_eq!(lookup("elements", "he", None).unwrap().lines().next(), Some("Helium (He)"));
        assert!(lookup("physics constants", "gas_constant", None)
            .unwrap()
            .starts_with("R = 8.314462618"));

        let err = lookup("astronomy", "mars", None).unwrap_err();
        assert_eq!(err.kind, CalcErrorKind::LookupMiss);
        assert!(err.message.contains("chemistry_constants"));
    }
}
