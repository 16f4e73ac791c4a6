//! Chemical formula tokenizer, molar mass and balance checking
//!
//! Grammar (whitespace removed first):
//!
//! ```text
//! Formula := Token+
//! Token   := Symbol Count?
//! Symbol  := Upper Lower?
//! Count   := Digit+          (absent means 1)
//! ```
//!
//! Groups, hydrates and charges are rejected as unsupported rather than
//! silently misread.

use super::tables::element_by_symbol;
use super::{CalcError, CalcResult};
use serde::Serialize;
use std::fmt;

/// Characters with a meaning in richer formula notations we don't handle
const UNSUPPORTED: &[char] = &['(', ')', '[', ']', '·', '.', '*', '+', '-', '^'];

/// One `(element, count)` pair as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaToken {
    pub symbol: String,
    pub count: u32,
}

/// Tokenizer states
#[derive(Debug)]
enum State {
    /// Expecting an uppercase letter
    Start,
    /// Seen an uppercase letter, may take one lowercase letter
    Upper(char),
    /// Complete symbol, may take count digits
    Symbol(String),
    /// Reading count digits for a symbol
    Count(String, String),
}

/// Split a formula into tokens without resolving element symbols
pub fn tokenize(formula: &str) -> CalcResult<Vec<FormulaToken>> {
    let compact: String = formula.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(CalcError::parse("Empty formula"));
    }

    let mut tokens = Vec::new();
    let mut state = State::Start;

    for c in compact.chars() {
        if UNSUPPORTED.contains(&c) {
            return Err(CalcError::unsupported(format!(
                "'{c}' in '{compact}': groups, hydrates and charges are not supported"
            )));
        }

        state = match (state, c) {
            (State::Start, 'A'..='Z') => State::Upper(c),
            (State::Start, '0'..='9') if tokens.is_empty() => {
                return Err(CalcError::parse(format!(
                    "Formula '{compact}' starts with a coefficient; write the formula alone"
                )));
            }
            (State::Start, _) if c.is_lowercase() => {
                return Err(CalcError::parse(format!(
                    "Element symbols start with an uppercase letter, found '{c}'"
                )));
            }

            (State::Upper(upper), 'a'..='z') => State::Symbol(format!("{upper}{c}")),
            (State::Upper(upper), 'A'..='Z') => {
                tokens.push(token(upper.to_string(), None)?);
                State::Upper(c)
            }
            (State::Upper(upper), '0'..='9') => State::Count(upper.to_string(), c.to_string()),

            (State::Symbol(symbol), 'A'..='Z') => {
                tokens.push(token(symbol, None)?);
                State::Upper(c)
            }
            (State::Symbol(symbol), '0'..='9') => State::Count(symbol, c.to_string()),
            (State::Symbol(_), _) if c.is_lowercase() => {
                return Err(CalcError::parse(format!(
                    "Element symbols start with an uppercase letter, found '{c}'"
                )));
            }

            (State::Count(symbol, mut digits), '0'..='9') => {
                digits.push(c);
                State::Count(symbol, digits)
            }
            (State::Count(symbol, digits), 'A'..='Z') => {
                tokens.push(token(symbol, Some(&digits))?);
                State::Upper(c)
            }
            (State::Count(..), _) if c.is_lowercase() => {
                return Err(CalcError::parse(format!(
                    "Element symbols start with an uppercase letter, found '{c}'"
                )));
            }

            (_, other) => {
                return Err(CalcError::parse(format!(
                    "Unexpected character '{other}' in formula '{compact}'"
                )));
            }
        };
    }

    match state {
        State::Start => {}
        State::Upper(upper) => tokens.push(token(upper.to_string(), None)?),
        State::Symbol(symbol) => tokens.push(token(symbol, None)?),
        State::Count(symbol, digits) => tokens.push(token(symbol, Some(&digits))?),
    }

    Ok(tokens)
}

fn token(symbol: String, digits: Option<&str>) -> CalcResult<FormulaToken> {
    let count = match digits {
        None => 1,
        Some(digits) => digits
            .parse::<u32>()
            .map_err(|_| CalcError::parse(format!("Count '{digits}' for {symbol} is too large")))?,
    };
    if count == 0 {
        return Err(CalcError::parse(format!("Count for {symbol} must be at least 1")));
    }
    Ok(FormulaToken { symbol, count })
}

/// Per-element atom tallies in first-occurrence order
fn tally(tokens: &[FormulaToken], multiplier: u32) -> CalcResult<Vec<(String, u32)>> {
    let mut counts: Vec<(String, u32)> = Vec::new();
    for t in tokens {
        if element_by_symbol(&t.symbol).is_none() {
            return Err(CalcError::new(
                super::CalcErrorKind::LookupMiss,
                format!("Unknown element: {}", t.symbol),
            ));
        }
        let add = t
            .count
            .checked_mul(multiplier)
            .ok_or_else(|| CalcError::parse("Atom count overflow"))?;
        match counts.iter_mut().find(|(s, _)| *s == t.symbol) {
            Some((_, n)) => {
                *n = n.checked_add(add).ok_or_else(|| CalcError::parse("Atom count overflow"))?;
            }
            None => counts.push((t.symbol.clone(), add)),
        }
    }
    Ok(counts)
}

// ============================================================================
// Molar mass
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MassPart {
    pub symbol: String,
    pub count: u32,
    pub atomic_mass: f64,
    pub subtotal: f64,
}

/// Molar mass breakdown of a formula
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MolarMass {
    pub formula: String,
    pub parts: Vec<MassPart>,
    /// g/mol
    pub total: f64,
}

pub fn molar_mass(formula: &str) -> CalcResult<MolarMass> {
    let tokens = tokenize(formula)?;
    let counts = tally(&tokens, 1)?;

    let mut parts = Vec::with_capacity(counts.len());
    for (symbol, count) in counts {
        // tally() has already resolved every symbol
        let Some(element) = element_by_symbol(&symbol) else {
            return Err(CalcError::parse(format!("Unknown element: {symbol}")));
        };
        parts.push(MassPart {
            subtotal: element.atomic_mass * f64::from(count),
            atomic_mass: element.atomic_mass,
            symbol,
            count,
        });
    }

    Ok(MolarMass {
        formula: formula.chars().filter(|c| !c.is_whitespace()).collect(),
        total: parts.iter().map(|p| p.subtotal).sum(),
        parts,
    })
}

impl fmt::Display for MolarMass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Molar mass of {}:", self.formula)?;
        for part in &self.parts {
            writeln!(
                f,
                "{}: {} × {:.3} = {:.3}",
                part.symbol, part.count, part.atomic_mass, part.subtotal
            )?;
        }
        write!(f, "Total: {:.3} g/mol", self.total)
    }
}

// ============================================================================
// Balance check
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementBalance {
    pub symbol: String,
    pub left: u32,
    pub right: u32,
}

/// Atom tallies on both sides of a reaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceReport {
    pub equation: String,
    pub elements: Vec<ElementBalance>,
}

impl BalanceReport {
    pub fn is_balanced(&self) -> bool {
        self.elements.iter().all(|e| e.left == e.right)
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &ElementBalance> {
        self.elements.iter().filter(|e| e.left != e.right)
    }
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_balanced() {
            write!(f, "Equation is balanced: {}", self.equation)?;
            for e in &self.elements {
                write!(f, "\n- {}: {} = {}", e.symbol, e.left, e.right)?;
            }
        } else {
            write!(f, "Equation is not balanced: {}", self.equation)?;
            for e in self.mismatches() {
                write!(f, "\n- {}: {} on the left, {} on the right", e.symbol, e.left, e.right)?;
            }
        }
        Ok(())
    }
}

/// Compare atom counts across `reactants -> products`. Does not solve for coefficients.
pub fn check_balance(equation: &str) -> CalcResult<BalanceReport> {
    let equation = equation.trim();
    let (left, right) = ["->", "→", "="]
        .iter()
        .find_map(|sep| equation.split_once(sep))
        .ok_or_else(|| {
            CalcError::parse("Chemical equation needs '->', '→' or '=' between the two sides")
        })?;

    let left = side_counts(left)?;
    let right = side_counts(right)?;

    let mut elements: Vec<ElementBalance> = left
        .iter()
        .map(|(symbol, n)| ElementBalance {
            symbol: symbol.clone(),
            left: *n,
            right: right.iter().find(|(s, _)| s == symbol).map_or(0, |(_, n)| *n),
        })
        .collect();
    for (symbol, n) in &right {
        if !elements.iter().any(|e| &e.symbol == symbol) {
            elements.push(ElementBalance {
                symbol: symbol.clone(),
                left: 0,
                right: *n,
            });
        }
    }

    Ok(BalanceReport {
        equation: equation.to_string(),
        elements,
    })
}

fn side_counts(side: &str) -> CalcResult<Vec<(String, u32)>> {
    let mut totals: Vec<(String, u32)> = Vec::new();
    for term in side.split('+') {
        let term = term.trim();
        if term.is_empty() {
            return Err(CalcError::parse("Empty term in chemical equation"));
        }

        let digits: String = term.chars().take_while(char::is_ascii_digit).collect();
        let rest: String = term.chars().skip(digits.len()).collect();
        let coefficient = if digits.is_empty() {
            1
        } else {
            digits
                .parse::<u32>()
                .map_err(|_| CalcError::parse(format!("Coefficient '{digits}' is too large")))?
        };
        if coefficient == 0 {
            return Err(CalcError::parse(format!("Coefficient of '{term}' must be at least 1")));
        }

        for (symbol, n) in tally(&tokenize(&rest)?, coefficient)? {
            match totals.iter_mut().find(|(s, _)| *s == symbol) {
                Some((_, total)) => {
                    *total = total
                        .checked_add(n)
                        .ok_or_else(|| CalcError::parse("Atom count overflow"))?;
                }
                None => totals.push((symbol, n)),
            }
        }
    }
    Ok(totals)
}
