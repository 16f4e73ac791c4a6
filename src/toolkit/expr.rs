//! Built-in expression parser, evaluator and single-variable solver
//!
//! Supports `+ - * / ^ ** ( )`, implicit multiplication (`2x`, `3(x+1)`),
//! the constants `pi` and `e`, and a small set of one-argument functions.
//! Equations in `x` that reduce to polynomials of degree two or less are
//! solved exactly; everything else goes through a sign-change scan.

use super::math::SymbolicEngine;
use super::{format_number, CalcError, CalcResult};
use serde::Serialize;
use std::collections::BTreeSet;
use std::f64::consts::{E, PI};
use std::fmt;

/// The only variable the solver understands
pub const VARIABLE: &str = "x";

const MAX_DEGREE: usize = 8;
const SCAN_MIN: f64 = -100.0;
const SCAN_MAX: f64 = 100.0;
const SCAN_SAMPLES: u32 = 4000;
const ZERO_EPS: f64 = 1e-12;
/// Coefficients this small relative to the equation's largest are rounding noise
const COEFF_EPS: f64 = 64.0 * f64::EPSILON;
const RESIDUAL_EPS: f64 = 1e-6;
const DEDUP_EPS: f64 = 1e-6;

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> CalcResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Scientific notation only when an exponent actually follows: 2e3, 1.5e-4
                if i < chars.len() && matches!(chars[i], 'e' | 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && matches!(chars[j], '+' | '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| CalcError::parse(format!("Invalid number '{text}'")))?;
                tokens.push(Token::Num(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Caret);
                i += 2;
            }
            _ => {
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' | '−' => Token::Minus,
                    '*' | '×' => Token::Star,
                    '/' | '÷' => Token::Slash,
                    '^' => Token::Caret,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    other => {
                        return Err(CalcError::parse(format!("Unexpected character '{other}'")));
                    }
                });
                i += 1;
            }
        }
    }

    Ok(tokens)
}

// ============================================================================
// Syntax tree
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Exp,
    Ln,
    Log,
    Abs,
}

impl Func {
    pub const NAMES: &'static [&'static str] = &[
        "sin", "cos", "tan", "asin", "acos", "atan", "sqrt", "exp", "ln", "log", "abs",
    ];

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "asin" => Func::Asin,
            "acos" => Func::Acos,
            "atan" => Func::Atan,
            "sqrt" => Func::Sqrt,
            "exp" => Func::Exp,
            "ln" => Func::Ln,
            "log" => Func::Log,
            "abs" => Func::Abs,
            _ => return None,
        })
    }

    fn apply(self, v: f64) -> f64 {
        match self {
            Func::Sin => v.sin(),
            Func::Cos => v.cos(),
            Func::Tan => v.tan(),
            Func::Asin => v.asin(),
            Func::Acos => v.acos(),
            Func::Atan => v.atan(),
            Func::Sqrt => v.sqrt(),
            Func::Exp => v.exp(),
            Func::Ln => v.ln(),
            Func::Log => v.log10(),
            Func::Abs => v.abs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Var(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary(op, Box::new(lhs), Box::new(rhs))
}

// ============================================================================
// Parser
// ============================================================================

/// Parse an expression
pub fn parse(input: &str) -> CalcResult<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(CalcError::parse("Empty expression"));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(Token::RParen) => Err(CalcError::parse("Unbalanced ')'")),
        Some(token) => Err(CalcError::parse(format!("Unexpected {}", describe(token)))),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> CalcResult<Expr> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            lhs = binary(op, lhs, self.term()?);
        }
    }

    // term := unary (('*' | '/') unary | <implicit> power)*
    fn term(&mut self) -> CalcResult<Expr> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    lhs = binary(BinOp::Mul, lhs, self.unary()?);
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    lhs = binary(BinOp::Div, lhs, self.unary()?);
                }
                Some(Token::Num(_) | Token::Ident(_) | Token::LParen) => {
                    lhs = binary(BinOp::Mul, lhs, self.power()?);
                }
                _ => return Ok(lhs),
            }
        }
    }

    // unary := ('-' | '+') unary | power
    fn unary(&mut self) -> CalcResult<Expr> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    // power := primary ('^' unary)?    right-associative via unary -> power
    fn power(&mut self) -> CalcResult<Expr> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            return Ok(binary(BinOp::Pow, base, self.unary()?));
        }
        Ok(base)
    }

    fn primary(&mut self) -> CalcResult<Expr> {
        match self.advance() {
            Some(Token::Num(n)) => Ok(Expr::Num(n)),
            Some(Token::Ident(name)) => {
                if let Some(func) = Func::from_name(&name) {
                    if self.peek() != Some(&Token::LParen) {
                        return Err(CalcError::parse(format!(
                            "Function '{name}' needs parentheses, e.g. {name}(x)"
                        )));
                    }
                    self.pos += 1;
                    let arg = self.expression()?;
                    self.expect_rparen()?;
                    return Ok(Expr::Call(func, Box::new(arg)));
                }
                Ok(match name.as_str() {
                    "pi" | "π" => Expr::Num(PI),
                    "e" | "E" => Expr::Num(E),
                    _ => Expr::Var(name),
                })
            }
            Some(Token::LParen) => {
                let inner = self.expression()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Some(token) => Err(CalcError::parse(format!("Unexpected {}", describe(&token)))),
            None => Err(CalcError::parse("Unexpected end of expression")),
        }
    }

    fn expect_rparen(&mut self) -> CalcResult<()> {
        match self.advance() {
            Some(Token::RParen) => Ok(()),
            _ => Err(CalcError::parse("Missing ')'")),
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Num(n) => format!("number {}", format_number(*n)),
        Token::Ident(name) => format!("'{name}'"),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Star => "'*'".to_string(),
        Token::Slash => "'/'".to_string(),
        Token::Caret => "'^'".to_string(),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
    }
}

// ============================================================================
// Evaluation
// ============================================================================

impl Expr {
    /// Evaluate with `x` bound to the given value, if any
    pub fn eval(&self, x: Option<f64>) -> CalcResult<f64> {
        let value = match self {
            Expr::Num(n) => *n,
            Expr::Var(name) => match x {
                Some(x) if name == VARIABLE => x,
                _ => return Err(CalcError::parse(format!("Undefined symbol '{name}'"))),
            },
            Expr::Neg(inner) => -inner.eval(x)?,
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval(x)?;
                let b = rhs.eval(x)?;
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => {
                        if b == 0.0 {
                            return Err(CalcError::domain("Division by zero"));
                        }
                        a / b
                    }
                    BinOp::Pow => a.powf(b),
                }
            }
            Expr::Call(func, arg) => func.apply(arg.eval(x)?),
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(CalcError::domain("Result is not a real number"))
        }
    }

    /// Names of unbound variables, sorted
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Num(_) => {}
            Expr::Var(name) => {
                out.insert(name.clone());
            }
            Expr::Neg(inner) | Expr::Call(_, inner) => inner.collect_symbols(out),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_symbols(out);
                rhs.collect_symbols(out);
            }
        }
    }

    fn has_variable(&self) -> bool {
        self.free_symbols().contains(VARIABLE)
    }

    /// Polynomial coefficients in `x`, lowest power first.
    ///
    /// `Ok(None)` when the expression isn't a polynomial of degree at most
    /// eight (x inside a function or denominator, fractional powers).
    pub fn polynomial(&self) -> CalcResult<Option<Vec<f64>>> {
        if !self.has_variable() {
            return self.eval(None).map(|c| Some(vec![c]));
        }
        Ok(match self {
            Expr::Num(n) => Some(vec![*n]),
            Expr::Var(_) => Some(vec![0.0, 1.0]),
            Expr::Neg(inner) => inner
                .polynomial()?
                .map(|p| p.into_iter().map(|c| -c).collect()),
            Expr::Binary(op, lhs, rhs) => {
                let (Some(a), Some(b)) = (lhs.polynomial()?, rhs.polynomial()?) else {
                    return Ok(None);
                };
                match op {
                    BinOp::Add => Some(poly_add(&a, &b, 1.0)),
                    BinOp::Sub => Some(poly_add(&a, &b, -1.0)),
                    BinOp::Mul => poly_mul(&a, &b),
                    BinOp::Div => match trimmed(b).as_slice() {
                        [d] if *d != 0.0 => Some(a.into_iter().map(|c| c / d).collect()),
                        [_] => return Err(CalcError::domain("Division by zero")),
                        _ => None,
                    },
                    BinOp::Pow => match trimmed(b).as_slice() {
                        [n] => integer_exponent(*n).and_then(|n| poly_pow(&a, n)),
                        _ => None,
                    },
                }
            }
            Expr::Call(..) => None,
        })
    }
}

fn integer_exponent(n: f64) -> Option<u32> {
    let max = u32::try_from(MAX_DEGREE).ok()?;
    (0..=max).find(|k| (f64::from(*k) - n).abs() < ZERO_EPS)
}

fn poly_add(a: &[f64], b: &[f64], sign: f64) -> Vec<f64> {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| a.get(i).copied().unwrap_or(0.0) + sign * b.get(i).copied().unwrap_or(0.0))
        .collect()
}

fn poly_mul(a: &[f64], b: &[f64]) -> Option<Vec<f64>> {
    let a = trimmed(a.to_vec());
    let b = trimmed(b.to_vec());
    if a.len() + b.len() - 2 > MAX_DEGREE {
        return None;
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    Some(out)
}

fn poly_pow(base: &[f64], n: u32) -> Option<Vec<f64>> {
    let mut out = vec![1.0];
    for _ in 0..n {
        out = poly_mul(&out, base)?;
    }
    Some(out)
}

/// Drop zero leading coefficients; always keeps at least the constant term
fn trimmed(mut p: Vec<f64>) -> Vec<f64> {
    while p.len() > 1 && p.last().is_some_and(|c| *c == 0.0) {
        p.pop();
    }
    if p.is_empty() {
        p.push(0.0);
    }
    p
}

/// `lhs - rhs` divided by the largest coefficient on either side.
///
/// Leading terms below `COEFF_EPS` after scaling are cancellation residue
/// and are dropped, so `x + 0.1 + 0.2 = x + 0.3` stays an identity while
/// `1e-13 x = 1e-13` keeps its linear term.
fn normalized(lhs: &[f64], rhs: &[f64]) -> Vec<f64> {
    let scale = lhs.iter().chain(rhs).fold(0.0_f64, |m, c| m.max(c.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return trimmed(poly_add(lhs, rhs, -1.0));
    }
    let mut p: Vec<f64> = poly_add(lhs, rhs, -1.0).into_iter().map(|c| c / scale).collect();
    while p.len() > 1 && p.last().is_some_and(|c| c.abs() < COEFF_EPS) {
        p.pop();
    }
    trimmed(p)
}

// ============================================================================
// Solving
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Root {
    Real { value: f64 },
    Complex { re: f64, im: f64 },
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Root::Real { value } => f.write_str(&format_number(value)),
            Root::Complex { re, im } => {
                let sign = if im < 0.0 { '-' } else { '+' };
                write!(f, "{} {sign} {}i", format_number(re), format_number(im.abs()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "roots", rename_all = "snake_case")]
pub enum SolutionSet {
    Finite(Vec<Root>),
    /// Every x satisfies the equation
    Identity,
    /// No x satisfies the equation
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMethod {
    Exact,
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub set: SolutionSet,
    pub method: SolveMethod,
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.set, self.method) {
            (SolutionSet::Finite(roots), method) => {
                let list = roots.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
                write!(f, "Solution: x = [{list}]")?;
                if method == SolveMethod::Numeric {
                    write!(f, " (numeric search over [{SCAN_MIN}, {SCAN_MAX}])")?;
                }
                Ok(())
            }
            (SolutionSet::Identity, _) => f.write_str("Solution: every real x satisfies the equation"),
            (SolutionSet::Empty, SolveMethod::Exact) => f.write_str("No solution: the equation has no solution"),
            (SolutionSet::Empty, SolveMethod::Numeric) => {
                write!(f, "No real solutions found in [{SCAN_MIN}, {SCAN_MAX}]")
            }
        }
    }
}

/// Solve `lhs = rhs` for x
pub fn solve(lhs: &Expr, rhs: &Expr) -> CalcResult<Solution> {
    let f = binary(BinOp::Sub, lhs.clone(), rhs.clone());

    let extra: Vec<String> = f
        .free_symbols()
        .into_iter()
        .filter(|s| s != VARIABLE)
        .collect();
    if !extra.is_empty() {
        return Err(CalcError::unsupported(format!(
            "Only equations in x are supported (found {})",
            extra.join(", ")
        )));
    }

    if let (Some(l), Some(r)) = (lhs.polynomial()?, rhs.polynomial()?) {
        let poly = normalized(&l, &r);
        if poly.len() <= 3 {
            return Ok(Solution {
                set: solve_low_degree(&poly),
                method: SolveMethod::Exact,
            });
        }
    }

    Ok(Solution {
        set: scan(&f),
        method: SolveMethod::Numeric,
    })
}

fn solve_low_degree(poly: &[f64]) -> SolutionSet {
    match *poly {
        [c] => {
            if c.abs() < COEFF_EPS {
                SolutionSet::Identity
            } else {
                SolutionSet::Empty
            }
        }
        [c0, c1] => SolutionSet::Finite(vec![Root::Real {
            value: clean(-c0 / c1),
        }]),
        [c, b, a] => {
            let disc = b * b - 4.0 * a * c;
            let scale = (b * b).max((4.0 * a * c).abs());
            if disc.abs() <= COEFF_EPS * scale {
                SolutionSet::Finite(vec![Root::Real {
                    value: clean(-b / (2.0 * a)),
                }])
            } else if disc > 0.0 {
                let sq = disc.sqrt();
                let mut roots = [(-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)];
                roots.sort_by(f64::total_cmp);
                SolutionSet::Finite(roots.iter().map(|r| Root::Real { value: clean(*r) }).collect())
            } else {
                let re = clean(-b / (2.0 * a));
                let im = ((-disc).sqrt() / (2.0 * a)).abs();
                SolutionSet::Finite(vec![Root::Complex { re, im: -im }, Root::Complex { re, im }])
            }
        }
        _ => SolutionSet::Empty,
    }
}

fn clean(v: f64) -> f64 {
    if v.abs() < 1e-9 {
        0.0
    } else {
        v
    }
}

/// Sign-change scan with bisection over the fixed search interval
fn scan(f: &Expr) -> SolutionSet {
    let step = (SCAN_MAX - SCAN_MIN) / f64::from(SCAN_SAMPLES);
    let mut roots: Vec<f64> = Vec::new();
    let mut finite_samples = 0u32;
    let mut zero_samples = 0u32;
    let mut prev: Option<(f64, f64)> = None;

    for i in 0..=SCAN_SAMPLES {
        let x = SCAN_MIN + step * f64::from(i);
        let Ok(fx) = f.eval(Some(x)) else {
            prev = None;
            continue;
        };
        finite_samples += 1;

        if fx.abs() < ZERO_EPS {
            zero_samples += 1;
            roots.push(x);
        } else if let Some((px, pfx)) = prev {
            if pfx.abs() >= ZERO_EPS && pfx.signum() != fx.signum() {
                if let Some(root) = bisect(f, px, pfx, x) {
                    roots.push(root);
                }
            }
        }
        prev = Some((x, fx));
    }

    if finite_samples > 0 && zero_samples == finite_samples {
        return SolutionSet::Identity;
    }

    roots.sort_by(f64::total_cmp);
    roots.dedup_by(|a, b| (*a - *b).abs() < DEDUP_EPS);
    if roots.is_empty() {
        SolutionSet::Empty
    } else {
        SolutionSet::Finite(roots.into_iter().map(|r| Root::Real { value: clean(r) }).collect())
    }
}

/// Bisect a bracketed sign change; `None` when the bracket holds a pole
fn bisect(f: &Expr, mut lo: f64, mut f_lo: f64, mut hi: f64) -> Option<f64> {
    for _ in 0..200 {
        if hi - lo < 1e-13 {
            break;
        }
        let mid = 0.5 * (lo + hi);
        let f_mid = f.eval(Some(mid)).ok()?;
        if f_mid == 0.0 {
            return Some(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    let root = 0.5 * (lo + hi);
    let residual = f.eval(Some(root)).ok()?;
    (residual.abs() < RESIDUAL_EPS).then_some(root)
}

// ============================================================================
// Engine
// ============================================================================

/// The engine backed by this module
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEngine;

impl SymbolicEngine for BuiltinEngine {
    fn evaluate(&self, expression: &str) -> CalcResult<f64> {
        let expr = parse(expression)?;
        let symbols = expr.free_symbols();
        if !symbols.is_empty() {
            let names = symbols.into_iter().collect::<Vec<_>>().join(", ");
            return Err(CalcError::parse(format!(
                "Undefined symbol(s): {names}. Use solve_equation for equations in x"
            )));
        }
        expr.eval(None)
    }

    fn solve(&self, lhs: &str, rhs: &str) -> CalcResult<Solution> {
        solve(&parse(lhs)?, &parse(rhs)?)
    }
}
