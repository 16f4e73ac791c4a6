//! Expression evaluation, equation solving and function plotting
//!
//! [`MathEvaluator`] owns input validation and output formatting. The
//! algebra sits behind [`SymbolicEngine`] and sampling behind [`Plotter`],
//! so either can be swapped for a heavier backend.

use super::expr::{self, BuiltinEngine, Solution};
use super::{format_number, CalcError, CalcResult};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const MAX_INPUT_CHARS: usize = 512;
pub const PLOT_POINTS: u32 = 400;
pub const DEFAULT_RANGE: &str = "-10,10";

const INEQUALITIES: &[&str] = &["<", ">", "!=", "≤", "≥", "≠"];

/// Symbolic algebra backend
pub trait SymbolicEngine: Send + Sync {
    /// Evaluate a closed expression to a number
    fn evaluate(&self, expression: &str) -> CalcResult<f64>;

    /// Solve `lhs = rhs` for x
    fn solve(&self, lhs: &str, rhs: &str) -> CalcResult<Solution>;
}

/// Function sampling backend
pub trait Plotter: Send + Sync {
    fn render(&self, function: &str, range: PlotRange) -> CalcResult<PlotArtifact>;
}

// ============================================================================
// Plot types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotRange {
    pub min: f64,
    pub max: f64,
}

impl FromStr for PlotRange {
    type Err = CalcError;

    /// `"min,max"` with finite bounds and `min < max`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s
            .split_once(',')
            .ok_or_else(|| CalcError::parse(format!("Range '{s}' must look like 'min,max'")))?;
        let bound = |text: &str| {
            text.trim()
                .parse::<f64>()
                .map_err(|_| CalcError::parse(format!("Range bound '{}' is not a number", text.trim())))
        };
        let (min, max) = (bound(min)?, bound(max)?);

        if !min.is_finite() || !max.is_finite() {
            return Err(CalcError::domain("Range bounds must be finite"));
        }
        if min >= max {
            return Err(CalcError::domain(format!(
                "Range minimum {} must be below maximum {}",
                format_number(min),
                format_number(max)
            )));
        }
        Ok(Self { min, max })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotPoint {
    pub x: f64,
    /// `None` where the function is undefined
    pub y: Option<f64>,
}

/// Sampled function, ready for a client to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotArtifact {
    pub function: String,
    pub x_min: f64,
    pub x_max: f64,
    pub points: Vec<PlotPoint>,
}

impl PlotArtifact {
    pub fn undefined_points(&self) -> usize {
        self.points.iter().filter(|p| p.y.is_none()).count()
    }
}

impl fmt::Display for PlotArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Graph created for f(x) = {}. Range: [{}, {}], {} points",
            self.function,
            format_number(self.x_min),
            format_number(self.x_max),
            self.points.len()
        )?;
        match self.undefined_points() {
            0 => Ok(()),
            n => write!(f, " ({n} undefined)"),
        }
    }
}

/// Evenly spaced samples using the built-in parser
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesPlotter;

impl Plotter for SeriesPlotter {
    fn render(&self, function: &str, range: PlotRange) -> CalcResult<PlotArtifact> {
        let parsed = expr::parse(function)?;
        let extra: Vec<String> = parsed
            .free_symbols()
            .into_iter()
            .filter(|s| s != expr::VARIABLE)
            .collect();
        if !extra.is_empty() {
            return Err(CalcError::unsupported(format!(
                "Only functions of x can be plotted (found {})",
                extra.join(", ")
            )));
        }

        // Interpolate rather than step: max - min overflows for wide finite ranges
        let last = f64::from(PLOT_POINTS - 1);
        let points: Vec<PlotPoint> = (0..PLOT_POINTS)
            .map(|i| {
                let t = f64::from(i) / last;
                let x = range.min * (1.0 - t) + range.max * t;
                PlotPoint {
                    x,
                    y: parsed.eval(Some(x)).ok(),
                }
            })
            .collect();

        if points.iter().all(|p| p.y.is_none()) {
            return Err(CalcError::domain(format!(
                "f(x) = {function} is undefined over the whole range"
            )));
        }

        Ok(PlotArtifact {
            function: function.to_string(),
            x_min: range.min,
            x_max: range.max,
            points,
        })
    }
}

// ============================================================================
// Evaluator
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub value: f64,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Result: {}", format_number(self.value))
    }
}

/// Validating front end over a symbolic engine and a plotter
#[derive(Clone)]
pub struct MathEvaluator {
    engine: Arc<dyn SymbolicEngine>,
    plotter: Arc<dyn Plotter>,
}

impl Default for MathEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(BuiltinEngine), Arc::new(SeriesPlotter))
    }
}

impl MathEvaluator {
    pub fn new(engine: Arc<dyn SymbolicEngine>, plotter: Arc<dyn Plotter>) -> Self {
        Self { engine, plotter }
    }

    pub fn evaluate(&self, expression: &str) -> CalcResult<Evaluation> {
        let expression = sanitize(expression)?;
        if expression.contains('=') {
            return Err(CalcError::parse(
                "Expressions cannot contain '='; use solve_equation for equations",
            ));
        }
        let value = self.engine.evaluate(expression)?;
        Ok(Evaluation { value })
    }

    pub fn solve(&self, equation: &str) -> CalcResult<Solution> {
        let equation = sanitize(equation)?;
        if let Some(op) = INEQUALITIES.iter().find(|op| equation.contains(*op)) {
            return Err(CalcError::unsupported(format!(
                "Inequalities ('{op}') are not supported; provide an equation like 2*x + 5 = 11"
            )));
        }
        if equation.matches('=').count() != 1 {
            return Err(CalcError::parse(
                "Please provide equation in format: expression = value (exactly one '=')",
            ));
        }
        let Some((lhs, rhs)) = equation.split_once('=') else {
            return Err(CalcError::parse("Missing '=' in equation"));
        };
        if lhs.trim().is_empty() || rhs.trim().is_empty() {
            return Err(CalcError::parse("Both sides of the equation must be non-empty"));
        }
        self.engine.solve(lhs, rhs)
    }

    /// Sample `function` over `range` (`"min,max"`, default `-10,10`).
    /// A leading `y =` or `f(x) =` is accepted.
    pub fn graph(&self, function: &str, range: Option<&str>) -> CalcResult<PlotArtifact> {
        let function = sanitize(function)?;
        let function = match function.split_once('=') {
            None => function,
            Some((lhs, rhs)) if matches!(lhs.trim(), "y" | "f(x)") && !rhs.contains('=') => {
                sanitize(rhs)?
            }
            Some(_) => {
                return Err(CalcError::parse(
                    "Graph a function of x, e.g. 'x^2' or 'y = x^2'",
                ))
            }
        };
        let range: PlotRange = range.unwrap_or(DEFAULT_RANGE).parse()?;
        self.plotter.render(function, range)
    }
}

fn sanitize(input: &str) -> CalcResult<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CalcError::parse("Input is empty"));
    }
    let len = trimmed.chars().count();
    if len > MAX_INPUT_CHARS {
        return Err(CalcError::parse(format!(
            "Input is too long ({len} characters, limit {MAX_INPUT_CHARS})"
        )));
    }
    Ok(trimmed)
}
