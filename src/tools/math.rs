//! Math tools: evaluate, solve, graph

use super::{parse_input, Domain, Tool, ToolOutput};
use crate::toolkit::math::{MathEvaluator, DEFAULT_RANGE};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// Numeric evaluation of an arithmetic expression
pub struct CalculateExpressionTool {
    math: MathEvaluator,
}

impl CalculateExpressionTool {
    pub fn new(math: MathEvaluator) -> Self {
        Self { math }
    }
}

#[derive(Debug, Deserialize)]
struct ExpressionInput {
    expression: String,
}

#[async_trait]
impl Tool for CalculateExpressionTool {
    fn name(&self) -> &'static str {
        "calculate_expression"
    }

    fn description(&self) -> String {
        "Evaluate an arithmetic expression such as '2 + 3 * 4' or 'sqrt(16) + sin(pi/2)'. \
         Supports + - * / ^, parentheses, sqrt, sin, cos, tan, log (base 10), ln, exp, abs, pi and e."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["expression"],
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Expression to evaluate, with no free variables"
                }
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Math, Domain::Physics]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: ExpressionInput = match parse_input(input) {
            Ok(i) => i,
            Err(e) => return e,
        };
        ToolOutput::from_report(self.math.evaluate(&input.expression))
    }
}

/// Solve a single-variable equation in x
pub struct SolveEquationTool {
    math: MathEvaluator,
}

impl SolveEquationTool {
    pub fn new(math: MathEvaluator) -> Self {
        Self { math }
    }
}

#[derive(Debug, Deserialize)]
struct EquationInput {
    equation: String,
}

#[async_trait]
impl Tool for SolveEquationTool {
    fn name(&self) -> &'static str {
        "solve_equation"
    }

    fn description(&self) -> String {
        "Solve an equation in x, e.g. '2*x + 5 = 11' or 'x^2 - 5*x + 6 = 0'. \
         Polynomials up to degree two are solved exactly (including complex roots); \
         other equations are searched numerically for real roots in [-100, 100]."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["equation"],
            "properties": {
                "equation": {
                    "type": "string",
                    "description": "Equation with exactly one '=' and the unknown x"
                }
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Math]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: EquationInput = match parse_input(input) {
            Ok(i) => i,
            Err(e) => return e,
        };
        ToolOutput::from_report(self.math.solve(&input.equation))
    }
}

/// Sample a function of x for plotting
pub struct CreateGraphTool {
    math: MathEvaluator,
}

impl CreateGraphTool {
    pub fn new(math: MathEvaluator) -> Self {
        Self { math }
    }
}

#[derive(Debug, Deserialize)]
struct GraphInput {
    function: String,
    #[serde(default, alias = "range")]
    x_range: Option<String>,
}

#[async_trait]
impl Tool for CreateGraphTool {
    fn name(&self) -> &'static str {
        "create_graph"
    }

    fn description(&self) -> String {
        format!(
            "Plot a function of x such as 'x^2' or 'y = sin(x)'. Returns the sampled points \
             as display data. The range is 'min,max' and defaults to '{DEFAULT_RANGE}'."
        )
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["function"],
            "properties": {
                "function": {
                    "type": "string",
                    "description": "Function of x to plot"
                },
                "x_range": {
                    "type": "string",
                    "description": "Range as 'min,max'"
                }
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Math]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: GraphInput = match parse_input(input) {
            Ok(i) => i,
            Err(e) => return e,
        };
        ToolOutput::from_report(self.math.graph(&input.function, input.x_range.as_deref()))
    }
}
