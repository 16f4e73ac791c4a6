//! Physics tools: constants, unit conversion, mechanics formulas

use super::{normalize_tag, parse_input, Domain, Tool, ToolOutput};
use crate::toolkit::physics::{self, PhysicsInput};
use crate::toolkit::tables::{find_constant, PHYSICS_CONSTANTS};
use crate::toolkit::units;
use crate::toolkit::{CalcError, CalcErrorKind};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct ConstantInput {
    #[serde(alias = "name", alias = "constant")]
    constant_name: String,
}

pub struct PhysicsConstantTool;

#[async_trait]
impl Tool for PhysicsConstantTool {
    fn name(&self) -> &'static str {
        "get_physics_constant"
    }

    fn description(&self) -> String {
        let names: Vec<_> = PHYSICS_CONSTANTS.iter().map(|c| c.key).collect();
        format!("Look up a physical constant by name. Known constants: {}", names.join(", "))
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["constant_name"],
            "properties": {
                "constant_name": {
                    "type": "string",
                    "description": "Constant name, e.g. 'speed of light' or 'planck_constant'"
                }
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Physics]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: ConstantInput = match parse_input(input) {
            Ok(i) => i,
            Err(e) => return e,
        };
        ToolOutput::from_report(find_constant(PHYSICS_CONSTANTS, &input.constant_name))
    }
}

#[derive(Debug, Deserialize)]
struct ConvertInput {
    value: f64,
    #[serde(alias = "from")]
    from_unit: String,
    #[serde(alias = "to")]
    to_unit: String,
}

pub struct ConvertUnitsTool;

#[async_trait]
impl Tool for ConvertUnitsTool {
    fn name(&self) -> &'static str {
        "convert_units"
    }

    fn description(&self) -> String {
        let pairs: Vec<_> = units::supported_pairs().collect();
        format!(
            "Convert a value between units of length, mass or temperature. Supported: {}",
            pairs.join(", ")
        )
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["value", "from_unit", "to_unit"],
            "properties": {
                "value": {"type": "number"},
                "from_unit": {"type": "string", "description": "Source unit, e.g. 'm', 'kg', 'c'"},
                "to_unit": {"type": "string", "description": "Target unit, e.g. 'ft', 'lb', 'f'"}
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Physics]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: ConvertInput = match parse_input(input) {
            Ok(i) => i,
            Err(e) => return e,
        };
        ToolOutput::from_report(units::convert(input.value, &input.from_unit, &input.to_unit))
    }
}

pub struct CalculatePhysicsTool;

#[async_trait]
impl Tool for CalculatePhysicsTool {
    fn name(&self) -> &'static str {
        "calculate_physics"
    }

    fn description(&self) -> String {
        format!(
            "Apply a mechanics formula. 'formula' is one of {}; force takes mass and \
             acceleration, kinetic_energy takes mass and velocity, potential_energy takes \
             mass, height and optionally gravity (default {} m/s²).",
            PhysicsInput::FORMULAS.join(", "),
            physics::STANDARD_GRAVITY
        )
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["formula", "mass"],
            "properties": {
                "formula": {"type": "string", "enum": PhysicsInput::FORMULAS},
                "mass": {"type": "number", "description": "kg"},
                "acceleration": {"type": "number", "description": "m/s²"},
                "velocity": {"type": "number", "description": "m/s"},
                "height": {"type": "number", "description": "m"},
                "gravity": {"type": "number", "description": "m/s²"}
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Physics]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input = normalize_tag(input, "formula");
        let formula = input
            .get("formula")
            .and_then(Value::as_str)
            .map(ToString::to_string);

        match serde_json::from_value::<PhysicsInput>(input) {
            Ok(parsed) => ToolOutput::from_report(physics::calculate(parsed)),
            Err(e) if e.to_string().starts_with("unknown variant") => {
                CalcError::unsupported(format!(
                    "Formula '{}' not recognized. Available: {}",
                    formula.unwrap_or_default(),
                    PhysicsInput::FORMULAS.join(", ")
                ))
                .into()
            }
            Err(e) => ToolOutput::error(CalcErrorKind::Parse, format!("Invalid input: {e}")),
        }
    }
}
