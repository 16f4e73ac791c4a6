//! Chemistry tools: elements, formulas, solutions

use super::{parse_input, Domain, Tool, ToolOutput};
use crate::toolkit::tables::{find_constant, find_element, CHEMISTRY_CONSTANTS};
use crate::toolkit::{chemistry, formula};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct ElementInput {
    #[serde(alias = "symbol", alias = "element_symbol")]
    element: String,
}

pub struct ElementInfoTool;

#[async_trait]
impl Tool for ElementInfoTool {
    fn name(&self) -> &'static str {
        "get_element_info"
    }

    fn description(&self) -> String {
        "Look up an element by symbol or name (e.g. 'C' or 'carbon'): atomic number and atomic mass."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["element"],
            "properties": {
                "element": {"type": "string", "description": "Symbol or name"}
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Chemistry]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: ElementInput = match parse_input(input) {
            Ok(i) => i,
            Err(e) => return e,
        };
        ToolOutput::from_report(find_element(&input.element))
    }
}

#[derive(Debug, Deserialize)]
struct FormulaInput {
    #[serde(alias = "molecular_formula")]
    formula: String,
}

pub struct MolarMassTool;

#[async_trait]
impl Tool for MolarMassTool {
    fn name(&self) -> &'static str {
        "calculate_molar_mass"
    }

    fn description(&self) -> String {
        "Molar mass of a flat molecular formula such as 'H2O' or 'C6H12O6'. \
         Element symbols are case-sensitive; parentheses and hydrates are not supported."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["formula"],
            "properties": {
                "formula": {"type": "string"}
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Chemistry]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: FormulaInput = match parse_input(input) {
            Ok(i) => i,
            Err(e) => return e,
        };
        ToolOutput::from_report(formula::molar_mass(&input.formula))
    }
}

#[derive(Debug, Deserialize)]
struct EquationInput {
    equation: String,
}

pub struct BalanceEquationTool;

#[async_trait]
impl Tool for BalanceEquationTool {
    fn name(&self) -> &'static str {
        "balance_equation"
    }

    fn description(&self) -> String {
        "Check whether a chemical equation is balanced, e.g. '2H2 + O2 -> 2H2O'. \
         Reports atom counts per element; does not compute coefficients."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["equation"],
            "properties": {
                "equation": {"type": "string", "description": "Reactants and products separated by '->'"}
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Chemistry]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: EquationInput = match parse_input(input) {
            Ok(i) => i,
            Err(e) => return e,
        };
        match formula::check_balance(&input.equation) {
            Ok(report) => {
                let balanced = report.is_balanced();
                let mut output = ToolOutput::from_report(Ok(report));
                if let Some(Value::Object(data)) = output.display_data.as_mut() {
                    data.insert("balanced".to_string(), Value::Bool(balanced));
                }
                output
            }
            Err(e) => e.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MolarityInput {
    #[serde(default, alias = "moles")]
    solute_moles: Option<f64>,
    #[serde(default, alias = "volume")]
    volume_liters: Option<f64>,
    #[serde(default)]
    molarity: Option<f64>,
}

pub struct MolarityTool;

#[async_trait]
impl Tool for MolarityTool {
    fn name(&self) -> &'static str {
        "calculate_molarity"
    }

    fn description(&self) -> String {
        "Solve M = n / V. Give exactly two of solute_moles, volume_liters and molarity; \
         the third is computed."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "solute_moles": {"type": "number", "minimum": 0},
                "volume_liters": {"type": "number", "minimum": 0},
                "molarity": {"type": "number", "minimum": 0}
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Chemistry]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: MolarityInput = match parse_input(input) {
            Ok(i) => i,
            Err(e) => return e,
        };
        ToolOutput::from_report(chemistry::molarity(
            input.solute_moles,
            input.volume_liters,
            input.molarity,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ConstantInput {
    #[serde(alias = "name", alias = "constant")]
    constant_name: String,
}

pub struct ChemistryConstantTool;

#[async_trait]
impl Tool for ChemistryConstantTool {
    fn name(&self) -> &'static str {
        "get_chemistry_constant"
    }

    fn description(&self) -> String {
        let names: Vec<_> = CHEMISTRY_CONSTANTS.iter().map(|c| c.key).collect();
        format!("Look up a chemistry constant by name. Known constants: {}", names.join(", "))
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["constant_name"],
            "properties": {
                "constant_name": {"type": "string"}
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Chemistry]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: ConstantInput = match parse_input(input) {
            Ok(i) => i,
            Err(e) => return e,
        };
        ToolOutput::from_report(find_constant(CHEMISTRY_CONSTANTS, &input.constant_name))
    }
}

fn default_is_acid() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct PhInput {
    concentration: f64,
    #[serde(default = "default_is_acid")]
    is_acid: bool,
}

pub struct PhTool;

#[async_trait]
impl Tool for PhTool {
    fn name(&self) -> &'static str {
        "calculate_ph"
    }

    fn description(&self) -> String {
        "pH and pOH from a molar concentration. The concentration is [H+] when is_acid is true \
         (the default) and [OH-] otherwise."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["concentration"],
            "properties": {
                "concentration": {"type": "number", "exclusiveMinimum": 0},
                "is_acid": {"type": "boolean", "default": true}
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Chemistry]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: PhInput = match parse_input(input) {
            Ok(i) => i,
            Err(e) => return e,
        };
        ToolOutput::from_report(chemistry::ph(input.concentration, input.is_acid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::CalcErrorKind;

    #[tokio::test]
    async fn test_element_by_name() {
        let result = ElementInfoTool.run(json!({"element": "carbon"})).await;
        assert!(result.success, "{}", result.output);
        assert_eq!(result.output, "Carbon (C)\nAtomic Number: 6\nAtomic Mass: 12.011 u");
    }

    #[tokio::test]
    async fn test_element_unknown() {
        let result = ElementInfoTool.run(json!({"element": "Zz"})).await;
        assert_eq!(result.error_kind, Some(CalcErrorKind::LookupMiss));
    }

    #[tokio::test]
    async fn test_molar_mass_water() {
        let result = MolarMassTool.run(json!({"formula": "H2O"})).await;
        assert!(result.success, "{}", result.output);
        assert!(result.output.ends_with("Total: 18.015 g/mol"));
        let total = result.display_data.unwrap()["total"].as_f64().unwrap();
        assert!((total - 18.015).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_molar_mass_parentheses_unsupported() {
        let result = MolarMassTool.run(json!({"formula": "Ca(OH)2"})).await;
        assert_eq!(result.error_kind, Some(CalcErrorKind::Unsupported));
    }

    #[tokio::test]
    async fn test_balance_equation() {
        let result = BalanceEquationTool
            .run(json!({"equation": "2H2 + O2 -> 2H2O"}))
            .await;
        assert!(result.success, "{}", result.output);
        assert!(result.output.starts_with("Equation is balanced"));
        assert_eq!(result.display_data.unwrap()["balanced"], true);

        let result = BalanceEquationTool.run(json!({"equation": "H2 + O2 -> H2O"})).await;
        assert!(result.success);
        assert!(result.output.contains("- O: 2 on the left, 1 on the right"));
        assert_eq!(result.display_data.unwrap()["balanced"], false);
    }

    #[tokio::test]
    async fn test_molarity() {
        let result = MolarityTool
            .run(json!({"solute_moles": 0.5, "volume_liters": 2}))
            .await;
        assert!(result.success, "{}", result.output);
        assert_eq!(
            result.output,
            "Molarity = Moles / Volume = 0.5 mol / 2 L = 0.250 M"
        );
        assert_eq!(result.display_data.unwrap()["solved_for"], "molarity");
    }

    #[tokio::test]
    async fn test_molarity_needs_two_values() {
        let result = MolarityTool.run(json!({"molarity": 1})).await;
        assert_eq!(result.error_kind, Some(CalcErrorKind::Parse));
    }

    #[tokio::test]
    async fn test_chemistry_constant() {
        let result = ChemistryConstantTool
            .run(json!({"constant_name": "Faraday Constant"}))
            .await;
        assert!(result.success, "{}", result.output);
        assert!(result.output.starts_with("F = "));
    }

    #[tokio::test]
    async fn test_ph_defaults_to_acid() {
        let result = PhTool.run(json!({"concentration": 0.001})).await;
        assert!(result.success, "{}", result.output);
        assert!(result.output.contains("pH = -log[H+] = -log(0.001) = 3.00"));
        assert!(result.output.ends_with("Solution is acidic"), "{}", result.output);
    }

    #[tokio::test]
    async fn test_ph_base() {
        let result = PhTool
            .run(json!({"concentration": 0.01, "is_acid": false}))
            .await;
        assert!(result.success);
        assert!(result.output.contains("pH = 14 - pOH = 12.00"));
    }

    #[tokio::test]
    async fn test_ph_rejects_zero() {
        let result = PhTool.run(json!({"concentration": 0})).await;
        assert_eq!(result.error_kind, Some(CalcErrorKind::Domain));
    }
}
