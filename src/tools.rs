//! Calculator tools for the tutor
//!
//! Each calculator is exposed as a named tool with a JSON input schema.
//! Tools belong to one or more subject domains; the registry answers
//! "which tools does the physics tutor have" as well as executing by name.

mod biology;
mod chemistry;
mod math;
mod physics;

pub use biology::{BiologyInfoTool, ClassifyOrganismTool, DnaComplementTool, GeneticsInput, GeneticsTool};
pub use chemistry::{
    BalanceEquationTool, ChemistryConstantTool, ElementInfoTool, MolarMassTool, MolarityTool, PhTool,
};
pub use math::{CalculateExpressionTool, CreateGraphTool, SolveEquationTool};
pub use physics::{CalculatePhysicsTool, ConvertUnitsTool, PhysicsConstantTool};

use crate::toolkit::math::MathEvaluator;
use crate::toolkit::{CalcError, CalcErrorKind, CalcResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ============================================================================
// Domains
// ============================================================================

/// Subject area a query or tool belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Math,
    Physics,
    Biology,
    Chemistry,
    WebSearch,
    General,
}

impl Domain {
    /// Domains with a specialist agent, in display order
    pub const SPECIALISTS: [Domain; 5] = [
        Domain::Math,
        Domain::Physics,
        Domain::Biology,
        Domain::Chemistry,
        Domain::WebSearch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Math => "math",
            Domain::Physics => "physics",
            Domain::Biology => "biology",
            Domain::Chemistry => "chemistry",
            Domain::WebSearch => "web_search",
            Domain::General => "general",
        }
    }

    /// Agent that answers queries in this domain
    pub fn agent_id(self) -> &'static str {
        match self {
            Domain::Math => "math_agent",
            Domain::Physics => "physics_agent",
            Domain::Biology => "biology_agent",
            Domain::Chemistry => "chemistry_agent",
            Domain::WebSearch => "web_search_agent",
            Domain::General => crate::dispatch::ORCHESTRATOR_ID,
        }
    }

    pub fn agent_name(self) -> &'static str {
        match self {
            Domain::Math => "Math Tutor Agent",
            Domain::Physics => "Physics Tutor Agent",
            Domain::Biology => "Biology Tutor Agent",
            Domain::Chemistry => "Chemistry Tutor Agent",
            Domain::WebSearch => "Web Search Agent",
            Domain::General => "AI Tutor Orchestrator",
        }
    }

    pub fn capabilities(self) -> &'static [&'static str] {
        match self {
            Domain::Math => &["calculations", "equation solving", "graphing"],
            Domain::Physics => &["constants lookup", "unit conversions", "physics calculations"],
            Domain::Biology => &["biological information", "organism classification", "genetics"],
            Domain::Chemistry => &["element information", "molecular calculations", "chemical reactions"],
            Domain::WebSearch => &["current information", "real-time data", "web search"],
            Domain::General => &["routing", "general educational questions"],
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "math" | "mathematics" => Ok(Domain::Math),
            "physics" => Ok(Domain::Physics),
            "biology" => Ok(Domain::Biology),
            "chemistry" => Ok(Domain::Chemistry),
            "web_search" | "web" | "search" => Ok(Domain::WebSearch),
            "general" => Ok(Domain::General),
            other => Err(format!("unknown domain: {other}")),
        }
    }
}

// ============================================================================
// Tool output
// ============================================================================

/// Result from tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<CalcErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_data: Option<Value>,
}

impl ToolOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error_kind: None,
            display_data: None,
        }
    }

    pub fn error(kind: CalcErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: message.into(),
            error_kind: Some(kind),
            display_data: None,
        }
    }

    pub fn with_display(mut self, data: Value) -> Self {
        self.display_data = Some(data);
        self
    }

    /// Text of a calculator report, with its structured form as display data
    pub fn from_report<T: fmt::Display + Serialize>(result: CalcResult<T>) -> Self {
        match result {
            Ok(report) => {
                let output = Self::success(report.to_string());
                match serde_json::to_value(&report) {
                    Ok(data) => output.with_display(data),
                    Err(_) => output,
                }
            }
            Err(e) => e.into(),
        }
    }
}

impl From<CalcError> for ToolOutput {
    fn from(e: CalcError) -> Self {
        Self::error(e.kind, e.message)
    }
}

/// Deserialize tool input, turning schema violations into a `Parse` failure
pub(crate) fn parse_input<T: DeserializeOwned>(input: Value) -> Result<T, ToolOutput> {
    serde_json::from_value(input)
        .map_err(|e| ToolOutput::error(CalcErrorKind::Parse, format!("Invalid input: {e}")))
}

/// Lower-case a string discriminator field in place so tags match case-insensitively
pub(crate) fn normalize_tag(mut input: Value, field: &str) -> Value {
    if let Some(tag) = input.get_mut(field) {
        if let Some(s) = tag.as_str() {
            *tag = Value::String(s.trim().to_lowercase());
        }
    }
    input
}

// ============================================================================
// Tool trait and registry
// ============================================================================

/// Tool definition handed to a classifier or listed over the API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub domains: Vec<Domain>,
}

/// A calculator that can be invoked by name
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Specialists that carry this tool
    fn domains(&self) -> &'static [Domain];

    /// Execute the tool
    async fn run(&self, input: Value) -> ToolOutput;
}

/// Collection of tools available to the tutor
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ToolRegistry {
    /// Every calculator, with the built-in math engine
    pub fn standard() -> Self {
        Self::with_math(MathEvaluator::default())
    }

    /// Every calculator, with the given math backend
    pub fn with_math(math: MathEvaluator) -> Self {
        let tools: Vec<Arc<dyn Tool>> = vec![
            // Math
            Arc::new(CalculateExpressionTool::new(math.clone())),
            Arc::new(SolveEquationTool::new(math.clone())),
            Arc::new(CreateGraphTool::new(math)),
            // Physics
            Arc::new(PhysicsConstantTool),
            Arc::new(ConvertUnitsTool),
            Arc::new(CalculatePhysicsTool),
            // Biology
            Arc::new(BiologyInfoTool),
            Arc::new(ClassifyOrganismTool),
            Arc::new(GeneticsTool),
            Arc::new(DnaComplementTool),
            // Chemistry
            Arc::new(ElementInfoTool),
            Arc::new(MolarMassTool),
            Arc::new(BalanceEquationTool),
            Arc::new(MolarityTool),
            Arc::new(ChemistryConstantTool),
            Arc::new(PhTool),
        ];
        Self { tools }
    }

    /// Registry over an explicit tool list
    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    fn definition(tool: &dyn Tool) -> ToolDefinition {
        ToolDefinition {
            name: tool.name().to_string(),
            description: tool.description(),
            input_schema: tool.input_schema(),
            domains: tool.domains().to_vec(),
        }
    }

    /// Get all tool definitions
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| Self::definition(t.as_ref())).collect()
    }

    /// Tools carried by one specialist
    pub fn for_domain(&self, domain: Domain) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .filter(|t| t.domains().contains(&domain))
            .map(|t| Self::definition(t.as_ref()))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, input: Value) -> Option<ToolOutput> {
        for tool in &self.tools {
            if tool.name() == name {
                tracing::debug!(tool = name, "Executing tool");
                let output = tool.run(input).await;
                if !output.success {
                    tracing::info!(tool = name, error_kind = ?output.error_kind, "Tool reported failure");
                }
                return Some(output);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_all_calculators_registered() {
        let registry = ToolRegistry::standard();
        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        for expected in [
            "calculate_expression",
            "solve_equation",
            "create_graph",
            "get_physics_constant",
            "convert_units",
            "calculate_physics",
            "get_biology_info",
            "classify_organism",
            "calculate_genetics",
            "get_dna_complement",
            "get_element_info",
            "calculate_molar_mass",
            "balance_equation",
            "calculate_molarity",
            "get_chemistry_constant",
            "calculate_ph",
        ] {
            assert!(names.iter().any(|n| n == expected), "Missing {expected}");
        }
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len(), "duplicate tool names");
    }

    #[test]
    fn test_schemas_are_objects() {
        for def in ToolRegistry::standard().definitions() {
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
            assert!(!def.domains.is_empty(), "{}", def.name);
        }
    }

    #[test]
    fn test_for_domain() {
        let registry = ToolRegistry::standard();
        let physics: Vec<_> = registry
            .for_domain(Domain::Physics)
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert!(physics.contains(&"convert_units".to_string()));
        assert!(physics.contains(&"calculate_expression".to_string()));
        assert!(!physics.contains(&"calculate_ph".to_string()));
        assert!(registry.for_domain(Domain::WebSearch).is_empty());
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let registry = ToolRegistry::standard();
        assert!(registry.execute("tavily_search", json!({})).await.is_none());
    }

    #[tokio::test]
    async fn test_failure_carries_error_kind() {
        let registry = ToolRegistry::standard();
        let output = registry
            .execute("get_element_info", json!({"element": "Zz"}))
            .await
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.error_kind, Some(CalcErrorKind::LookupMiss));

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["error_kind"], "lookup_miss");
    }

    #[tokio::test]
    async fn test_bad_input_is_parse_error() {
        let registry = ToolRegistry::standard();
        let output = registry.execute("convert_units", json!({"value": "ten"})).await.unwrap();
        assert_eq!(output.error_kind, Some(CalcErrorKind::Parse));
        assert!(output.output.starts_with("Invalid input"));
    }

    #[test]
    fn test_domain_parsing() {
        assert_eq!("Physics".parse::<Domain>().unwrap(), Domain::Physics);
        assert_eq!("web_search".parse::<Domain>().unwrap(), Domain::WebSearch);
        assert!("history".parse::<Domain>().is_err());
        assert_eq!(serde_json::to_string(&Domain::WebSearch).unwrap(), "\"web_search\"");
    }

    #[test]
    fn test_success_output_omits_error_kind() {
        let json = serde_json::to_value(ToolOutput::success("ok")).unwrap();
        assert!(json.get("error_kind").is_none());
        assert!(json.get("display_data").is_none());
    }
}
