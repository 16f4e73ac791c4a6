//! Biology tools: reference topics, classification, genetics

use super::{normalize_tag, parse_input, Domain, Tool, ToolOutput};
use crate::toolkit::genetics;
use crate::toolkit::tables::BIOLOGY;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct BiologyInfoInput {
    topic: String,
    #[serde(default)]
    subtopic: Option<String>,
}

pub struct BiologyInfoTool;

#[async_trait]
impl Tool for BiologyInfoTool {
    fn name(&self) -> &'static str {
        "get_biology_info"
    }

    fn description(&self) -> String {
        let topics: Vec<_> = BIOLOGY.topics.iter().map(|(name, _)| *name).collect();
        format!(
            "Look up reference material on a biology topic ({}), optionally narrowed to one subtopic.",
            topics.join(", ")
        )
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["topic"],
            "properties": {
                "topic": {"type": "string", "description": "e.g. 'organelles'"},
                "subtopic": {"type": "string", "description": "e.g. 'mitochondria'"}
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Biology]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: BiologyInfoInput = match parse_input(input) {
            Ok(i) => i,
            Err(e) => return e,
        };
        match BIOLOGY.lookup(&input.topic, input.subtopic.as_deref()) {
            Ok(text) => ToolOutput::success(text),
            Err(e) => e.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClassifyInput {
    characteristics: String,
}

pub struct ClassifyOrganismTool;

#[async_trait]
impl Tool for ClassifyOrganismTool {
    fn name(&self) -> &'static str {
        "classify_organism"
    }

    fn description(&self) -> String {
        "Classify an organism's kingdom, cell type and nutrition from a description of its \
         characteristics, e.g. 'multicellular, photosynthesis, cell wall'."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["characteristics"],
            "properties": {
                "characteristics": {"type": "string"}
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Biology]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: ClassifyInput = match parse_input(input) {
            Ok(i) => i,
            Err(e) => return e,
        };
        ToolOutput::from_report(genetics::classify_organism(&input.characteristics))
    }
}

/// A genetics calculation, tagged by `calculation_type`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "calculation_type", rename_all = "snake_case")]
pub enum GeneticsInput {
    #[serde(alias = "allele_frequency")]
    HardyWeinberg {
        #[serde(default, alias = "dominant_frequency")]
        p: Option<f64>,
        #[serde(default, alias = "recessive_frequency")]
        q: Option<f64>,
    },
    #[serde(alias = "cross")]
    PunnettSquare {
        #[serde(default, alias = "p1")]
        parent1: String,
        #[serde(default, alias = "p2")]
        parent2: String,
    },
}

pub struct GeneticsTool;

#[async_trait]
impl Tool for GeneticsTool {
    fn name(&self) -> &'static str {
        "calculate_genetics"
    }

    fn description(&self) -> String {
        "Genetics calculations. calculation_type 'hardy_weinberg' takes allele frequency p \
         and/or q; 'punnett_square' takes two single-gene parent genotypes such as 'Aa' and 'aa'."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["calculation_type"],
            "properties": {
                "calculation_type": {"type": "string", "enum": ["hardy_weinberg", "punnett_square"]},
                "p": {"type": "number", "minimum": 0, "maximum": 1},
                "q": {"type": "number", "minimum": 0, "maximum": 1},
                "parent1": {"type": "string"},
                "parent2": {"type": "string"}
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Biology]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: GeneticsInput = match parse_input(normalize_tag(input, "calculation_type")) {
            Ok(i) => i,
            Err(e) => return e,
        };
        match input {
            GeneticsInput::HardyWeinberg { p, q } => {
                ToolOutput::from_report(genetics::hardy_weinberg(p, q))
            }
            GeneticsInput::PunnettSquare { parent1, parent2 } => {
                ToolOutput::from_report(genetics::punnett_square(&parent1, &parent2))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct DnaInput {
    #[serde(alias = "dna_sequence")]
    sequence: String,
}

pub struct DnaComplementTool;

#[async_trait]
impl Tool for DnaComplementTool {
    fn name(&self) -> &'static str {
        "get_dna_complement"
    }

    fn description(&self) -> String {
        "Return the complementary strand of a DNA sequence (A↔T, G↔C).".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["sequence"],
            "properties": {
                "sequence": {"type": "string", "description": "Bases A, T, G, C"}
            }
        })
    }

    fn domains(&self) -> &'static [Domain] {
        &[Domain::Biology]
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: DnaInput = match parse_input(input) {
            Ok(i) => i,
            Err(e) => return e,
        };
        ToolOutput::from_report(genetics::dna_complement(&input.sequence))
    }
}
