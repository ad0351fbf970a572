//! Expected shape of the model's JSON answer
//!
//! Deserialization is lenient where models are sloppy (scores as strings,
//! notes as lists); missing fields default. [`LlmAnalysis::validate`] holds
//! the few requirements that make an answer usable.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LlmAnalysis {
    /// 3-5 sentences describing the whole document
    pub overall_summary: Option<String>,
    /// One sentence with the essence of the document
    pub one_line_summary: Option<String>,
    /// Overall risk from 0 (none) to 100 (severe)
    #[serde(deserialize_with = "lenient_score")]
    #[schemars(with = "Option<u8>")]
    pub risk_score: Option<u8>,
    /// One of: low, medium, high, critical
    pub risk_level: Option<String>,
    pub key_points: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub clauses: Vec<ClauseReply>,
    pub risks: Vec<RiskReply>,
    pub causal_relations: Vec<RelationReply>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClauseReply {
    /// Clause id exactly as given, e.g. "clause_2"
    pub clause_id: String,
    pub summary: Option<String>,
    /// One of: low, medium, high, critical
    pub risk_level: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    #[schemars(with = "Option<String>")]
    pub risk_notes: Option<String>,
    pub risk_tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RiskReply {
    /// Short id such as "risk_1"
    pub risk_id: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RelationReply {
    /// Cause: a clause id or risk id
    pub from: String,
    /// Effect: a clause id or risk id
    pub to: String,
    /// e.g. conditions, triggers, depends_on, conflicts_with, clarifies, overrides
    pub relation: String,
    pub description: Option<String>,
}

impl LlmAnalysis {
    /// Parse and validate a JSON answer
    pub fn parse(text: &str) -> Result<Self, String> {
        let analysis: Self = serde_json::from_str(text).map_err(|e| e.to_string())?;
        analysis.validate()?;
        Ok(analysis)
    }

    pub fn validate(&self) -> Result<(), String> {
        let has_summary = self
            .overall_summary
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if !has_summary {
            return Err("overall_summary is missing".to_string());
        }
        Ok(())
    }
}

/// Accepts 72, 72.5, "72", "72점" or null; clamps into 0..=100.
fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let digits: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse::<f64>().ok()
        }
        _ => None,
    };
    Ok(number
        .filter(|n| n.is_finite())
        .map(|n| n.round().clamp(0.0, 100.0) as u8))
}

/// Accepts a string, a list of strings (joined) or null
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let text = match value {
        Some(Value::String(s)) => s,
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("; "),
        _ => String::new(),
    };
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sloppy_fields_are_accepted() {
        let text = r#"{
            "overall_summary": "요약",
            "risk_score": "72점",
            "clauses": [{"clause_id": "clause_1", "risk_notes": ["a", "b"]}]
        }"#;
        let analysis = LlmAnalysis::parse(text).unwrap();
        assert_eq!(analysis.risk_score, Some(72));
        assert_eq!(analysis.clauses[0].risk_notes.as_deref(), Some("a; b"));
        assert!(analysis.key_points.is_empty());
    }

    #[test]
    fn scores_are_clamped() {
        let high = LlmAnalysis::parse(r#"{"overall_summary": "x", "risk_score": 140.2}"#).unwrap();
        assert_eq!(high.risk_score, Some(100));
        let none = LlmAnalysis::parse(r#"{"overall_summary": "x", "risk_score": null}"#).unwrap();
        assert_eq!(none.risk_score, None);
    }

    #[test]
    fn summary_is_required() {
        assert!(LlmAnalysis::parse(r#"{"overall_summary": "  "}"#).is_err());
        assert!(LlmAnalysis::parse("{}").is_err());
        assert!(LlmAnalysis::parse("[1, 2]").is_err());
    }
}
