//! Analysis result returned to callers and stored in the cache

use crate::causal::CausalGraph;
use crate::document::{DetectedLanguage, Domain, OutputLanguage, Party};
use crate::terms::{Glossary, TermStatus};
use serde::{Deserialize, Serialize};

/// Overall or per-clause risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Map a Korean, English or Vietnamese label. Unknown labels are `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        Some(match label.as_str() {
            "낮음" | "low" | "thấp" => Self::Low,
            "중간" | "보통" | "medium" | "moderate" | "trung bình" => Self::Medium,
            "높음" | "high" | "cao" => Self::High,
            "치명적" | "매우 높음" | "critical" | "severe" | "nghiêm trọng" => Self::Critical,
            _ => return None,
        })
    }

    /// Band for a 0..=100 score
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=24 => Self::Low,
            25..=49 => Self::Medium,
            50..=74 => Self::High,
            _ => Self::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// How a result section was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Resolved,
    /// Partially degraded; some entries are missing
    Fallback,
    Error,
    LlmFailed,
}

impl SectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::Fallback => "fallback",
            Self::Error => "error",
            Self::LlmFailed => "llm_failed",
        }
    }

    /// Status of the glossary section from its entries
    pub fn of_glossary(glossary: &Glossary) -> Self {
        let errors = glossary
            .values()
            .filter(|d| d.status == TermStatus::Error)
            .count();
        match errors {
            0 => Self::Resolved,
            n if n == glossary.len() => Self::Error,
            _ => Self::Fallback,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultStatus {
    pub terms: SectionStatus,
    pub llm: SectionStatus,
    pub graph: SectionStatus,
}

/// Per-clause analysis; text fields are `null` when the analysis failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseAnalysis {
    pub index: usize,
    pub heading: Option<String>,
    pub summary: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub risk_notes: Option<String>,
    pub risk_tags: Vec<String>,
}

impl ClauseAnalysis {
    /// Entry with no analysis, for a clause the model did not cover
    pub fn empty(index: usize, heading: Option<String>) -> Self {
        Self {
            index,
            heading,
            summary: None,
            risk_level: None,
            risk_notes: None,
            risk_tags: Vec::new(),
        }
    }
}

/// Structured analysis of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Output language the analysis was written in
    pub language: OutputLanguage,
    pub detected_language: DetectedLanguage,
    pub domain: Domain,
    pub parties: Vec<Party>,
    pub clauses: Vec<ClauseAnalysis>,
    pub overall_summary: Option<String>,
    pub one_line_summary: Option<String>,
    /// 0..=100
    pub risk_score: Option<u8>,
    pub risk_level: Option<RiskLevel>,
    pub key_points: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub term_glossary: Glossary,
    pub causal_graph: CausalGraph,
    pub status: ResultStatus,
    pub warnings: Vec<String>,
}

impl DocumentResult {
    /// True when the LLM section is usable enough to be cached
    pub fn is_cacheable(&self) -> bool {
        self.status.llm != SectionStatus::LlmFailed
    }

    /// Short title for listings: the one-line summary, else the first heading
    pub fn title(&self) -> Option<String> {
        self.one_line_summary
            .clone()
            .or_else(|| self.clauses.iter().find_map(|c| c.heading.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::TermDefinition;

    #[test]
    fn risk_labels_in_three_languages() {
        assert_eq!(RiskLevel::from_label("높음"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_label(" Moderate "), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::from_label("nghiêm trọng"), Some(RiskLevel::Critical));
        assert_eq!(RiskLevel::from_label("Thấp"), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::from_label("intermediate"), None);
    }

    #[test]
    fn score_bands() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::Critical);
    }

    #[test]
    fn glossary_status() {
        let mut glossary = Glossary::new();
        assert_eq!(SectionStatus::of_glossary(&glossary), SectionStatus::Resolved);

        glossary.insert("a".into(), TermDefinition::not_found("a"));
        glossary.insert("b".into(), TermDefinition::error("b"));
        assert_eq!(SectionStatus::of_glossary(&glossary), SectionStatus::Fallback);

        glossary.remove("a");
        assert_eq!(SectionStatus::of_glossary(&glossary), SectionStatus::Error);
    }

    #[test]
    fn absent_values_serialize_as_null() {
        let clause = ClauseAnalysis::empty(1, None);
        let json = serde_json::to_value(&clause).unwrap();
        assert!(json["summary"].is_null());
        assert!(json["heading"].is_null());
        assert_eq!(json["risk_tags"], serde_json::json!([]));
        assert_eq!(
            serde_json::to_value(SectionStatus::LlmFailed).unwrap(),
            serde_json::json!("llm_failed")
        );
    }
}
