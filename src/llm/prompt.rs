//! Analysis prompt construction

use super::schema::LlmAnalysis;
use crate::document::{Clause, Document, OutputLanguage};
use crate::terms::Glossary;
use serde_json::json;
use std::sync::OnceLock;

/// Most glossary entries passed to the model
const MAX_PROMPT_TERMS: usize = 30;

fn language_instruction(language: OutputLanguage) -> &'static str {
    match language {
        OutputLanguage::Ko => {
            "JSON value는 반드시 한국어로 작성하십시오. JSON key는 절대 번역하거나 변경하지 마십시오."
        }
        OutputLanguage::En => {
            "Write all JSON values in English. Do NOT translate or modify JSON keys."
        }
        OutputLanguage::Vi => {
            "Viết toàn bộ giá trị JSON bằng tiếng Việt. KHÔNG dịch hoặc thay đổi các key JSON."
        }
    }
}

/// JSON Schema of [`LlmAnalysis`], rendered once
pub fn response_schema() -> &'static str {
    static SCHEMA: OnceLock<String> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let schema = schemars::schema_for!(LlmAnalysis);
        serde_json::to_string_pretty(&schema).unwrap_or_default()
    })
}

/// Everything one batch prompt is built from
pub struct PromptContext<'a> {
    pub document: &'a Document,
    pub glossary: &'a Glossary,
    pub language: OutputLanguage,
    /// Clauses analyzed by this batch
    pub batch: &'a [Clause],
    /// 0-based
    pub batch_index: usize,
    pub batch_count: usize,
    pub max_clause_chars: usize,
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

pub fn build_prompt(ctx: &PromptContext<'_>) -> String {
    let doc = ctx.document;

    // every clause id, so relations may point outside this batch
    let outline: Vec<_> = doc
        .clauses()
        .iter()
        .map(|c| json!({ "clause_id": c.node_id(), "heading": c.heading }))
        .collect();

    let clauses: Vec<_> = ctx
        .batch
        .iter()
        .map(|c| {
            json!({
                "clause_id": c.node_id(),
                "heading": c.heading,
                "parties": c.parties,
                "text": truncate_chars(&c.text, ctx.max_clause_chars),
            })
        })
        .collect();

    let terms: Vec<_> = ctx
        .glossary
        .values()
        .filter(|d| d.is_resolved())
        .take(MAX_PROMPT_TERMS)
        .map(|d| json!({ "term": d.term, "ko": d.ko, "en": d.en }))
        .collect();

    let parties: Vec<_> = doc
        .parties()
        .iter()
        .map(|p| json!({ "role": p.role.as_str(), "label": p.label }))
        .collect();

    let pre_analysis = json!({
        "detected_language": doc.language().as_str(),
        "domain": doc.domain().as_str(),
        "parties": parties,
        "all_clauses": outline,
        "clauses_to_analyze": clauses,
        "terms": terms,
    });
    let pre_analysis = serde_json::to_string_pretty(&pre_analysis).unwrap_or_default();

    let batch_note = if ctx.batch_count > 1 {
        format!(
            "\nThis is part {} of {}. Analyze only the clauses in clauses_to_analyze; \
             causal_relations may reference any id in all_clauses.\n",
            ctx.batch_index + 1,
            ctx.batch_count
        )
    } else {
        String::new()
    };

    format!(
        r#"You are a senior lawyer reviewing a contract or legal document.
Using the pre-analysis data below, answer with a single JSON object that
matches the JSON Schema. Output JSON only: no Markdown, no code fences, no
comments, no text before or after the object.

{instruction}

Rules:
- Return one entry in "clauses" per clause in clauses_to_analyze, using the given clause_id.
- risk_level values are always one of: low, medium, high, critical.
- risk_score is an integer from 0 to 100.
- Declare risks in "risks" with ids like "risk_1" before using them in causal_relations.
- causal_relations use only ids from all_clauses or risks; relation is one of
  conditions, triggers, depends_on, conflicts_with, clarifies, overrides, mitigates.
- Keep every text field under 200 characters and every list to at most 3 items.
- Use null or [] for anything you cannot determine.
{batch_note}
[Pre-analysis]
{pre_analysis}

[JSON Schema]
{schema}
"#,
        instruction = language_instruction(ctx.language),
        batch_note = batch_note,
        pre_analysis = pre_analysis,
        schema = response_schema(),
    )
}
