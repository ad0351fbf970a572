//! End-to-end pipeline scenarios over the mock providers
//!
//! Run with: `cargo test --test pipeline_scenarios`

mod common;

use clausewise::{
    AnalysisCache, DetectedLanguage, Domain, LlmError, MockLlmClient, MockTermProvider, NodeKind,
    OutputLanguage, PipelineError, Preprocessor, SectionStatus, TermLookupError, TermStatus,
};
use clausewise::terms::ProviderDefinition;
use common::{
    fenced, pipeline_with, replying, EMPLOYMENT_AGREEMENT, KOREAN_LEASE, KOREAN_NDA, NDA_REPLY,
};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Korean NDA
// ============================================================================

#[tokio::test]
async fn korean_nda_end_to_end() {
    let llm = Arc::new(MockLlmClient::new().with_default_reply(NDA_REPLY));
    let terms = Arc::new(MockTermProvider::new().with_definition(
        "비밀유지",
        ProviderDefinition::new(
            Some("알게 된 비밀을 누설하지 아니하는 것".into()),
            Some("confidentiality".into()),
        ),
    ));
    let pipeline = pipeline_with(llm.clone(), terms, AnalysisCache::in_memory());

    let result = pipeline.analyze(KOREAN_NDA, OutputLanguage::Ko).await.unwrap();

    assert_eq!(result.detected_language, DetectedLanguage::Ko);
    assert_eq!(result.domain, Domain::Nda);
    assert_eq!(result.clauses.len(), 2);
    assert_eq!(result.clauses[1].heading.as_deref(), Some("비밀유지"));
    assert_eq!(result.clauses[1].risk_tags, vec!["confidentiality"]);

    let term = &result.term_glossary["비밀유지"];
    assert_eq!(term.status, TermStatus::Resolved);
    assert_eq!(term.en.as_deref(), Some("confidentiality"));

    let graph = &result.causal_graph;
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].from, "clause_1");
    assert_eq!(graph.edges[0].to, "clause_2");
    assert_eq!(graph.edges[0].relation, "conditions");
    assert!(graph.nodes.iter().all(|n| n.kind == NodeKind::Clause));

    assert_eq!(result.status.llm, SectionStatus::Resolved);
    assert_eq!(result.status.graph, SectionStatus::Resolved);
    assert_eq!(result.risk_score, Some(35));
    assert!(result.overall_summary.is_some());
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn result_serializes_absent_values_as_null() {
    let (pipeline, _) = replying(r#"{"overall_summary": "요약만 있음"}"#);
    let result = pipeline.analyze(KOREAN_NDA, OutputLanguage::Ko).await.unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["language"], "ko");
    assert_eq!(json["domain"], "nda");
    assert!(json["risk_score"].is_null());
    assert!(json["clauses"][0]["summary"].is_null());
    assert!(json["causal_graph"]["edges"].as_array().unwrap().is_empty());
    assert_eq!(json["status"]["llm"], "fallback");
}

// ============================================================================
// Idempotence
// ============================================================================

#[tokio::test]
async fn repeated_analysis_is_a_cache_hit() {
    let (pipeline, llm) = replying(NDA_REPLY);

    let first = pipeline.analyze(KOREAN_NDA, OutputLanguage::Ko).await.unwrap();
    let second = pipeline.analyze(KOREAN_NDA, OutputLanguage::Ko).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn output_language_is_part_of_the_key() {
    let (pipeline, llm) = replying(NDA_REPLY);

    let ko = pipeline.analyze(KOREAN_NDA, OutputLanguage::Ko).await.unwrap();
    let en = pipeline.analyze(KOREAN_NDA, OutputLanguage::En).await.unwrap();

    assert_eq!(ko.language, OutputLanguage::Ko);
    assert_eq!(en.language, OutputLanguage::En);
    assert_eq!(llm.calls(), 2);
    assert!(llm.prompts()[1].contains("Write all JSON values in English"));
}

#[tokio::test]
async fn concurrent_identical_requests_share_one_llm_call() {
    let llm = Arc::new(
        MockLlmClient::new()
            .with_default_reply(NDA_REPLY)
            .with_delay(Duration::from_millis(100)),
    );
    let pipeline = Arc::new(pipeline_with(
        llm.clone(),
        Arc::new(MockTermProvider::new()),
        AnalysisCache::in_memory(),
    ));

    let mut handles = Vec::new();
    for _ in 0..6 {
        let pipeline = Arc::clone(&pipeline);
        handles.push(tokio::spawn(async move {
            pipeline.analyze(KOREAN_NDA, OutputLanguage::Ko).await
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(llm.calls(), 1);
}

// ============================================================================
// Segmentation and language
// ============================================================================

#[tokio::test]
async fn english_agreement_is_segmented_by_article() {
    let (pipeline, llm) = replying(r#"{"overall_summary": "Employment terms"}"#);
    let result = pipeline
        .analyze(EMPLOYMENT_AGREEMENT, OutputLanguage::En)
        .await
        .unwrap();

    assert_eq!(result.detected_language, DetectedLanguage::En);
    assert_eq!(result.domain, Domain::Labor);
    assert_eq!(result.clauses.len(), 3);
    assert_eq!(result.clauses[2].index, 3);
    assert!(llm.prompts()[0].contains("clause_3"));
}

#[tokio::test]
async fn unbroken_text_is_one_clause() {
    let (pipeline, _) = replying(r#"{"overall_summary": "한 문단"}"#);
    let result = pipeline
        .analyze("갑은 을에게 물품을 공급하고 을은 대금을 지급한다", OutputLanguage::Ko)
        .await
        .unwrap();
    assert_eq!(result.clauses.len(), 1);
    assert_eq!(result.clauses[0].index, 1);
}

// ============================================================================
// Term completeness
// ============================================================================

#[tokio::test]
async fn failing_lookups_stay_in_the_glossary() {
    let candidates: Vec<String> = Preprocessor::default()
        .preprocess(KOREAN_LEASE)
        .unwrap()
        .term_candidates()
        .iter()
        .map(|c| c.surface.clone())
        .collect();
    assert_eq!(candidates, vec!["보증금", "위약금", "손해배상", "손해배상책임"]);

    let mut provider = MockTermProvider::new();
    let mut failing = Vec::new();
    for (i, term) in candidates.iter().enumerate() {
        if i % 2 == 0 {
            provider = provider.with_failure(term.clone(), TermLookupError::Timeout);
            failing.push(term.clone());
        } else {
            provider = provider.with_definition(
                term.clone(),
                ProviderDefinition::new(Some(format!("{}의 정의", term)), None),
            );
        }
    }

    let llm = Arc::new(MockLlmClient::new().with_default_reply(NDA_REPLY));
    let pipeline = pipeline_with(llm, Arc::new(provider), AnalysisCache::in_memory());
    let result = pipeline.analyze(KOREAN_LEASE, OutputLanguage::Ko).await.unwrap();

    assert_eq!(result.term_glossary.len(), 4);
    assert_eq!(failing.len(), 2);
    for term in &candidates {
        let entry = &result.term_glossary[term];
        if failing.contains(term) {
            assert_eq!(entry.status, TermStatus::Error);
            assert!(entry.ko.is_none() && entry.en.is_none());
        } else {
            assert_eq!(entry.status, TermStatus::Resolved);
            assert_eq!(entry.ko, Some(format!("{}의 정의", term)));
        }
    }
    assert_eq!(result.status.terms, SectionStatus::Fallback);
    assert!(result.overall_summary.is_some());
}

// ============================================================================
// Malformed model output
// ============================================================================

#[tokio::test]
async fn wrapped_json_is_repaired() {
    let (pipeline, llm) = replying(&fenced(NDA_REPLY));
    let result = pipeline.analyze(KOREAN_NDA, OutputLanguage::Ko).await.unwrap();

    assert_eq!(result.status.llm, SectionStatus::Resolved);
    assert_eq!(result.causal_graph.edges.len(), 1);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn unrepairable_output_degrades_without_error() {
    let (pipeline, llm) = replying("죄송합니다. 이 문서는 분석할 수 없습니다.");
    let result = pipeline.analyze(KOREAN_NDA, OutputLanguage::Ko).await.unwrap();

    assert!(result.overall_summary.is_none());
    assert_eq!(result.status.llm, SectionStatus::LlmFailed);
    assert_eq!(result.clauses.len(), 2);
    assert!(result.clauses.iter().all(|c| c.summary.is_none()));
    assert!(!result.warnings.is_empty());
    // one requery after the first unusable answer
    assert_eq!(llm.calls(), 2);
}

#[tokio::test]
async fn failed_analysis_is_not_cached() {
    let llm = Arc::new(
        MockLlmClient::new()
            .with_reply("not json")
            .with_reply("still not json")
            .with_default_reply(NDA_REPLY),
    );
    let pipeline = pipeline_with(
        llm.clone(),
        Arc::new(MockTermProvider::new()),
        AnalysisCache::in_memory(),
    );

    let degraded = pipeline.analyze(KOREAN_NDA, OutputLanguage::Ko).await.unwrap();
    assert_eq!(degraded.status.llm, SectionStatus::LlmFailed);

    let recovered = pipeline.analyze(KOREAN_NDA, OutputLanguage::Ko).await.unwrap();
    assert_eq!(recovered.status.llm, SectionStatus::Resolved);
    assert_eq!(llm.calls(), 3);
}

// ============================================================================
// Provider failures
// ============================================================================

#[tokio::test]
async fn transient_errors_are_retried() {
    let llm = Arc::new(
        MockLlmClient::new()
            .with_failure(LlmError::RateLimited)
            .with_failure(LlmError::Server {
                status: 503,
                body: "busy".into(),
            })
            .with_default_reply(NDA_REPLY),
    );
    let pipeline = pipeline_with(
        llm.clone(),
        Arc::new(MockTermProvider::new()),
        AnalysisCache::in_memory(),
    );

    let result = pipeline.analyze(KOREAN_NDA, OutputLanguage::Ko).await.unwrap();
    assert_eq!(result.status.llm, SectionStatus::Resolved);
    assert_eq!(llm.calls(), 3);
}

#[tokio::test]
async fn permanent_error_aborts_the_request() {
    let llm = Arc::new(
        MockLlmClient::new().with_default_failure(LlmError::Unauthorized("invalid key".into())),
    );
    let pipeline = pipeline_with(
        llm.clone(),
        Arc::new(MockTermProvider::new()),
        AnalysisCache::in_memory(),
    );

    let err = pipeline.analyze(KOREAN_NDA, OutputLanguage::Ko).await.unwrap_err();
    assert!(matches!(err, PipelineError::LlmProvider(LlmError::Unauthorized(_))));
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn empty_document_is_rejected() {
    let (pipeline, llm) = replying(NDA_REPLY);
    let err = pipeline.analyze("   \n\n  ", OutputLanguage::Ko).await.unwrap_err();
    assert_eq!(err, PipelineError::EmptyDocument);
    assert_eq!(llm.calls(), 0);
}
