//! Pipeline coordination
//!
//! `preprocess -> cache lookup -> hit: return`
//! `miss: term resolution -> LLM analysis -> causal graph -> cache write -> return`

mod error;

pub use error::PipelineError;

use crate::cache::{AnalysisCache, CacheKey};
use crate::causal::CausalGraphBuilder;
use crate::config::PipelineConfig;
use crate::document::{Document, OutputLanguage};
use crate::llm::{AnalysisDraft, LlmClient, LlmOrchestrator};
use crate::nlp::Preprocessor;
use crate::result::{DocumentResult, ResultStatus, SectionStatus};
use crate::terms::{Glossary, TermProvider, TermResolver};
use std::sync::Arc;
use tracing::{debug, info};

/// Document analysis pipeline. Cheap to share behind an `Arc`.
pub struct Pipeline {
    preprocessor: Preprocessor,
    resolver: TermResolver,
    orchestrator: LlmOrchestrator,
    cache: AnalysisCache,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Cache key for a preprocessed document
    pub fn cache_key(&self, document: &Document, language: OutputLanguage) -> CacheKey {
        CacheKey::new(
            document.normalized_text(),
            language,
            self.orchestrator.model_id(),
            &self.config.llm.prompt_version,
        )
    }

    /// Analyze `raw_text`, writing the analysis in `language`.
    ///
    /// Fails only for text with nothing to analyze or a permanent LLM
    /// provider error. Every other failure is reported through
    /// `status` and `warnings` of the returned result.
    pub async fn analyze(
        &self,
        raw_text: &str,
        language: OutputLanguage,
    ) -> Result<DocumentResult, PipelineError> {
        let document = self.preprocessor.preprocess(raw_text)?;
        let key = self.cache_key(&document, language);

        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let glossary = self.resolver.resolve(document.term_candidates()).await;

        let orchestrator = self.orchestrator.clone();
        self.cache
            .get_or_compute(&key, move || async move {
                let draft = orchestrator.analyze(&document, &glossary, language).await?;
                Ok(assemble(&document, glossary, language, draft))
            })
            .await
    }
}

/// Combine the document, glossary and LLM draft into the final result
fn assemble(
    document: &Document,
    glossary: Glossary,
    language: OutputLanguage,
    draft: AnalysisDraft,
) -> DocumentResult {
    let builder = document
        .clauses()
        .iter()
        .fold(CausalGraphBuilder::new(), |b, c| {
            b.clause(c.node_id(), c.heading.clone())
        });
    let builder = draft
        .risks
        .into_iter()
        .fold(builder, |b, (id, description)| b.risk(id, description));
    let built = builder.build(draft.relations);

    let graph_status = if draft.status == SectionStatus::LlmFailed || !built.warnings.is_empty() {
        SectionStatus::Fallback
    } else {
        SectionStatus::Resolved
    };
    let status = ResultStatus {
        terms: SectionStatus::of_glossary(&glossary),
        llm: draft.status,
        graph: graph_status,
    };

    let mut warnings = draft.warnings;
    warnings.extend(built.warnings.iter().map(ToString::to_string));

    info!(
        clauses = draft.clauses.len(),
        edges = built.graph.edges.len(),
        terms = status.terms.as_str(),
        llm = status.llm.as_str(),
        graph = status.graph.as_str(),
        "analysis assembled"
    );

    DocumentResult {
        language,
        detected_language: document.language(),
        domain: document.domain(),
        parties: document.parties().to_vec(),
        clauses: draft.clauses,
        overall_summary: draft.overall_summary,
        one_line_summary: draft.one_line_summary,
        risk_score: draft.risk_score,
        risk_level: draft.risk_level,
        key_points: draft.key_points,
        recommended_actions: draft.recommended_actions,
        term_glossary: glossary,
        causal_graph: built.graph,
        status,
        warnings,
    }
}

/// Wires a [`Pipeline`] from its collaborators
#[derive(Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    term_provider: Option<Arc<dyn TermProvider>>,
    llm_client: Option<Arc<dyn LlmClient>>,
    cache: Option<AnalysisCache>,
}

impl PipelineBuilder {
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn term_provider(mut self, provider: Arc<dyn TermProvider>) -> Self {
        self.term_provider = Some(provider);
        self
    }

    pub fn llm_client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.llm_client = Some(client);
        self
    }

    /// Share an existing cache. Without one, an in-memory cache is created
    /// (or a disabled one when `cache.enabled` is false).
    pub fn cache(mut self, cache: AnalysisCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let provider = self
            .term_provider
            .ok_or(PipelineError::MissingComponent("term provider"))?;
        let client = self
            .llm_client
            .ok_or(PipelineError::MissingComponent("LLM client"))?;
        let cache = match (self.config.cache.enabled, self.cache) {
            (false, _) => AnalysisCache::disabled(),
            (true, Some(cache)) => cache,
            (true, None) => AnalysisCache::in_memory(),
        };
        debug!(
            model = client.model_id(),
            cache = cache.is_enabled(),
            "pipeline built"
        );

        Ok(Pipeline {
            preprocessor: Preprocessor::new(self.config.nlp.clone()),
            resolver: TermResolver::from_config(provider, &self.config.terms),
            orchestrator: LlmOrchestrator::new(client, self.config.llm.clone()),
            cache,
            config: self.config,
        })
    }
}
