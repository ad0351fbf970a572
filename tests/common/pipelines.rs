//! Pipeline builders over the mock providers

use clausewise::{
    AnalysisCache, LlmClient, MockLlmClient, MockTermProvider, Pipeline, PipelineConfig,
    TermProvider,
};
use std::sync::Arc;

/// Config with millisecond backoff so retry paths stay fast
pub fn fast_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.llm.backoff_base_ms = 1;
    config.llm.timeout_secs = 5;
    config.terms.timeout_ms = 500;
    config
}

pub fn pipeline_with(
    llm: Arc<MockLlmClient>,
    terms: Arc<MockTermProvider>,
    cache: AnalysisCache,
) -> Pipeline {
    let llm: Arc<dyn LlmClient> = llm;
    let terms: Arc<dyn TermProvider> = terms;
    Pipeline::builder()
        .config(fast_config())
        .llm_client(llm)
        .term_provider(terms)
        .cache(cache)
        .build()
        .expect("mock pipeline")
}

/// Pipeline answering every prompt with `reply`
pub fn replying(reply: &str) -> (Pipeline, Arc<MockLlmClient>) {
    let llm = Arc::new(MockLlmClient::new().with_default_reply(reply));
    let pipeline = pipeline_with(
        llm.clone(),
        Arc::new(MockTermProvider::new()),
        AnalysisCache::in_memory(),
    );
    (pipeline, llm)
}
