//! Batched LLM analysis with retry, repair and merge
//!
//! Each batch prompt goes through up to `1 + max_requeries` rounds. A round
//! calls the client (retrying transient failures with exponential backoff)
//! and passes the answer through the repair machine. Permanent provider
//! errors abort the whole analysis; everything else degrades.

use super::prompt::{build_prompt, PromptContext};
use super::repair::{RepairMachine, RepairOutcome};
use super::schema::LlmAnalysis;
use super::{LlmClient, LlmError};
use crate::causal::DeclaredRelation;
use crate::config::LlmConfig;
use crate::document::{clause_node_id, Clause, Document, OutputLanguage};
use crate::result::{ClauseAnalysis, RiskLevel, SectionStatus};
use crate::terms::Glossary;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Merged analysis of every batch, before graph validation
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisDraft {
    /// One entry per document clause, in clause order
    pub clauses: Vec<ClauseAnalysis>,
    pub overall_summary: Option<String>,
    pub one_line_summary: Option<String>,
    pub risk_score: Option<u8>,
    pub risk_level: Option<RiskLevel>,
    pub key_points: Vec<String>,
    pub recommended_actions: Vec<String>,
    /// Declared risks as (id, description)
    pub risks: Vec<(String, Option<String>)>,
    pub relations: Vec<DeclaredRelation>,
    pub status: SectionStatus,
    pub warnings: Vec<String>,
}

impl AnalysisDraft {
    /// Result when no batch produced a usable answer
    pub fn failed(document: &Document, warnings: Vec<String>) -> Self {
        Self {
            clauses: document
                .clauses()
                .iter()
                .map(|c| ClauseAnalysis::empty(c.index, c.heading.clone()))
                .collect(),
            overall_summary: None,
            one_line_summary: None,
            risk_score: None,
            risk_level: None,
            key_points: Vec::new(),
            recommended_actions: Vec::new(),
            risks: Vec::new(),
            relations: Vec::new(),
            status: SectionStatus::LlmFailed,
            warnings,
        }
    }
}

/// Drives an [`LlmClient`] over a document
#[derive(Clone)]
pub struct LlmOrchestrator {
    client: Arc<dyn LlmClient>,
    config: LlmConfig,
}

impl LlmOrchestrator {
    pub fn new(client: Arc<dyn LlmClient>, config: LlmConfig) -> Self {
        Self { client, config }
    }

    pub fn model_id(&self) -> &str {
        self.client.model_id()
    }

    /// Analyze the document in clause batches.
    ///
    /// Only a permanent provider error is returned as `Err`; any other
    /// failure yields a degraded draft.
    pub async fn analyze(
        &self,
        document: &Document,
        glossary: &Glossary,
        language: OutputLanguage,
    ) -> Result<AnalysisDraft, LlmError> {
        let batch_size = self.config.clauses_per_batch.max(1);
        let batches: Vec<_> = document.clauses().chunks(batch_size).collect();
        let batch_count = batches.len();

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for (batch_index, &batch) in batches.iter().enumerate() {
            let prompt = build_prompt(&PromptContext {
                document,
                glossary,
                language,
                batch,
                batch_index,
                batch_count,
                max_clause_chars: self.config.max_clause_chars,
            });
            let worker = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (batch_index, Ok(None)),
                };
                (batch_index, worker.run_batch(batch_index, &prompt).await)
            });
        }

        let mut answers: BTreeMap<usize, LlmAnalysis> = BTreeMap::new();
        let mut warnings = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(Some(analysis)))) => {
                    answers.insert(index, analysis);
                }
                Ok((index, Ok(None))) => {
                    warnings.push(format!("analysis of batch {} failed", index + 1));
                }
                Ok((index, Err(e))) => {
                    warn!(batch = index + 1, error = %e, "permanent llm error, aborting");
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    warnings.push(format!("analysis task failed: {}", e));
                }
            }
        }

        if answers.is_empty() {
            warn!(batches = batch_count, "llm analysis failed, returning fallback");
            return Ok(AnalysisDraft::failed(document, warnings));
        }

        let draft = merge(document, &batches, answers, warnings);
        info!(
            batches = batch_count,
            status = draft.status.as_str(),
            relations = draft.relations.len(),
            "llm analysis finished"
        );
        Ok(draft)
    }

    /// One batch: query rounds until an answer validates.
    /// `Ok(None)` means the batch gave up.
    async fn run_batch(&self, batch: usize, prompt: &str) -> Result<Option<LlmAnalysis>, LlmError> {
        for round in 0..=self.config.max_requeries {
            let Some(response) = self.complete_with_retry(batch, prompt).await? else {
                return Ok(None);
            };
            match RepairMachine::new(self.config.max_repair_attempts).run(response) {
                RepairOutcome::Accepted { analysis, repairs } => {
                    if !repairs.is_empty() {
                        debug!(batch = batch + 1, ?repairs, "llm output repaired");
                    }
                    return Ok(Some(analysis));
                }
                RepairOutcome::Fallback { reason } => {
                    warn!(batch = batch + 1, round, %reason, "llm output unusable");
                }
            }
        }
        Ok(None)
    }

    /// `Ok(None)` when transient failures outlast the retry budget
    async fn complete_with_retry(&self, batch: usize, prompt: &str) -> Result<Option<String>, LlmError> {
        let mut attempt = 0;
        loop {
            let outcome = match tokio::time::timeout(self.config.timeout(), self.client.complete(prompt)).await {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout),
            };
            match outcome {
                Ok(text) => return Ok(Some(text)),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= self.config.max_retries => {
                    warn!(batch = batch + 1, attempts = attempt + 1, error = %e, "llm retries exhausted");
                    return Ok(None);
                }
                Err(e) => {
                    attempt += 1;
                    let delay = self.config.backoff(attempt);
                    debug!(batch = batch + 1, attempt, ?delay, error = %e, "retrying llm call");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Accepts `clause_3` or a bare `3`
fn parse_clause_index(id: &str) -> Option<usize> {
    let id = id.trim();
    id.strip_prefix("clause_").unwrap_or(id).parse().ok()
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn push_unique(into: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() && !into.contains(&item) {
            into.push(item);
        }
    }
}

fn merge(
    document: &Document,
    batches: &[&[Clause]],
    answers: BTreeMap<usize, LlmAnalysis>,
    mut warnings: Vec<String>,
) -> AnalysisDraft {
    let mut draft = AnalysisDraft::failed(document, Vec::new());
    let mut summaries = Vec::new();
    let mut levels = Vec::new();
    let (mut weighted, mut weight) = (0u64, 0u64);
    let mut covered = HashSet::new();

    for (batch_index, batch) in batches.iter().enumerate() {
        let Some(answer) = answers.get(&batch_index).cloned() else {
            continue;
        };
        let own: HashSet<usize> = batch.iter().map(|c| c.index).collect();

        for reply in answer.clauses {
            let Some(index) = parse_clause_index(&reply.clause_id).filter(|i| own.contains(i)) else {
                debug!(clause_id = %reply.clause_id, "ignoring clause outside batch");
                continue;
            };
            if !covered.insert(index) {
                continue;
            }
            let entry = &mut draft.clauses[index - 1];
            entry.summary = non_blank(reply.summary);
            entry.risk_level = reply.risk_level.as_deref().and_then(RiskLevel::from_label);
            entry.risk_notes = non_blank(reply.risk_notes);
            entry.risk_tags = reply.risk_tags.into_iter().filter(|t| !t.trim().is_empty()).collect();
        }

        if let Some(summary) = non_blank(answer.overall_summary) {
            summaries.push(summary);
        }
        if draft.one_line_summary.is_none() {
            draft.one_line_summary = non_blank(answer.one_line_summary);
        }
        if let Some(score) = answer.risk_score {
            weighted += u64::from(score) * batch.len() as u64;
            weight += batch.len() as u64;
        }
        if let Some(level) = answer.risk_level.as_deref().and_then(RiskLevel::from_label) {
            levels.push(level);
        }
        push_unique(&mut draft.key_points, answer.key_points);
        push_unique(&mut draft.recommended_actions, answer.recommended_actions);
        draft.risks.extend(
            answer
                .risks
                .into_iter()
                .map(|r| (r.risk_id, non_blank(r.description))),
        );
        draft.relations.extend(answer.causal_relations.into_iter().map(|r| DeclaredRelation {
            from: r.from,
            to: r.to,
            relation: r.relation,
            description: r.description,
        }));
    }

    draft.overall_summary = (!summaries.is_empty()).then(|| summaries.join("\n"));
    draft.risk_score = (weight > 0).then(|| ((weighted + weight / 2) / weight).min(100) as u8);
    draft.risk_level = match (answers.len(), draft.risk_score) {
        (1, _) => levels.first().copied().or(draft.risk_score.map(RiskLevel::from_score)),
        (_, Some(score)) => Some(RiskLevel::from_score(score)),
        (_, None) => levels.iter().max().copied(),
    };

    for clause in document.clauses() {
        if !covered.contains(&clause.index) {
            warnings.push(format!("{} has no analysis", clause_node_id(clause.index)));
        }
    }
    draft.status = if answers.len() == batches.len() && covered.len() == document.clauses().len() {
        SectionStatus::Resolved
    } else {
        SectionStatus::Fallback
    };
    draft.warnings = warnings;
    draft
}
