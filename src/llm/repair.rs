//! JSON enforcement as an explicit state machine
//!
//! ```text
//! AwaitingResponse --receive--> Validating --ok--> Accepted
//!                                   |  ^
//!                               err |  | repaired text
//!                                   v  |
//!                                Repairing --no strategy left--> Fallback
//! ```
//!
//! Strategies run in [`REPAIR_SEQUENCE`] order and are cumulative: each one
//! works on the output of the previous. A strategy that leaves the text
//! unchanged is skipped without a validation round.

use super::schema::LlmAnalysis;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairState {
    AwaitingResponse,
    Validating,
    Repairing,
    Accepted,
    Fallback,
}

impl RepairState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Fallback)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStrategy {
    /// Drop a Markdown code fence or prose before the JSON
    StripFences,
    /// Keep the text from the first `{` to the last `}`
    SliceBraces,
    /// `[1, 2,]` -> `[1, 2]`
    RemoveTrailingCommas,
    /// Close an unterminated string and any open brackets
    CloseBrackets,
}

pub const REPAIR_SEQUENCE: [RepairStrategy; 4] = [
    RepairStrategy::StripFences,
    RepairStrategy::SliceBraces,
    RepairStrategy::RemoveTrailingCommas,
    RepairStrategy::CloseBrackets,
];

impl RepairStrategy {
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::StripFences => strip_fences(text),
            Self::SliceBraces => slice_braces(text),
            Self::RemoveTrailingCommas => remove_trailing_commas(text),
            Self::CloseBrackets => close_brackets(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
    Accepted {
        analysis: LlmAnalysis,
        /// Strategies that changed the text, in order
        repairs: Vec<RepairStrategy>,
    },
    Fallback {
        /// Last validation error
        reason: String,
    },
}

/// Validates one model response, repairing it when possible
#[derive(Debug)]
pub struct RepairMachine {
    state: RepairState,
    text: String,
    max_repairs: usize,
    next_strategy: usize,
    applied: Vec<RepairStrategy>,
    accepted: Option<LlmAnalysis>,
    last_error: Option<String>,
}

impl RepairMachine {
    /// `max_repairs` caps how many strategies may be tried
    pub fn new(max_repairs: usize) -> Self {
        Self {
            state: RepairState::AwaitingResponse,
            text: String::new(),
            max_repairs: max_repairs.min(REPAIR_SEQUENCE.len()),
            next_strategy: 0,
            applied: Vec::new(),
            accepted: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> RepairState {
        self.state
    }

    /// Current (possibly repaired) text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn receive(&mut self, response: impl Into<String>) {
        if self.state == RepairState::AwaitingResponse {
            self.text = response.into();
            self.state = RepairState::Validating;
        }
    }

    /// Perform one transition and return the new state
    pub fn step(&mut self) -> RepairState {
        self.state = match self.state {
            RepairState::Validating => match LlmAnalysis::parse(&self.text) {
                Ok(analysis) => {
                    self.accepted = Some(analysis);
                    RepairState::Accepted
                }
                Err(e) => {
                    self.last_error = Some(e);
                    RepairState::Repairing
                }
            },
            RepairState::Repairing => self.repair(),
            terminal_or_waiting => terminal_or_waiting,
        };
        self.state
    }

    fn repair(&mut self) -> RepairState {
        while self.next_strategy < self.max_repairs {
            let strategy = REPAIR_SEQUENCE[self.next_strategy];
            self.next_strategy += 1;
            let repaired = strategy.apply(&self.text);
            if repaired != self.text {
                debug!(?strategy, "applied json repair");
                self.text = repaired;
                self.applied.push(strategy);
                return RepairState::Validating;
            }
        }
        RepairState::Fallback
    }

    /// Drive the machine from a fresh response to a terminal state
    pub fn run(mut self, response: impl Into<String>) -> RepairOutcome {
        self.receive(response);
        while !self.state.is_terminal() {
            self.step();
        }
        self.finish()
    }

    fn finish(self) -> RepairOutcome {
        match self.accepted {
            Some(analysis) => RepairOutcome::Accepted {
                analysis,
                repairs: self.applied,
            },
            None => RepairOutcome::Fallback {
                reason: self
                    .last_error
                    .unwrap_or_else(|| "no response".to_string()),
            },
        }
    }
}

fn strip_fences(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(open) = trimmed.find("```") {
        let after = &trimmed[open + 3..];
        // skip the info string ("json") up to the end of the fence line
        let body_start = after.find('\n').map_or(0, |i| i + 1);
        let body = &after[body_start..];
        let body = body.find("```").map_or(body, |close| &body[..close]);
        return body.trim().to_string();
    }
    match trimmed.find('{') {
        Some(start) => trimmed[start..].to_string(),
        None => trimmed.to_string(),
    }
}

fn slice_braces(text: &str) -> String {
    let Some(start) = text.find('{') else {
        return text.to_string();
    };
    match text.rfind('}') {
        Some(end) if end > start => text[start..=end].to_string(),
        _ => text[start..].to_string(),
    }
}

/// Walk `text` outside of string literals, calling `visit` for each char
/// with its byte offset. Opening quotes are visited, string contents are not.
/// Returns true when the text ends inside a string.
fn scan_outside_strings(text: &str, mut visit: impl FnMut(usize, char)) -> bool {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
        }
        visit(i, c);
    }
    in_string
}

fn remove_trailing_commas(text: &str) -> String {
    let mut doomed = Vec::new();
    let mut pending_comma: Option<usize> = None;
    scan_outside_strings(text, |i, c| match c {
        ',' => pending_comma = Some(i),
        '}' | ']' => {
            if let Some(comma) = pending_comma.take() {
                doomed.push(comma);
            }
        }
        c if c.is_whitespace() => {}
        _ => pending_comma = None,
    });

    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        if !doomed.contains(&i) {
            out.push(c);
        }
    }
    out
}

fn close_brackets(text: &str) -> String {
    let mut stack = Vec::new();
    let unterminated = scan_outside_strings(text, |_, c| match c {
        '{' => stack.push('}'),
        '[' => stack.push(']'),
        '}' | ']' => {
            if stack.last() == Some(&c) {
                stack.pop();
            }
        }
        _ => {}
    });

    let mut out = text.trim_end().to_string();
    if unterminated {
        out.push('"');
    }
    // a dangling separator cannot precede a closer
    while out.ends_with(',') || out.ends_with(':') {
        out.pop();
        if out.ends_with(|c: char| c.is_whitespace()) {
            out = out.trim_end().to_string();
        }
    }
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{"overall_summary": "요약", "clauses": []}"#;

    #[test]
    fn valid_json_needs_no_repair() {
        match RepairMachine::new(4).run(VALID) {
            RepairOutcome::Accepted { repairs, analysis } => {
                assert!(repairs.is_empty());
                assert_eq!(analysis.overall_summary.as_deref(), Some("요약"));
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
    }

    #[test]
    fn fenced_json_with_prose_is_repaired() {
        let response = format!("Here is the analysis:\n```json\n{}\n```\nThanks!", VALID);
        match RepairMachine::new(4).run(response) {
            RepairOutcome::Accepted { repairs, .. } => {
                assert_eq!(repairs, vec![RepairStrategy::StripFences]);
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
    }

    #[test]
    fn trailing_commas_and_truncation() {
        let response = r#"{"overall_summary": "요약", "key_points": ["a", "b",], "clauses": [{"clause_id": "clause_1", "summary": "잘림"#;
        match RepairMachine::new(4).run(response) {
            RepairOutcome::Accepted { analysis, repairs } => {
                assert!(repairs.contains(&RepairStrategy::CloseBrackets));
                assert_eq!(analysis.key_points, vec!["a", "b"]);
                assert_eq!(analysis.clauses[0].summary.as_deref(), Some("잘림"));
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
    }

    #[test]
    fn unrepairable_text_falls_back() {
        let outcome = RepairMachine::new(4).run("I cannot analyze this document.");
        assert!(matches!(outcome, RepairOutcome::Fallback { .. }));
    }

    #[test]
    fn repair_budget_is_respected() {
        // needs CloseBrackets, the fourth strategy
        let truncated = r#"{"overall_summary": "요약", "clauses": ["#;
        assert!(matches!(
            RepairMachine::new(2).run(truncated),
            RepairOutcome::Fallback { .. }
        ));
        assert!(matches!(
            RepairMachine::new(4).run(truncated),
            RepairOutcome::Accepted { .. }
        ));
    }

    #[test]
    fn states_advance_one_step_at_a_time() {
        let mut machine = RepairMachine::new(4);
        assert_eq!(machine.state(), RepairState::AwaitingResponse);
        assert_eq!(machine.step(), RepairState::AwaitingResponse);

        machine.receive(format!("```\n{}\n```", VALID));
        assert_eq!(machine.state(), RepairState::Validating);
        assert_eq!(machine.step(), RepairState::Repairing);
        assert_eq!(machine.step(), RepairState::Validating);
        assert_eq!(machine.text(), VALID);
        assert_eq!(machine.step(), RepairState::Accepted);
        assert_eq!(machine.step(), RepairState::Accepted);
    }

    #[test]
    fn commas_inside_strings_are_kept() {
        assert_eq!(remove_trailing_commas(r#"{"a": "x,}", }"#), r#"{"a": "x,}" }"#);
    }
}
