//! Korean legal-term dictionary client (law.go.kr `lstrm` service)

use super::{ProviderDefinition, TermLookupError, TermProvider};
use crate::config::TermsConfig;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Code name of the entry carrying the English translation
const ENGLISH_DICTIONARY: &str = "법령한영사전";

/// HTTP client for the MOLEG legal-term service
pub struct MolegClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl MolegClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// `None` when no API key is configured
    pub fn from_config(config: &TermsConfig) -> Option<Self> {
        let api_key = config.api_key.as_deref()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_default();
        Some(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl TermProvider for MolegClient {
    async fn lookup(&self, term: &str) -> Result<Option<ProviderDefinition>, TermLookupError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("OC", self.api_key.as_str()),
                ("target", "lstrm"),
                ("query", term),
                ("type", "JSON"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TermLookupError::Timeout
                } else {
                    TermLookupError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TermLookupError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        // the service sometimes labels JSON as text/html
        let body = resp
            .text()
            .await
            .map_err(|e| TermLookupError::Transport(e.to_string()))?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| TermLookupError::Malformed(e.to_string()))?;

        let found = parse_moleg_response(&value);
        debug!(term, found = found.is_some(), "moleg lookup");
        Ok(found)
    }
}

/// A field that is either a single string or a list of strings
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().unwrap_or_default().to_string())
            .collect(),
        _ => Vec::new(),
    }
}

/// Extract Korean and English definitions from a `lstrm` response.
///
/// Entries are parallel lists of definition, code name and usage example.
/// The `법령한영사전` entry gives the English text; the first other entry
/// with a definition (or, failing that, a usage example) gives the Korean.
pub fn parse_moleg_response(value: &Value) -> Option<ProviderDefinition> {
    let service = value.get("LsTrmService")?;
    let codes = string_list(service.get("법령용어코드명"));
    if codes.is_empty() {
        return None;
    }
    let mut definitions = string_list(service.get("법령용어정의"));
    let mut examples = string_list(service.get("용례"));
    definitions.resize(codes.len(), String::new());
    examples.resize(codes.len(), String::new());

    let mut korean = None;
    let mut english = None;
    for ((code, definition), example) in codes.iter().zip(&definitions).zip(&examples) {
        if code == ENGLISH_DICTIONARY {
            english = Some(definition.trim().to_string());
        } else if korean.is_none() {
            let text = if definition.trim().is_empty() {
                example.trim()
            } else {
                definition.trim()
            };
            if !text.is_empty() {
                korean = Some(clean_korean(text));
            }
        }
    }

    let found = ProviderDefinition::new(korean, english);
    (!found.is_empty()).then_some(found)
}

fn is_han(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

/// Strip HTML tags and entities, Latin letters and parenthesized Hanja,
/// then collapse whitespace.
fn clean_korean(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        let skip = match c {
            '<' => rest.find('>').map(|end| end + 1),
            '&' => entity_len(rest),
            '(' => hanja_group_len(rest),
            _ => None,
        };
        if let Some(len) = skip {
            rest = &rest[len..];
            continue;
        }
        if !c.is_ascii_alphabetic() {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `&amp;`, `&#39;` ...
fn entity_len(text: &str) -> Option<usize> {
    let end = text.find(';')?;
    let name = &text[1..end];
    (!name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '#'))
        .then_some(end + 1)
}

/// `(契約)`: parentheses holding only Hanja and spaces
fn hanja_group_len(text: &str) -> Option<usize> {
    let end = text.find(')')?;
    let inner = &text[1..end];
    (inner.chars().any(is_han) && inner.chars().all(|c| is_han(c) || c.is_whitespace()))
        .then_some(end + 1)
}
