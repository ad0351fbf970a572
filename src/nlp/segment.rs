//! Clause segmentation
//!
//! Clause markers form a small grammar of variants ([`MarkerKind`]). The
//! scanner walks the normalized text left to right and, at every word
//! boundary, tries each variant in [`MARKER_GRAMMAR`] order. A match only
//! splits the document when it is a heading occurrence: at the start of a
//! line, or directly followed by a bracketed heading. Inline references such
//! as "제3조에 따라" or "Section 2 of this Agreement" never split.
//!
//! Clauses are numbered by appearance, not by the marker's numeral, so gaps
//! or typos in the source numbering do not leak into clause indices.

use super::normalize::paragraphs;
use super::scan::{char_at, char_before, is_hangul, skip_spaces, take_digits};
use crate::document::{Clause, Span};

/// Longest bracketed or line heading accepted, in characters
const MAX_HEADING_CHARS: usize = 60;

/// One variant of the clause-marker grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// `제N조`, `제 N 조`, `제N조의M`
    KoreanArticle,
    /// `Article N`, `ARTICLE IV`
    EnglishArticle,
    /// `Section N`, `Section 2.1`
    EnglishSection,
}

/// Variants in the order the scanner tries them
pub const MARKER_GRAMMAR: [MarkerKind; 3] = [
    MarkerKind::KoreanArticle,
    MarkerKind::EnglishArticle,
    MarkerKind::EnglishSection,
];

impl MarkerKind {
    /// Match this variant at byte offset `pos`, returning the marker's end offset
    pub fn match_at(self, text: &str, pos: usize) -> Option<usize> {
        match self {
            Self::KoreanArticle => match_korean_article(text, pos),
            Self::EnglishArticle => match_keyword(text, pos, "article", take_article_numeral),
            Self::EnglishSection => match_keyword(text, pos, "section", take_dotted_number),
        }
    }
}

fn match_korean_article(text: &str, pos: usize) -> Option<usize> {
    if !text.get(pos..)?.starts_with('제') {
        return None;
    }
    let mut i = skip_spaces(text, pos + '제'.len_utf8());
    let digits_end = take_digits(text, i);
    if digits_end == i {
        return None;
    }
    i = skip_spaces(text, digits_end);
    if !text.get(i..)?.starts_with('조') {
        return None;
    }
    i += '조'.len_utf8();

    // 제3조의2 (inserted article)
    if text[i..].starts_with('의') {
        let after = i + '의'.len_utf8();
        let end = take_digits(text, after);
        if end > after {
            i = end;
        }
    }

    // 제3조에, 제3조의 규정 ... are references
    if char_at(text, i).is_some_and(is_hangul) {
        return None;
    }
    Some(i)
}

fn match_keyword(
    text: &str,
    pos: usize,
    keyword: &str,
    numeral: fn(&str, usize) -> usize,
) -> Option<usize> {
    let head = text.get(pos..pos + keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let after_keyword = pos + keyword.len();
    let start = skip_spaces(text, after_keyword);
    if start == after_keyword {
        return None;
    }
    let end = numeral(text, start);
    if end == start {
        return None;
    }
    if char_at(text, end).is_some_and(char::is_alphanumeric) {
        return None;
    }
    Some(end)
}

fn take_article_numeral(text: &str, i: usize) -> usize {
    let end = take_digits(text, i);
    if end > i {
        return end;
    }
    let mut end = i;
    while text
        .as_bytes()
        .get(end)
        .is_some_and(|b| b"IVXLCivxlc".contains(b))
    {
        end += 1;
    }
    end
}

fn take_dotted_number(text: &str, i: usize) -> usize {
    let mut end = take_digits(text, i);
    if end == i {
        return i;
    }
    while text.as_bytes().get(end) == Some(&b'.') {
        let next = take_digits(text, end + 1);
        if next == end + 1 {
            break;
        }
        end = next;
    }
    end
}

/// A clause marker found by the scanner
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub start: usize,
    pub end: usize,
    /// Heading from a bracket right after the marker
    pub heading: Option<String>,
}

/// Scan the text for clause markers in appearance order
pub fn find_markers(text: &str) -> Vec<Marker> {
    let mut markers = Vec::new();
    let mut resume_at = 0;

    for (pos, _) in text.char_indices() {
        if pos < resume_at {
            continue;
        }
        if char_before(text, pos).is_some_and(char::is_alphanumeric) {
            continue;
        }

        for kind in MARKER_GRAMMAR {
            let Some(end) = kind.match_at(text, pos) else {
                continue;
            };
            let heading = bracket_heading(text, end);
            let line_start = pos == 0 || text[..pos].ends_with('\n');
            if heading.is_some() || line_start {
                markers.push(Marker {
                    kind,
                    start: pos,
                    end,
                    heading,
                });
                resume_at = end;
            }
            break;
        }
    }

    markers
}

fn bracket_heading(text: &str, marker_end: usize) -> Option<String> {
    let open_at = skip_spaces(text, marker_end);
    let open = char_at(text, open_at)?;
    let close = match open {
        '(' => ')',
        '（' => '）',
        '[' => ']',
        '【' => '】',
        '「' => '」',
        '<' => '>',
        _ => return None,
    };
    let inner_start = open_at + open.len_utf8();
    let rest = &text[inner_start..];
    let inner = &rest[..rest.find(close)?];
    if inner.contains('\n') || inner.chars().count() > MAX_HEADING_CHARS {
        return None;
    }
    let inner = inner.trim();
    (!inner.is_empty()).then(|| inner.to_string())
}

/// Heading written on the marker's own line ("Article 1. Definitions"),
/// accepted only when the clause continues on following lines.
fn line_heading(text: &str, marker_end: usize, clause_end: usize) -> Option<String> {
    let line_end = marker_end + text[marker_end..clause_end].find('\n')?;
    let remainder = text[marker_end..line_end]
        .trim_start_matches(|c: char| c == ' ' || c == '.' || c == ':' || c == '-' || c == ')')
        .trim();
    if remainder.is_empty() || remainder.chars().count() > MAX_HEADING_CHARS {
        return None;
    }
    if text[line_end..clause_end].trim().is_empty() {
        return None;
    }
    Some(remainder.to_string())
}

fn trim_span(text: &str, start: usize, end: usize) -> Option<Span> {
    let slice = &text[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    let span = Span::new(start + leading, end - trailing);
    (span.start < span.end).then_some(span)
}

/// Output of segmentation
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub preamble: Option<String>,
    pub clauses: Vec<Clause>,
}

/// Split normalized text into clauses.
///
/// Marker-based when at least one marker is present, paragraph-based
/// otherwise. Party labels are filled in later by the preprocessor.
pub fn segment(text: &str) -> Segmentation {
    let markers = find_markers(text);
    if markers.is_empty() {
        return Segmentation {
            preamble: None,
            clauses: segment_paragraphs(text),
        };
    }

    let preamble = trim_span(text, 0, markers[0].start)
        .map(|span| text[span.start..span.end].to_string());

    let mut clauses = Vec::with_capacity(markers.len());
    for (i, marker) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map_or(text.len(), |next| next.start);
        let Some(span) = trim_span(text, marker.start, end) else {
            continue;
        };
        let heading = marker
            .heading
            .clone()
            .or_else(|| line_heading(text, marker.end, span.end));

        clauses.push(Clause {
            index: clauses.len() + 1,
            marker: Some(text[marker.start..marker.end].to_string()),
            heading,
            text: text[span.start..span.end].to_string(),
            span,
            parties: Vec::new(),
        });
    }

    Segmentation { preamble, clauses }
}

fn segment_paragraphs(text: &str) -> Vec<Clause> {
    let mut clauses = Vec::new();
    for (offset, paragraph) in paragraphs(text) {
        let Some(span) = trim_span(text, offset, offset + paragraph.len()) else {
            continue;
        };
        clauses.push(Clause {
            index: clauses.len() + 1,
            marker: None,
            heading: None,
            text: text[span.start..span.end].to_string(),
            span,
            parties: Vec::new(),
        });
    }
    clauses
}
