//! Whitespace normalization

/// Normalize raw extracted text.
///
/// - line endings become `\n`
/// - zero-width characters are removed
/// - every run of whitespace inside a line becomes one space; lines are trimmed
/// - any run of blank lines becomes exactly one paragraph break (`\n\n`)
pub fn normalize_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(unified.len());
    let mut pending_break = false;

    for line in unified.split('\n') {
        let line = normalize_line(line);
        if line.is_empty() {
            pending_break = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push_str(if pending_break { "\n\n" } else { "\n" });
        }
        pending_break = false;
        out.push_str(&line);
    }

    out
}

fn normalize_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last_was_space = true;

    for c in line.chars() {
        if is_zero_width(c) {
            continue;
        }
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
            continue;
        }
        out.push(c);
        last_was_space = false;
    }

    if out.ends_with(' ') {
        out.pop();
    }
    out
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}')
}

/// Paragraphs separated by blank lines, with their byte offsets
pub fn paragraphs(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, _) in text.match_indices("\n\n") {
        out.push((start, &text[start..i]));
        start = i + 2;
    }
    out.push((start, &text[start..]));
    out
}
