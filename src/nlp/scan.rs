//! Low-level text scanning shared by the preprocessor stages

/// Hangul syllables and jamo blocks
pub fn is_hangul(c: char) -> bool {
    matches!(
        c,
        '\u{AC00}'..='\u{D7A3}'
            | '\u{1100}'..='\u{11FF}'
            | '\u{3130}'..='\u{318F}'
            | '\u{A960}'..='\u{A97F}'
            | '\u{D7B0}'..='\u{D7FF}'
    )
}

/// Basic Latin letters plus the Latin-1 / Extended / Vietnamese ranges
pub fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic()
        || (c.is_alphabetic()
            && matches!(c, '\u{00C0}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}'))
}

/// The character starting at byte offset `i`, if any
pub fn char_at(text: &str, i: usize) -> Option<char> {
    text.get(i..).and_then(|s| s.chars().next())
}

/// The character ending right before byte offset `i`, if any
pub fn char_before(text: &str, i: usize) -> Option<char> {
    text.get(..i).and_then(|s| s.chars().next_back())
}

/// Advance past plain spaces
pub fn skip_spaces(text: &str, mut i: usize) -> usize {
    while text.as_bytes().get(i) == Some(&b' ') {
        i += 1;
    }
    i
}

/// Advance past ASCII digits
pub fn take_digits(text: &str, mut i: usize) -> usize {
    while text.as_bytes().get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    i
}

/// Byte offsets of every occurrence of `needle` in `text`.
///
/// ASCII needles match case-insensitively on word boundaries ("rent" does
/// not match inside "current"). Other needles match as plain substrings,
/// since Korean attaches particles directly to nouns.
pub fn find_all(text: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }

    if !needle.is_ascii() {
        return text.match_indices(needle).map(|(i, _)| i).collect();
    }

    let mut hits = Vec::new();
    for (i, _) in text.char_indices() {
        let Some(candidate) = text.get(i..i + needle.len()) else {
            continue;
        };
        if !candidate.eq_ignore_ascii_case(needle) {
            continue;
        }
        let before_ok = char_before(text, i).map_or(true, |c| !c.is_alphanumeric());
        let after_ok = char_at(text, i + needle.len()).map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            hits.push(i);
        }
    }
    hits
}

/// Maximal runs of alphanumeric characters with their byte offsets
pub fn words(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        match (c.is_alphanumeric(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                out.push((s, &text[s..i]));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, &text[s..]));
    }
    out
}
