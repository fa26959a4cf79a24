/// Collapse every whitespace run to a single ASCII space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Fold Arabic code points that Persian text often carries by keyboard
/// accident onto their Persian forms. Every replacement has the same UTF-8
/// length as the original, so byte offsets are preserved.
pub fn fold_persian(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'ي' | 'ى' => 'ی',
            'ك' => 'ک',
            '٠'..='٩' => {
                let digit = c as u32 - '٠' as u32;
                char::from_u32('۰' as u32 + digit).unwrap_or(c)
            }
            _ => c,
        })
        .collect()
}

/// Byte ranges of the whitespace-separated words of `text`.
pub(crate) fn word_spans(text: &str) -> Vec<std::ops::Range<usize>> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push(s..i);
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push(s..text.len());
    }
    spans
}
