//! Sentence-level segmentation.
//!
//! Text is split on every maximal run of `.`, `!` and `?`. Fragments are
//! trimmed and yielded in document order. Callers lower-case the document
//! once before segmenting.

fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

/// Split `text` into trimmed candidate clauses.
pub fn segment(text: &str) -> Segments<'_> {
    Segments { rest: Some(text) }
}

/// Lazy iterator over the fragments of a document. Cloning restarts from the
/// clone point.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    rest: Option<&'a str>,
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest?;
        match rest.find(is_terminator) {
            Some(idx) => {
                let fragment = &rest[..idx];
                let after = rest[idx..].trim_start_matches(is_terminator);
                self.rest = if after.is_empty() { None } else { Some(after) };
                Some(fragment.trim())
            }
            None => {
                self.rest = None;
                if rest.is_empty() {
                    None
                } else {
                    Some(rest.trim())
                }
            }
        }
    }
}
