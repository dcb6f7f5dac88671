//! Text canonicalization shared by every identity and categorical comparison.

use unicode_general_category::{get_general_category, GeneralCategory};
use unicode_normalization::UnicodeNormalization;

/// Values of `curriculum_complete` that count as completed, after normalization.
const AFFIRMATIVE: &[&str] = &["YES", "Y", "TRUE", "1", "SI"];

/// Canonical form for matching: uppercase, no accents, only `[A-Z0-9 ,]`,
/// single spaces, trimmed.
///
/// Total: any input yields a (possibly empty) string.
pub fn normalize_text(s: &str) -> String {
    let upper = s.trim().to_uppercase();

    let mut out = String::with_capacity(upper.len());
    let mut pending_space = false;
    for ch in upper.nfd().filter(|c| !is_nonspacing_mark(*c)) {
        let kept = ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == ',';
        if kept {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            // Spaces and every rejected character collapse into one separator.
            pending_space = true;
        }
    }
    out
}

/// Accents left over by NFD. Spacing and enclosing marks are not dropped;
/// they fall through to the separator rule like any other rejected character.
fn is_nonspacing_mark(c: char) -> bool {
    get_general_category(c) == GeneralCategory::NonspacingMark
}

/// True when `value` is one of the accepted "completed" spellings.
pub fn is_affirmative(value: &str) -> bool {
    let key = normalize_text(value);
    AFFIRMATIVE.contains(&key.as_str())
}
