//! Answer grading.
//!
//! Both sides are normalized the same way before comparison: lowercased,
//! trimmed, then stripped of every character that is neither a word
//! character (`[A-Za-z0-9_]`) nor whitespace. Internal whitespace is kept
//! as-is and there is no numeric tolerance or synonym matching.

/// Normalize an answer for comparison.
///
/// Trimming happens before punctuation is removed, so `"cell !"` becomes
/// `"cell "` and keeps its inner space.
///
/// Whitespace is Unicode `White_Space`, so U+0085 counts and U+FEFF does not.
#[must_use]
pub fn normalize_answer(answer: &str) -> String {
    answer
        .to_lowercase()
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect()
}

/// Returns true when `submitted` equals `correct` after normalization.
///
/// Callers reject blank submissions before grading; this function only
/// compares.
#[must_use]
pub fn grade(submitted: &str, correct: &str) -> bool {
    normalize_answer(submitted) == normalize_answer(correct)
}
