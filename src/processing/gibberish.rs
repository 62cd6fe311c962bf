//! # Gibberish Classifier
//!
//! A cheap heuristic that separates recovered text from the noise an unmarked
//! carrier's low bits decode to. It is not a language model: short or
//! symbol-heavy real text can be misclassified.

/// Texts shorter than this are always treated as noise.
pub const MIN_TEXT_CHARS: usize = 3;

/// Texts whose printable share falls strictly below this ratio are noise.
pub const MIN_PRINTABLE_RATIO: f64 = 0.5;

/// Printable ASCII: letters, digits, punctuation, space, and `\t \n \r \x0b \x0c`.
pub fn is_printable(c: char) -> bool {
    c.is_ascii_graphic() || matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

/// Returns `true` when `text` looks like noise rather than a watermark.
///
/// Exactly half printable is still accepted.
pub fn is_gibberish(text: &str) -> bool {
    let total = text.chars().count();
    if total < MIN_TEXT_CHARS {
        return true;
    }

    let printable = text.chars().filter(|&c| is_printable(c)).count();
    (printable as f64 / total as f64) < MIN_PRINTABLE_RATIO
}
