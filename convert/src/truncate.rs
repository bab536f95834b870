//! Length bounding at paragraph or sentence boundaries.
//!
//! Lengths and positions count `char`s, never bytes.

/// Appended whenever content is cut.
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated...]";

/// Sentence endings considered when no paragraph break is close enough to
/// the limit. The cut lands just after the punctuation.
const SENTENCE_ENDINGS: &[&str] = &[". ", ".\n", "? ", "! "];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation {
    pub text: String,
    pub truncated: bool,
}

/// Bound `content` to `max_length` chars plus the marker.
///
/// A paragraph break past 80% of the limit is preferred, then a sentence
/// ending past 80%, then the raw cut.
#[must_use]
pub fn truncate(content: &str, max_length: usize) -> Truncation {
    let Some((cut, _)) = content.char_indices().nth(max_length) else {
        return Truncation {
            text: content.to_string(),
            truncated: false,
        };
    };
    let candidate = &content[..cut];

    let kept = if let Some(pos) = candidate.rfind("\n\n")
        && past_threshold(candidate, pos, max_length)
    {
        &candidate[..pos]
    } else if let Some(pos) = last_sentence_end(candidate)
        && past_threshold(candidate, pos, max_length)
    {
        &candidate[..=pos]
    } else {
        candidate
    };

    Truncation {
        text: format!("{kept}{TRUNCATION_MARKER}"),
        truncated: true,
    }
}

/// String form of [`truncate`].
#[must_use]
pub fn truncate_content(content: &str, max_length: usize) -> String {
    truncate(content, max_length).text
}

fn last_sentence_end(candidate: &str) -> Option<usize> {
    SENTENCE_ENDINGS
        .iter()
        .filter_map(|ending| candidate.rfind(ending))
        .max()
}

/// Whether byte offset `pos` lies beyond 0.8 × `max_length` chars.
fn past_threshold(candidate: &str, pos: usize, max_length: usize) -> bool {
    let char_pos = candidate[..pos].chars().count() as u128;
    char_pos * 5 > max_length as u128 * 4
}
