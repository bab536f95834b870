/// Tidy rendered markdown.
///
/// - Trim trailing whitespace from each line (CRLF counts as a line end)
/// - Collapse runs of blank lines to one
/// - Drop leading and trailing blank lines
pub fn normalize_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut blank_pending = false;

    for line in s.lines() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            blank_pending = !result.is_empty();
            continue;
        }

        if !result.is_empty() {
            result.push('\n');
            if blank_pending {
                result.push('\n');
            }
        }
        blank_pending = false;
        result.push_str(trimmed);
    }

    result
}
