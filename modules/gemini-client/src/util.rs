/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Strip markdown code fences the model sometimes wraps JSON answers in.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Interpret a free-text answer to a yes/no question. Only an answer that
/// starts with "yes" (any case, leading whitespace and quotes ignored) counts.
pub fn parse_yes_no(answer: &str) -> bool {
    answer
        .trim()
        .trim_start_matches(['"', '\'', '*', '`'])
        .to_lowercase()
        .starts_with("yes")
}
