//! Tier 2: bounded heuristic repair of a structurally broken response.
//!
//! Four fixes, applied in order, all counted rather than guessed:
//! strip Markdown code fences, drop any preamble before the first opening
//! brace/bracket, append the missing closers for whatever delimiters remain
//! open at end of input, and strip trailing commas before closers.
//! Balancing runs before the comma pass: a response truncated right after
//! an item separator gains its closers first, which turns that separator
//! into a strippable trailing comma. Nothing here reorders or invents
//! content.

/// Returns the repaired text, or `None` when there is no structured content
/// to anchor on (no `{` or `[` anywhere).
pub(crate) fn repair(raw: &str) -> Option<String> {
    let text = strip_code_fences(raw);
    let text = strip_preamble(text)?;
    let text = balance_delimiters(text);
    Some(strip_trailing_commas(&text))
}

/// Removes a leading/trailing Markdown fence (```json ... ```), tolerating
/// a missing closing fence on truncated output.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json", "JSON", ...) up to the first newline.
    let body = match after_open.find('\n') {
        Some(pos) => &after_open[pos + 1..],
        None => after_open,
    };
    body.trim_end_matches('`').trim()
}

/// Discards everything before the first `{` or `[`.
fn strip_preamble(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    Some(&text[start..])
}

/// Removes commas that directly precede (modulo whitespace) a closing brace
/// or bracket. String-aware: commas inside string literals are untouched.
fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = text.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Appends the closers for delimiters still open at end of input, in
/// reverse nesting order. An unterminated string literal gets its quote
/// first. Stray closers are dropped instead of pushed onto the stack.
fn balance_delimiters(text: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut out = String::with_capacity(text.len() + 4);

    for c in text.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '{' => {
                stack.push('}');
                out.push(c);
            }
            '[' => {
                stack.push(']');
                out.push(c);
            }
            '}' | ']' => {
                if stack.last() == Some(&c) {
                    stack.pop();
                    out.push(c);
                }
                // Mismatched closer: drop it, the stack knows better.
            }
            _ => out.push(c),
        }
    }

    if in_string {
        out.push('"');
    }
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}
