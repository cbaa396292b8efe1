// Clean report text before it is embedded in the analysis prompt.
// Lab reports are untrusted input: a crafted PDF can carry hidden
// instructions aimed at the model.

/// Maximum document text embedded in a prompt (bytes, cut at a word boundary).
pub const MAX_PROMPT_TEXT_LENGTH: usize = 50_000;

const TRUNCATION_MARKER: &str = "…[TRUNCATED]";

/// Zero-width, bidi-override and other formatting characters.
const INVISIBLE_CHARS: &[char] = &[
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{200E}', '\u{200F}', '\u{202A}', '\u{202B}',
    '\u{202C}', '\u{202D}', '\u{202E}', '\u{2060}', '\u{2061}', '\u{2062}', '\u{2063}',
    '\u{2064}', '\u{FEFF}',
];

/// Line prefixes that impersonate a chat role or an instruction channel.
const ROLE_PREFIXES: &[&str] = &[
    "system:",
    "assistant:",
    "user:",
    "[system]",
    "[assistant]",
    "[inst]",
    "[/inst]",
    "<<sys>>",
    "<|im_start|>",
    "<|im_end|>",
    "note to ai:",
    "instructions:",
    "system update:",
];

/// Phrases that try to replace the analysis instructions.
const OVERRIDE_PHRASES: &[&str] = &[
    "ignore previous instructions",
    "ignore all instructions",
    "ignore the above instructions",
    "disregard your instructions",
    "disregard all instructions",
    "forget your instructions",
    "forget all instructions",
    "new instructions:",
    "override:",
    "respond only with",
];

/// Tags that could close or reopen the prompt's own document wrapper.
const WRAPPER_TAGS: &[&str] = &["<document", "</document", "<system", "</system", "<instruction", "</instruction"];

/// Sanitize text for the prompt: remove invisible characters and injection
/// lines, collapse blank runs, truncate. `request_id` is only used to tag
/// the audit log line; content is never logged.
pub fn sanitize_for_prompt(raw: &str, request_id: Option<&str>) -> String {
    let visible: String = raw
        .chars()
        .filter(|c| !INVISIBLE_CHARS.contains(c))
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect();

    let (kept, removed) = drop_injection_lines(&visible);
    if removed > 0 {
        tracing::warn!(
            request_id = request_id.unwrap_or("unknown"),
            removed_lines = removed,
            "Injection patterns removed from report text"
        );
    }

    truncate_at_word(&collapse_blank_lines(&kept), MAX_PROMPT_TEXT_LENGTH)
}

fn is_injection_line(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    ROLE_PREFIXES.iter().any(|p| lower.starts_with(p))
        || WRAPPER_TAGS.iter().any(|t| lower.starts_with(t))
        || OVERRIDE_PHRASES.iter().any(|p| lower.contains(p))
}

fn drop_injection_lines(text: &str) -> (String, usize) {
    let mut removed = 0usize;
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| {
            let hit = is_injection_line(line);
            if hit {
                removed += 1;
            }
            !hit
        })
        .collect();
    (kept.join("\n"), removed)
}

/// Trim each line and keep at most one blank line between paragraphs.
fn collapse_blank_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() && out.last().map_or(true, |prev| prev.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last() == Some(&"") {
        out.pop();
    }
    out.join("\n")
}

fn truncate_at_word(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let head = &text[..cut];
    let head = match head.rfind(char::is_whitespace) {
        Some(pos) => &head[..pos],
        None => head,
    };
    format!("{head}{TRUNCATION_MARKER}")
}
