// Shared prompt fragments and prompt-building utilities.
// Each module that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

use chrono::{DateTime, Utc};

/// Appended to every prompt whose reply goes through JSON extraction.
pub const JSON_ONLY_INSTRUCTION: &str = "Respond with the JSON only. \
    Do NOT include explanations, apologies or any text outside the JSON.";

/// Format used for prompt timestamps and persisted result documents.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A `Timestamp: ...` line. Appended to prompts so identical requests made at
/// different times are not answered from a provider-side cache.
pub fn timestamp_line(now: DateTime<Utc>) -> String {
    format!("Timestamp: {}", now.format(TIMESTAMP_FORMAT))
}

/// Fills `{name}` placeholders in a single left-to-right pass.
///
/// Substituted values are never scanned again, so text supplied by a
/// candidate cannot expand another placeholder. Braces that do not name a
/// known placeholder (the JSON examples in templates) are copied as-is.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let hit = values.iter().find_map(|(name, value)| {
            let inner = tail[1..].strip_prefix(name)?;
            inner.strip_prefix('}').map(|after| (*value, after))
        });
        match hit {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
