//! Minimal `{{state.path}}` / `{{signal.path}}` prompt template expansion.
//!
//! Deliberately narrow: dotted-path lookup into two JSON roots, nothing
//! more — no conditionals, loops, or filters.

use axon0::signal::Signal;
use serde_json::Value;

/// Expand every `{{state.a.b}}` / `{{signal.a.b}}` placeholder in
/// `template` by looking up the dotted path after the first segment
/// against `state` or `signal`. A binding whose path does not resolve
/// renders as an empty string.
pub fn expand(template: &str, state: &Value, signal: &Signal) -> String {
    let signal_value = serde_json::to_value(signal).unwrap_or(Value::Null);
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            // Unterminated placeholder: emit the rest verbatim and stop.
            out.push_str(&rest[start..]);
            return out;
        };
        let path = after[..end].trim();
        out.push_str(&resolve(path, state, &signal_value));
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

fn resolve(path: &str, state: &Value, signal: &Value) -> String {
    let mut segments = path.split('.');
    let root = match segments.next() {
        Some("state") => state,
        Some("signal") => signal,
        _ => return String::new(),
    };

    let mut current = root;
    for segment in segments {
        match current.get(segment) {
            Some(v) => current = v,
            None => return String::new(),
        }
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
