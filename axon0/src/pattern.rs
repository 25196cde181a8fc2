//! Signal name pattern compilation and matching.
//!
//! Patterns are plain strings with three shapes:
//!   - a literal name (`"workflow:start"`) matches that exact name only
//!   - a trailing `*` segment (`"agent:*"`) matches exactly one more
//!     colon-delimited segment
//!   - a trailing `**` segment (`"agent:**"`) matches any number of
//!     trailing segments (including zero)
//!   - the bare wildcard `"*"` matches every signal name
//!
//! Compilation happens once per subscription; matching is a cheap regex
//! test against already-compiled patterns, so a bus with many
//! subscribers does not recompile on every emitted signal.

use crate::error::PatternError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An uncompiled pattern string, as written by workflow authors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalPattern(String);

impl SignalPattern {
    /// Wrap a raw pattern string. Does not validate or compile it; use
    /// [`SignalPattern::compile`] for that.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// Borrow the raw pattern text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compile this pattern into a [`Matcher`].
    pub fn compile(&self) -> Result<Matcher, PatternError> {
        Matcher::compile(&self.0)
    }
}

impl fmt::Display for SignalPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SignalPattern {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for SignalPattern {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A compiled, ready-to-match pattern.
///
/// Kept as an enum rather than always going through `regex` so that the
/// overwhelmingly common case — a literal signal name — is a plain string
/// comparison with no regex engine involved at all.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Matches only this exact name.
    Literal(String),
    /// Matches every signal name.
    Any,
    /// Matches names satisfying the compiled wildcard regex.
    Wildcard {
        /// Original source pattern, kept for `Display`/debugging.
        source: String,
        regex: Regex,
    },
}

impl Matcher {
    /// Compile a raw pattern string into a [`Matcher`].
    ///
    /// # Errors
    /// Returns [`PatternError::Empty`] for an empty pattern, and
    /// [`PatternError::InvalidWildcard`] if `**` appears anywhere other
    /// than as the final segment.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        if pattern == "*" {
            return Ok(Matcher::Any);
        }
        if !pattern.contains('*') {
            return Ok(Matcher::Literal(pattern.to_owned()));
        }

        let segments: Vec<&str> = pattern.split(':').collect();
        for (i, seg) in segments.iter().enumerate() {
            if seg.contains('*') && *seg != "*" && *seg != "**" {
                return Err(PatternError::InvalidWildcard {
                    pattern: pattern.to_owned(),
                    reason: format!("segment {seg:?} mixes '*' with other characters"),
                });
            }
            if *seg == "**" && i != segments.len() - 1 {
                return Err(PatternError::InvalidWildcard {
                    pattern: pattern.to_owned(),
                    reason: "'**' is only allowed as the final segment".to_owned(),
                });
            }
        }

        let mut regex_src = String::from("^");
        for (i, seg) in segments.iter().enumerate() {
            if i > 0 {
                regex_src.push(':');
            }
            match *seg {
                "*" => regex_src.push_str("[^:]+"),
                "**" => {
                    // Drop the separator we just pushed for this segment,
                    // since "**" also covers the zero-trailing-segments case.
                    if i > 0 {
                        regex_src.pop();
                    }
                    regex_src.push_str("(:.*)?");
                }
                literal => regex_src.push_str(&regex::escape(literal)),
            }
        }
        regex_src.push('$');

        let regex = Regex::new(&regex_src).map_err(|e| PatternError::InvalidWildcard {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Matcher::Wildcard {
            source: pattern.to_owned(),
            regex,
        })
    }

    /// Test whether `name` matches this pattern.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::Literal(lit) => lit == name,
            Matcher::Any => true,
            Matcher::Wildcard { regex, .. } => regex.is_match(name),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Literal(s) => write!(f, "{s}"),
            Matcher::Any => write!(f, "*"),
            Matcher::Wildcard { source, .. } => write!(f, "{source}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_matches_exact_only() {
        let m = Matcher::compile("workflow:start").unwrap();
        assert!(m.matches("workflow:start"));
        assert!(!m.matches("workflow:end"));
        assert!(!m.matches("workflow:start:extra"));
    }

    #[test]
    fn bare_star_matches_everything() {
        let m = Matcher::compile("*").unwrap();
        assert!(m.matches("anything"));
        assert!(m.matches("a:b:c"));
    }

    #[test]
    fn single_segment_wildcard() {
        let m = Matcher::compile("agent:*").unwrap();
        assert!(m.matches("agent:activated"));
        assert!(m.matches("agent:complete"));
        assert!(!m.matches("agent"));
        assert!(!m.matches("agent:complete:extra"));
        assert!(!m.matches("workflow:start"));
    }

    #[test]
    fn double_star_matches_trailing_segments() {
        let m = Matcher::compile("agent:**").unwrap();
        assert!(m.matches("agent"));
        assert!(m.matches("agent:complete"));
        assert!(m.matches("agent:complete:extra:more"));
        assert!(!m.matches("workflow:start"));
    }

    #[test]
    fn prefix_star_variant() {
        let m = Matcher::compile("state:*:changed").unwrap();
        assert!(m.matches("state:counter:changed"));
        assert!(!m.matches("state:counter:pending"));
        assert!(!m.matches("state:a:b:changed"));
    }

    #[test]
    fn rejects_empty_pattern() {
        assert!(matches!(Matcher::compile(""), Err(PatternError::Empty)));
    }

    #[test]
    fn rejects_double_star_not_at_end() {
        let err = Matcher::compile("**:start").unwrap_err();
        assert!(matches!(err, PatternError::InvalidWildcard { .. }));
    }

    #[test]
    fn rejects_mixed_wildcard_segment() {
        let err = Matcher::compile("ag*nt:start").unwrap_err();
        assert!(matches!(err, PatternError::InvalidWildcard { .. }));
    }
}
