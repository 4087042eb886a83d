//! Ruling extraction from raw oracle output.
//!
//! This is the single place the default-on-ambiguity policy lives. Every
//! response, however mangled, yields exactly one [`Verdict`]:
//!
//! 1. Code-fence decoration (```` ```json ````, ```` ``` ````) is removed and
//!    the text trimmed.
//! 2. If what remains is JSON, the candidate is an object's `"ruling"` string
//!    field or a bare JSON string.
//! 3. Otherwise the candidate is a loose `ruling: X` field if one is present,
//!    else the whole text.
//! 4. The candidate is matched case-insensitively against `A` / `B`.
//!    Anything else becomes [`DEFAULT_VERDICT`] and the ruling is flagged
//!    `malformed`.

use std::sync::OnceLock;

use appeal_registry::{Verdict, DEFAULT_VERDICT};
use regex::Regex;
use serde_json::Value;

/// A verdict extracted from one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedRuling {
    /// The extracted (or defaulted) verdict.
    pub verdict: Verdict,
    /// True if the default was applied because no valid ruling was found.
    pub malformed: bool,
}

impl ParsedRuling {
    /// The ruling recorded for a response that could not be used at all.
    pub const fn fallback() -> Self {
        Self {
            verdict: DEFAULT_VERDICT,
            malformed: true,
        }
    }

    fn from_candidate(candidate: Option<&str>) -> Self {
        let token = candidate
            .map(|c| c.trim().trim_matches(|ch: char| matches!(ch, '"' | '\'' | '.')));
        match token.and_then(Verdict::from_candidate) {
            Some(verdict) => Self {
                verdict,
                malformed: false,
            },
            None => Self::fallback(),
        }
    }
}

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"(?i)```(?:json)?").expect("fence pattern is valid"))
}

fn ruling_field_pattern() -> &'static Regex {
    static FIELD: OnceLock<Regex> = OnceLock::new();
    FIELD.get_or_init(|| {
        Regex::new(r#"(?i)["']?ruling["']?\s*[:=]\s*["']?\s*([A-Za-z]+)"#)
            .expect("ruling field pattern is valid")
    })
}

/// Removes code-fence markers and surrounding whitespace.
pub fn strip_decoration(raw: &str) -> String {
    fence_pattern().replace_all(raw, "").trim().to_string()
}

/// Extracts a verdict from a raw response, reporting whether the default
/// was applied.
///
/// # Example
///
/// ```rust
/// use appeal_council::ruling::parse_ruling;
/// use appeal_registry::Verdict;
///
/// let parsed = parse_ruling("```json\n{\"ruling\": \"b\"}\n```");
/// assert_eq!(parsed.verdict, Verdict::B);
/// assert!(!parsed.malformed);
///
/// let garbage = parse_ruling("I cannot decide");
/// assert_eq!(garbage.verdict, Verdict::A);
/// assert!(garbage.malformed);
/// ```
pub fn parse_ruling(raw: &str) -> ParsedRuling {
    let text = strip_decoration(raw);
    if text.is_empty() {
        return ParsedRuling::fallback();
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => {
            ParsedRuling::from_candidate(map.get("ruling").and_then(Value::as_str))
        }
        Ok(Value::String(s)) => ParsedRuling::from_candidate(Some(&s)),
        Ok(_) => ParsedRuling::fallback(),
        Err(_) => match ruling_field_pattern().captures(&text) {
            Some(caps) => ParsedRuling::from_candidate(caps.get(1).map(|m| m.as_str())),
            None => ParsedRuling::from_candidate(Some(&text)),
        },
    }
}

/// Extracts a verdict from a raw response. Never fails.
pub fn normalize_ruling(raw: &str) -> Verdict {
    parse_ruling(raw).verdict
}
