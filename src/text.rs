//! Clean-up of raw model output before it is parsed.
//!
//! Chat models like to wrap JSON answers in a markdown code fence even when
//! told not to. [`normalize`] removes that wrapping and surrounding
//! whitespace, and leaves everything else alone.

use std::sync::LazyLock;

use regex::Regex;

/// An opening fence with an optional info string (`json`, `JSON`, `jsonc`...),
/// the enclosed body, and a closing fence. Only matches the whole input.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)\A(?P<open>```|~~~)[A-Za-z0-9_+.#-]*[ \t]*\r?\n(?P<body>.*?)\r?\n?(?P<close>```|~~~)\z",
    )
    .expect("fence pattern is valid")
});

/// Strips presentation artifacts from a model reply.
///
/// The input is trimmed. If it then starts with a fence marker (optionally
/// tagged with a language) and ends with the same marker, both markers are
/// removed. This repeats while an outer fence remains, and the result is
/// trimmed each time, so `normalize(&normalize(s)) == normalize(s)`.
///
/// Fences inside the text are never touched. Input without an outer fence
/// comes back trimmed and otherwise unchanged.
///
/// ```
/// use fact_or_opinion::text::normalize;
///
/// assert_eq!(normalize("```json\n{\"a\":1}\n```"), "{\"a\":1}");
/// assert_eq!(normalize("   {\"a\":1}   "), "{\"a\":1}");
/// ```
pub fn normalize(raw: &str) -> String {
    let mut current = raw.trim();
    while let Some(inner) = strip_fence(current) {
        current = inner.trim();
    }
    current.to_string()
}

fn strip_fence(text: &str) -> Option<&str> {
    let caps = FENCED_BLOCK.captures(text)?;
    if caps["open"] != caps["close"] {
        return None;
    }
    caps.name("body").map(|m| m.as_str())
}
