//! Utility helpers shared across the specrun crates.

use once_cell::sync::Lazy;
use regex::Regex;

pub mod async_runtime;
pub mod loader;
pub mod values;

pub use async_runtime::block_on_future;
pub use loader::{LoadedDocument, load_document};
pub use values::{display_string, is_falsy};

static REDACTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(authorization: )([^\r\n]+)",
        r"(?i)([A-Z0-9_]*(?:KEY|TOKEN|SECRET|PASSWORD)=)([^\s]+)",
        r"(?i)(bearer )([\w\-\.=/+]+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static redaction pattern"))
    .collect()
});

/// Redacts values that look like secrets in a string.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for re in REDACTION_PATTERNS.iter() {
        redacted = re
            .replace_all(&redacted, |caps: &regex::Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{}<redacted>", prefix)
            })
            .to_string();
    }
    redacted
}
