//! Turning inbound request paths into candidate short codes.

use regex::Regex;
use std::sync::LazyLock;

/// Longest code the mapping table accepts.
pub const MAX_CODE_LENGTH: usize = 255;

/// Separators and punctuation that never appear in a short code.
static FORBIDDEN_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[/#%&@*{}\\:;<>?+ .,'"$|`^\[\]]"#).expect("forbidden character class is valid")
});

/// Returns true if `code` is shaped like a short code.
///
/// Rejects empty or overlong values, control characters, and anything in
/// the forbidden punctuation set.
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LENGTH
        && !code.chars().any(char::is_control)
        && !FORBIDDEN_CHARS.is_match(code)
}

/// Normalizes a request path into a bare code by dropping every `/`.
///
/// Returns `None` when the result is not a valid short code.
pub fn normalize_request_path(path: &str) -> Option<String> {
    let code: String = path.chars().filter(|&c| c != '/').collect();
    is_valid_short_code(&code).then_some(code)
}
