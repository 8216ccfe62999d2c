//! Destination URL validation, normalization and content hashing.
//!
//! Ensures every stored destination is an absolute `http`/`https` URL in a
//! canonical form, so the content hash of equal destinations is equal.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;
use url::Url;

/// `http://` typed in front of a pasted absolute URL.
static DOUBLED_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^http://(https?://)").expect("doubled scheme pattern is valid")
});

/// Reasons a destination is rejected (`InvalidDestination`).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DestinationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("Only HTTP and HTTPS protocols are allowed, got `{0}`")]
    UnsupportedScheme(String),
}

/// Validates a user-supplied destination and returns its canonical form.
///
/// # Normalization Rules
///
/// 1. Surrounding whitespace is trimmed
/// 2. A doubled leading scheme (`http://https://x`) collapses to the inner one
/// 3. **Protocol**: only `http` and `https` are accepted
/// 4. **Hostname**: required, converted to lowercase
/// 5. **Default ports**: removed (80 for HTTP, 443 for HTTPS)
/// 6. **Fragments**: removed
///
/// # Errors
///
/// See [`DestinationError`].
pub fn validate_destination(input: &str) -> Result<String, DestinationError> {
    let trimmed = input.trim();
    let collapsed = DOUBLED_SCHEME.replace(trimmed, "$1");

    let mut url =
        Url::parse(&collapsed).map_err(|e| DestinationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(DestinationError::UnsupportedScheme(other.to_string())),
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
        _ => return Err(DestinationError::MissingHost),
    };
    url.set_host(Some(&host))
        .map_err(|e| DestinationError::InvalidFormat(e.to_string()))?;

    url.set_fragment(None);

    let is_default_port = matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    );
    if is_default_port {
        let _ = url.set_port(None);
    }

    Ok(url.to_string())
}

/// Fixed-length digest of a canonical destination (hex SHA-256).
pub fn content_hash(destination: &str) -> String {
    hex::encode(Sha256::digest(destination.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_simple_https() {
        assert_eq!(
            validate_destination("https://example.com").unwrap(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_validate_trims_whitespace() {
        assert_eq!(
            validate_destination("  https://example.com/x \n").unwrap(),
            "https://example.com/x"
        );
    }

    #[test]
    fn test_validate_collapses_doubled_scheme() {
        assert_eq!(
            validate_destination("http://https://example.com/a").unwrap(),
            "https://example.com/a"
        );
        assert_eq!(
            validate_destination("HTTP://http://example.com/a").unwrap(),
            "http://example.com/a"
        );
    }

    #[test]
    fn test_validate_lowercases_host_and_drops_default_port() {
        assert_eq!(
            validate_destination("HTTPS://EXAMPLE.COM:443/Path?key=VALUE#anchor").unwrap(),
            "https://example.com/Path?key=VALUE"
        );
    }

    #[test]
    fn test_validate_keeps_custom_port() {
        assert_eq!(
            validate_destination("http://example.com:8080/path").unwrap(),
            "http://example.com:8080/path"
        );
    }

    #[test]
    fn test_validate_rejects_bare_scheme() {
        assert!(validate_destination("http://").is_err());
        assert!(validate_destination("https://").is_err());
        assert!(validate_destination("").is_err());
    }

    #[test]
    fn test_validate_rejects_other_schemes() {
        for input in [
            "ftp://example.com/file.txt",
            "javascript:alert('xss')",
            "mailto:test@example.com",
            "file:///etc/passwd",
        ] {
            assert!(
                matches!(
                    validate_destination(input),
                    Err(DestinationError::UnsupportedScheme(_))
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_rejects_relative_input() {
        assert!(matches!(
            validate_destination("example.com"),
            Err(DestinationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_content_hash_is_fixed_length_and_stable() {
        let a = content_hash("https://example.com/x");
        let b = content_hash("https://example.com/x");
        let c = content_hash("https://example.com/y");

        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
