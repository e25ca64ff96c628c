//! URL redaction for logs.

use url::Url;

/// Query parameter name fragments whose values never reach the logs.
const SENSITIVE_PARAMS: [&str; 3] = ["token", "key", "secret"];

/// Returns the URL with sensitive query values replaced by `[REDACTED]`.
pub fn redact_url(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let lowered = name.to_ascii_lowercase();
            let value = if SENSITIVE_PARAMS.iter().any(|s| lowered.contains(s)) {
                "[REDACTED]".to_string()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.set_fragment(None);
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_sensitive_params() {
        let url = Url::parse("https://api.example.com/v1/x?api_key=abc&page=2&refreshToken=t").unwrap();
        let redacted = redact_url(&url);

        assert!(redacted.contains("page=2"));
        assert!(!redacted.contains("abc"));
        assert!(!redacted.contains("=t"));
        assert!(redacted.contains("api_key=%5BREDACTED%5D"));
    }

    #[test]
    fn test_plain_url_unchanged() {
        let url = Url::parse("https://api.example.com/v1/items").unwrap();
        assert_eq!(redact_url(&url), "https://api.example.com/v1/items");
    }
}
