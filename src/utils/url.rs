use once_cell::sync::Lazy;
use regex::Regex;

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$").expect("valid uuid regex")
});

/// Canonical hyphenated UUID text only; braces, urn prefixes and bare hex are rejected
pub fn looks_like_uuid(value: &str) -> bool {
    UUID_RE.is_match(value)
}

/// Host of a website address, lowercased and without a leading `www.`.
///
/// Accepts addresses without a scheme (`example.com/about`).
pub fn extract_clean_domain(website: &str) -> Option<String> {
    let trimmed = website.trim();
    if trimmed.is_empty() {
        return None;
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = ::url::Url::parse(&with_scheme).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_domains() {
        assert_eq!(extract_clean_domain("https://www.Example.com/path?q=1").as_deref(), Some("example.com"));
        assert_eq!(extract_clean_domain("shop.example.co.uk/products").as_deref(), Some("shop.example.co.uk"));
        assert_eq!(extract_clean_domain("http://example.com:8080").as_deref(), Some("example.com"));
        assert_eq!(extract_clean_domain("   "), None);
        assert_eq!(extract_clean_domain("http://"), None);
    }

    #[test]
    fn uuid_heuristic_is_strict() {
        assert!(looks_like_uuid("0b7f8c1e-4c2a-4f6e-9a7b-1234567890ab"));
        assert!(looks_like_uuid("0B7F8C1E-4C2A-4F6E-9A7B-1234567890AB"));
        assert!(!looks_like_uuid("ASA"));
        assert!(!looks_like_uuid("0b7f8c1e4c2a4f6e9a7b1234567890ab"));
    }
}
