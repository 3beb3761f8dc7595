use serde::{Deserialize, Serialize};
use std::fmt;

const DIGEST_HEX_LEN: usize = 32;

/// Lowercase hex MD5 of `input`.
///
/// MD5 keeps directory names compatible with stores written by earlier
/// deployments; it is a namespacing key, not a security boundary.
pub fn digest(input: &str) -> String {
    hex::encode(md5::compute(input.as_bytes()).0)
}

/// Store directory key for one source page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageIdentity(String);

impl PageIdentity {
    /// Hashes the raw page URL. No normalization happens first, so
    /// `https://a.com` and `https://a.com/` are different pages.
    pub fn from_page_url(page_url: &str) -> Self {
        Self(digest(page_url))
    }

    /// Accepts a caller-supplied identity only if it could have come from
    /// [`digest`].
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let well_formed = raw.len() == DIGEST_HEX_LEN
            && raw
                .chars()
                .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch));
        well_formed.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_md5_hex() {
        assert_eq!(digest(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            digest("https://example.com"),
            digest("https://example.com")
        );
        assert_eq!(digest("https://example.com").len(), 32);
    }

    #[test]
    fn identity_does_not_normalize_urls() {
        let a = PageIdentity::from_page_url("https://example.com/gallery");
        let b = PageIdentity::from_page_url("https://example.com/gallery/");
        let c = PageIdentity::from_page_url("https://Example.com/gallery");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn parse_rejects_anything_but_lowercase_digest_hex() {
        let id = PageIdentity::from_page_url("https://example.com");
        assert_eq!(PageIdentity::parse(id.as_str()), Some(id.clone()));
        assert!(PageIdentity::parse("../etc").is_none());
        assert!(PageIdentity::parse("D41D8CD98F00B204E9800998ECF8427E").is_none());
        assert!(PageIdentity::parse("abc").is_none());
    }
}
