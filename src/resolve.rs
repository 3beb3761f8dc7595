use crate::{EngineError, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// A candidate turned into something a worker can fetch and store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    /// Raw attribute value as found in the document.
    pub source: String,
    /// Absolute URL to fetch.
    pub url: String,
    /// Local file name inside the page's store directory.
    pub file_name: String,
}

impl ResolvedResource {
    pub fn new(source: &str, base: &str) -> Self {
        Self {
            source: source.to_string(),
            url: resolve(source, base),
            file_name: sanitize_file_name(source),
        }
    }
}

/// Joins a document reference onto `base`.
///
/// Never fails: a malformed pair produces a syntactically joined string and
/// the fetch step reports it as unreachable.
pub fn resolve(reference: &str, base: &str) -> String {
    let lower = reference.to_ascii_lowercase();
    // Match the scheme with its colon; a bare "http" prefix would pass
    // relative names like "httpdocs/a.png" through unresolved.
    if lower.starts_with("http:") || lower.starts_with("https:") {
        return reference.to_string();
    }
    if reference.starts_with("//") {
        return format!("https:{reference}");
    }
    if reference.starts_with('/') {
        let root = origin_of(base).unwrap_or_else(|| base.to_string());
        return join(&root, reference);
    }
    join(base, reference)
}

/// Base used for a scraped page: scheme, host and explicit port only.
pub fn page_base(page_url: &str) -> String {
    origin_of(page_url).unwrap_or_else(|| page_url.trim_end_matches('/').to_string())
}

/// Query stripped, last path segment kept, everything outside
/// `[A-Za-z0-9.-]` replaced with `_`.
///
/// Two candidates can map to the same name; the later write wins.
pub fn sanitize_file_name(candidate: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    let invalid = INVALID.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\-.]").expect("file name regex"));

    let without_query = candidate
        .split_once('?')
        .map(|(head, _)| head)
        .unwrap_or(candidate);
    let base_name = without_query
        .rsplit_once('/')
        .map(|(_, tail)| tail)
        .unwrap_or(without_query);
    invalid.replace_all(base_name, "_").into_owned()
}

/// Rejects anything that is not an absolute http(s) URL with a host.
pub fn normalize_http_url(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidUrl("empty URL provided".to_string()));
    }
    let parsed = Url::parse(trimmed)
        .map_err(|_| EngineError::InvalidUrl(format!("invalid URL format: {trimmed}")))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(EngineError::InvalidUrl(format!(
                "unsupported URL scheme {other}; only http/https are allowed"
            )));
        }
    }
    if parsed.host_str().is_none() {
        return Err(EngineError::InvalidUrl(format!(
            "URL is missing host: {}",
            redact_url_for_log(trimmed)
        )));
    }
    Ok(trimmed.to_string())
}

pub fn redact_url_for_log(value: &str) -> String {
    match Url::parse(value) {
        Ok(uri) => {
            let scheme = uri.scheme();
            let authority = uri.host_str().unwrap_or("unknown-host");
            format!("{scheme}://{authority}/...")
        }
        Err(_) => "[invalid-url]".to_string(),
    }
}

fn origin_of(url: &str) -> Option<String> {
    let origin = Url::parse(url).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

fn join(base: &str, reference: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        reference.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_handles_each_reference_shape() {
        assert_eq!(
            resolve("//cdn.example.com/a.png", "https://site.com/x"),
            "https://cdn.example.com/a.png"
        );
        assert_eq!(
            resolve("/img/a.png", "https://site.com/x/y"),
            "https://site.com/img/a.png"
        );
        assert_eq!(
            resolve("a.png", "https://site.com/x/"),
            "https://site.com/x/a.png"
        );
        assert_eq!(
            resolve("https://cdn.com/a.png", "https://site.com"),
            "https://cdn.com/a.png"
        );
    }

    #[test]
    fn resolve_keeps_explicit_port_and_never_fails() {
        assert_eq!(
            resolve("/a.png", "http://localhost:8080/gallery/"),
            "http://localhost:8080/a.png"
        );
        assert_eq!(resolve("/a.png", "not a url/"), "not a url/a.png");
        assert_eq!(resolve("HTTP://x.com/a.png", "https://site.com"), "HTTP://x.com/a.png");
        assert_eq!(
            resolve("httpdocs/a.png", "https://site.com"),
            "https://site.com/httpdocs/a.png"
        );
    }

    #[test]
    fn page_base_drops_path_and_query() {
        assert_eq!(
            page_base("https://site.com/blog/post?id=3"),
            "https://site.com"
        );
        assert_eq!(page_base("http://127.0.0.1:9000/x"), "http://127.0.0.1:9000");
    }

    #[test]
    fn sanitize_strips_query_and_replaces_invalid_chars() {
        assert_eq!(sanitize_file_name("photo.jpg?size=large&v=2"), "photo.jpg");
        assert_eq!(sanitize_file_name("/img/2024/my pic!.png"), "my_pic_.png");
        assert_eq!(sanitize_file_name("wëird name!.png"), "w_ird_name_.png");
        assert_eq!(
            sanitize_file_name("https://cdn.com/a-b_c.webp"),
            "a-b_c.webp"
        );
    }

    #[test]
    fn resolved_resource_names_file_from_raw_candidate() {
        let r = ResolvedResource::new("/media/cat.gif?x=1", "https://site.com");
        assert_eq!(r.url, "https://site.com/media/cat.gif?x=1");
        assert_eq!(r.file_name, "cat.gif");
        assert_eq!(r.source, "/media/cat.gif?x=1");
    }

    #[test]
    fn normalize_http_url_allows_http_https_only() {
        assert!(normalize_http_url("https://example.com").is_ok());
        assert!(normalize_http_url("http://example.com/page").is_ok());
        assert!(normalize_http_url("ftp://example.com").is_err());
        assert!(normalize_http_url("   ").is_err());
        assert!(normalize_http_url("example.com/page").is_err());
    }
}
