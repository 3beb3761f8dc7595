use rand::seq::IndexedRandom;
use std::io::Read;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/93.0.4577.82 Safari/537.36",
    "Mozilla/5.0 (Linux; Android 10; SM-G973F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/93.0.4577.82 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 12; Pixel 5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/93.0.4577.82 Mobile Safari/537.36",
];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("http status {0}")]
    Status(u16),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("body exceeds {limit} bytes")]
    TooLarge { limit: u64 },
}

/// Headers shared by the page request and every resource request of one
/// scrape run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeaders {
    pub user_agent: String,
    pub referer: String,
}

impl RequestHeaders {
    pub fn for_page(page_url: &str, user_agents: &[String]) -> Self {
        Self {
            user_agent: random_user_agent(user_agents),
            referer: page_url.to_string(),
        }
    }
}

/// Picks one of `user_agents`, falling back to the built-in browser list
/// when it is empty.
pub fn random_user_agent(user_agents: &[String]) -> String {
    let mut rng = rand::rng();
    match user_agents.choose(&mut rng) {
        Some(agent) => agent.clone(),
        None => DEFAULT_USER_AGENTS
            .choose(&mut rng)
            .copied()
            .unwrap_or(DEFAULT_USER_AGENTS[0])
            .to_string(),
    }
}

/// Network capability used for both the page and its resources.
///
/// Any status >= 400 must come back as [`FetchError::Status`].
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, headers: &RequestHeaders) -> Result<Vec<u8>, FetchError>;
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn fetch(&self, url: &str, headers: &RequestHeaders) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url, headers)
    }
}

impl<T: Fetcher + ?Sized> Fetcher for std::sync::Arc<T> {
    fn fetch(&self, url: &str, headers: &RequestHeaders) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url, headers)
    }
}

/// Blocking HTTP fetcher backed by a shared `ureq` agent.
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_body_bytes: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_body_bytes: u64) -> Self {
        let mut config = ureq::Agent::config_builder();
        config = config
            .http_status_as_error(false)
            .timeout_global(Some(timeout));
        let agent: ureq::Agent = config.build().into();
        Self {
            agent,
            max_body_bytes,
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, headers: &RequestHeaders) -> Result<Vec<u8>, FetchError> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", headers.user_agent.as_str())
            .header("Referer", headers.referer.as_str())
            .call()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FetchError::Status(status));
        }

        let mut buf = Vec::new();
        response
            .body_mut()
            .as_reader()
            .take(self.max_body_bytes.saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(|e| FetchError::Body(e.to_string()))?;
        if buf.len() as u64 > self.max_body_bytes {
            return Err(FetchError::TooLarge {
                limit: self.max_body_bytes,
            });
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_user_agent_picks_from_configured_list() {
        let agents = vec!["agent-a".to_string(), "agent-b".to_string()];
        for _ in 0..20 {
            let picked = random_user_agent(&agents);
            assert!(agents.contains(&picked), "picked={picked}");
        }
    }

    #[test]
    fn random_user_agent_falls_back_to_builtin_list() {
        let picked = random_user_agent(&[]);
        assert!(DEFAULT_USER_AGENTS.contains(&picked.as_str()));
    }

    #[test]
    fn headers_use_page_url_as_referer() {
        let headers = RequestHeaders::for_page("https://site.com/x", &[]);
        assert_eq!(headers.referer, "https://site.com/x");
        assert!(headers.user_agent.starts_with("Mozilla/5.0"));
    }
}
