use crate::config::{CacheHitPolicy, ScraperConfig};
use crate::extract::extract_candidates;
use crate::fetch::{Fetcher, HttpFetcher, RequestHeaders};
use crate::identity::PageIdentity;
use crate::pipeline::run_downloads;
use crate::resolve::{normalize_http_url, page_base, redact_url_for_log, ResolvedResource};
use crate::store::{Store, StoredResource};
use crate::{EngineError, Result};
use scraper::Html;
use serde::{Deserialize, Serialize};

const VIDEO_NOT_IMPLEMENTED: &str = "Scraping videos is not yet implemented.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub identity: PageIdentity,
    /// Where the stored images can be listed.
    pub location: String,
    pub cache_hit: bool,
    /// Resolved URLs written during this call; empty on a cache hit.
    pub downloaded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadListing {
    pub images: Vec<String>,
}

impl From<Vec<StoredResource>> for DownloadListing {
    fn from(resources: Vec<StoredResource>) -> Self {
        Self {
            images: resources.into_iter().map(|r| r.public_path).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VideoScrape {
    NotImplemented,
}

impl VideoScrape {
    pub fn message(self) -> &'static str {
        match self {
            VideoScrape::NotImplemented => VIDEO_NOT_IMPLEMENTED,
        }
    }
}

/// Page scraper bound to one store and one network capability.
pub struct Scraper<F> {
    store: Store,
    fetcher: F,
    config: ScraperConfig,
}

impl Scraper<HttpFetcher> {
    pub fn from_config(config: ScraperConfig) -> Self {
        let config = config.normalized();
        let fetcher = HttpFetcher::new(config.request_timeout(), config.max_resource_bytes);
        Self::new(config, fetcher)
    }
}

impl<F: Fetcher> Scraper<F> {
    pub fn new(config: ScraperConfig, fetcher: F) -> Self {
        let config = config.normalized();
        Self {
            store: Store::new(config.store_root.clone()),
            fetcher,
            config,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn location_for(&self, identity: &PageIdentity) -> String {
        format!("{}/{identity}", self.config.public_base_url)
    }

    /// Scrapes `page_url` into its store directory unless it was scraped
    /// before.
    ///
    /// Only an unreachable page or a filesystem failure is an error; broken
    /// or non-image resources are simply left out of `downloaded`.
    pub fn scrape(&self, page_url: &str) -> Result<ScrapeResponse> {
        // The identity hashes the caller's string byte-for-byte; only the
        // request uses the validated form.
        let identity = PageIdentity::from_page_url(page_url);
        let page_url = normalize_http_url(page_url)?;
        let location = self.location_for(&identity);

        if self.is_cache_hit(&identity)? {
            tracing::info!(
                url = %redact_url_for_log(&page_url),
                identity = %identity,
                "scrape_cache_hit"
            );
            return Ok(ScrapeResponse {
                identity,
                location,
                cache_hit: true,
                downloaded: Vec::new(),
            });
        }

        let headers = RequestHeaders::for_page(&page_url, &self.config.user_agents);
        let html = match self.fetcher.fetch(&page_url, &headers) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => {
                tracing::warn!(
                    url = %redact_url_for_log(&page_url),
                    error = %err,
                    "page_fetch_failed"
                );
                return Err(EngineError::PageUnreachable {
                    url: page_url,
                    reason: err.to_string(),
                });
            }
        };

        let base = page_base(&page_url);
        let resources: Vec<ResolvedResource> = {
            let document = Html::parse_document(&html);
            extract_candidates(&document)
                .iter()
                .map(|candidate| {
                    let resource = ResolvedResource::new(&candidate.value, &base);
                    tracing::debug!(
                        attr = candidate.attr.name(),
                        url = %resource.url,
                        file_name = %resource.file_name,
                        "candidate_resolved"
                    );
                    resource
                })
                .collect()
        };

        let dir = self.store.ensure(&identity)?;
        let candidates = resources.len();
        let downloaded = run_downloads(
            &self.fetcher,
            &headers,
            resources,
            &dir,
            self.config.max_in_flight,
        )?;

        tracing::info!(
            url = %redact_url_for_log(&page_url),
            identity = %identity,
            candidates,
            downloaded = downloaded.len(),
            "scrape_finished"
        );

        Ok(ScrapeResponse {
            identity,
            location,
            cache_hit: false,
            downloaded,
        })
    }

    /// Public paths of everything stored for `identity`.
    ///
    /// A string that is not a page identity can never name a store
    /// directory and is reported as not found.
    pub fn list_downloads(&self, identity: &str) -> Result<DownloadListing> {
        let identity = PageIdentity::parse(identity)
            .ok_or_else(|| EngineError::StoreNotFound(identity.trim().to_string()))?;
        Ok(self.store.list(&identity)?.into())
    }

    pub fn scrape_videos(&self, page_url: &str) -> VideoScrape {
        tracing::debug!(url = %redact_url_for_log(page_url), "scrape_videos_not_implemented");
        VideoScrape::NotImplemented
    }

    fn is_cache_hit(&self, identity: &PageIdentity) -> Result<bool> {
        match self.config.cache_hit {
            CacheHitPolicy::DirectoryExists => Ok(self.store.exists(identity)),
            CacheHitPolicy::DirectoryHasMedia => self.store.has_media(identity),
        }
    }
}
