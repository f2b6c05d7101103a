use std::io;
use std::path::{Path, PathBuf};

use crate::config::ScraperConfig;
use crate::feed::{Channel, FeedError, render_feed};
use crate::parser::{ParseError, parse_filings, parse_news_releases};
use crate::types::{CommitteeId, FilingQuery, FilingReport, NewsItem, NewsOutcome};

use chrono::NaiveDate;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Page unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("Fetch failed: {0}")]
    FetchError(#[from] FetchError),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
    #[error("Feed error: {0}")]
    FeedError(#[from] FeedError),
    #[error("Failed to write {}: {source}", .path.display())]
    SinkError { path: PathBuf, source: io::Error },
}

/// Retrieves a page body. A form body turns the request into a POST.
pub trait PageFetcher {
    fn fetch(&self, url: &str, form_body: Option<&str>) -> Result<String, FetchError>;
}

/// Replaces the whole contents of a file.
pub trait FileSink {
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str, form_body: Option<&str>) -> Result<String, FetchError> {
        let request = match form_body {
            Some(body) => self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body.to_string()),
            None => self.client.get(url),
        };

        // Decoded with the response charset, UTF-8 when none is given.
        let html = request
            .send()
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        Ok(html)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsSink;

impl FileSink for FsSink {
    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}

#[derive(Debug, Clone)]
pub struct FecScraper<F = HttpFetcher> {
    fetcher: F,
    config: ScraperConfig,
}

impl FecScraper<HttpFetcher> {
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_config(ScraperConfig::default())
    }

    pub fn with_config(config: ScraperConfig) -> Result<Self, ScraperError> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self { fetcher, config })
    }
}

impl<F: PageFetcher> FecScraper<F> {
    pub fn from_parts(fetcher: F, config: ScraperConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    fn fetch_press_page(&self, year: i32) -> Result<String, FetchError> {
        let url = self.config.press_page_url(year);
        log::info!("Fetching press releases from {}", url);
        self.fetcher.fetch(&url, None)
    }

    /// Press releases for `year`, with fetch failures left to the caller.
    pub fn fetch_news(&self, year: i32) -> Result<Vec<NewsItem>, FetchError> {
        let page = self.fetch_press_page(year)?;
        Ok(parse_news_releases(&page, &self.config.press_base_url(year)))
    }

    /// Rebuilds the press release feed and hands it to `sink`.
    ///
    /// A failed fetch or an empty page leaves the feed file untouched and is
    /// reported as [`NewsOutcome::Unchanged`] rather than as an error.
    pub fn publish_news(
        &self,
        year: i32,
        sink: &impl FileSink,
    ) -> Result<NewsOutcome, ScraperError> {
        let path = &self.config.feed_path;

        let page = match self.fetch_press_page(year) {
            Ok(page) => page,
            Err(e) => {
                log::warn!("Leaving {} untouched: {}", path.display(), e);
                return Ok(NewsOutcome::Unchanged {
                    reason: e.to_string(),
                });
            }
        };

        if page.trim().is_empty() {
            log::warn!("Empty press page, leaving {} untouched", path.display());
            return Ok(NewsOutcome::Unchanged {
                reason: format!("empty response from {}", self.config.press_page_url(year)),
            });
        }

        let items = parse_news_releases(&page, &self.config.press_base_url(year));
        let feed = render_feed(&Channel::fec(), &items)?;

        sink.write(path, &feed)
            .map_err(|source| ScraperError::SinkError {
                path: path.clone(),
                source,
            })?;

        log::info!("Wrote {} press releases to {}", items.len(), path.display());
        Ok(NewsOutcome::Written {
            path: path.clone(),
            items: items.len(),
        })
    }

    pub fn fetch_filings(&self, query: FilingQuery) -> Result<FilingReport, ScraperError> {
        log::info!("Fetching {}...", query);
        let body = query.encode();
        let html = self.fetcher.fetch(&self.config.filings_url, Some(&body))?;
        let filings = parse_filings(&html)?;
        Ok(FilingReport { query, filings })
    }

    /// Filings received on `date`. Use [`crate::utils::today`] for the current day.
    pub fn today_filings(&self, date: NaiveDate) -> Result<FilingReport, ScraperError> {
        self.fetch_filings(FilingQuery::Date(date))
    }

    pub fn committee_filings(&self, id: &CommitteeId) -> Result<FilingReport, ScraperError> {
        self.fetch_filings(FilingQuery::Committee(id.clone()))
    }
}
