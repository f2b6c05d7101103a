pub mod config;
pub mod feed;
pub mod parser;
pub mod scraper;
pub mod types;
pub mod utils;

pub use config::ScraperConfig;
pub use scraper::{FecScraper, FetchError, FileSink, FsSink, HttpFetcher, PageFetcher, ScraperError};

pub(crate) const PRESS_ROOT: &str = "http://www.fec.gov/press";
pub(crate) const FILINGS_URL: &str = "http://query.nictusa.com/cgi-bin/dcdev/forms/";
pub(crate) const FEED_FILE: &str = "fecnews.rss";

/// Press releases kept per feed run.
pub const MAX_NEWS_ITEMS: usize = 10;

/// Child nodes making up one filing under a committee `<dt>`.
pub const FILING_BLOCK_WIDTH: usize = 6;
