use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub press_root: String,
    pub filings_url: String,
    pub feed_path: PathBuf,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            press_root: crate::PRESS_ROOT.to_string(),
            filings_url: crate::FILINGS_URL.to_string(),
            feed_path: PathBuf::from(crate::FEED_FILE),
            timeout: Duration::from_secs(30),
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ScraperConfig {
    /// Directory the year's press releases are linked relative to.
    pub fn press_base_url(&self, year: i32) -> String {
        format!("{}/press{}/", self.press_root.trim_end_matches('/'), year)
    }

    pub fn press_page_url(&self, year: i32) -> String {
        format!("{}{}NewsReleases.shtml", self.press_base_url(year), year)
    }
}
