use std::collections::BTreeMap;
use std::path::PathBuf;
use std::{fmt::Display, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid committee id '{0}'. Expected 'C' followed by eight digits, e.g. 'C00224691'")]
pub struct CommitteeIdError(String);

/// FEC committee "C-number".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitteeId(String);

impl CommitteeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CommitteeId {
    type Err = CommitteeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('C')
            .or_else(|| trimmed.strip_prefix('c'))
            .ok_or_else(|| CommitteeIdError(s.to_string()))?;

        if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(CommitteeIdError(s.to_string()));
        }

        Ok(CommitteeId(format!("C{digits}")))
    }
}

impl TryFrom<String> for CommitteeId {
    type Error = CommitteeIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CommitteeId> for String {
    fn from(id: CommitteeId) -> Self {
        id.0
    }
}

impl Display for CommitteeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the electronic filings form is asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingQuery {
    Date(NaiveDate),
    Committee(CommitteeId),
}

impl FilingQuery {
    pub fn params(&self) -> [(&'static str, String); 1] {
        match self {
            FilingQuery::Date(date) => [("date", date.format("%m/%d/%Y").to_string())],
            FilingQuery::Committee(id) => [("comid", id.to_string())],
        }
    }

    /// Form-urlencoded body for the filings request.
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params())
            .finish()
    }
}

impl Display for FilingQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilingQuery::Date(date) => write!(f, "filings on {}", date.format("%m/%d/%Y")),
            FilingQuery::Committee(id) => write!(f, "filings by committee {}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub date: String,
    pub title: String,
    pub link: String,
}

impl Display for NewsItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}\n   {}", self.date, self.title, self.link)
    }
}

/// The part of a filing's six positional nodes that carries meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingBlock {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRecord {
    pub committee_name: String,
    pub filing_title: String,
}

impl FilingRecord {
    pub fn new(committee_name: impl Into<String>, block: FilingBlock) -> Self {
        Self {
            committee_name: committee_name.into(),
            filing_title: block.title,
        }
    }

    /// Committee name and filing title, concatenated without a separator.
    pub fn description(&self) -> String {
        format!("{}{}", self.committee_name, self.filing_title)
    }
}

impl Display for FilingRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.committee_name, self.filing_title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingReport {
    pub query: FilingQuery,
    pub filings: Vec<FilingRecord>,
}

impl FilingReport {
    pub fn descriptions(&self) -> Vec<String> {
        self.filings.iter().map(FilingRecord::description).collect()
    }

    pub fn by_committee(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for filing in &self.filings {
            grouped
                .entry(filing.committee_name.clone())
                .or_default()
                .push(filing.filing_title.clone());
        }
        grouped
    }

    pub fn is_empty(&self) -> bool {
        self.filings.is_empty()
    }
}

impl Display for FilingReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} ({} found)", self.query, self.filings.len())?;
        for (i, filing) in self.filings.iter().enumerate() {
            writeln!(f, "{:>3}. {}", i + 1, filing)?;
        }
        Ok(())
    }
}

/// Result of a feed run. `Unchanged` leaves any previous feed file in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsOutcome {
    Written { path: PathBuf, items: usize },
    Unchanged { reason: String },
}
