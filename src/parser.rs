use std::sync::LazyLock;

use crate::types::{FilingBlock, FilingRecord, NewsItem};
use crate::utils::resolve_link;
use crate::{FILING_BLOCK_WIDTH, MAX_NEWS_ITEMS};

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to parse URL: {0}")]
    UrlParseError(String),
    #[error("Unexpected structure in committee {committee}: {detail}")]
    StructuralMismatch { committee: String, detail: String },
    #[error("A filing block needs exactly {expected} nodes, found {found}")]
    InvalidBlock { expected: usize, found: usize },
}

// Row on the press release index: date cell, then a cell holding the link.
static RE_NEWS_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)valign=.top.>(.*?\d\d\d\d).?</td>.*?<td.valign=.top.>.*?<a href=.(.*?).>(.*?)</a>.*?</td>.*?</tr>",
    )
    .expect("invalid regex: news row")
});
static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid regex: whitespace"));

static DT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dt").expect("invalid selector: dt"));
static H4_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h4").expect("invalid selector: h4"));
static A_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("invalid selector: a"));

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Like `normalize_whitespace` but keeps a leading separator space.
fn collapse_whitespace(text: &str) -> String {
    RE_WHITESPACE.replace_all(text, " ").trim_end().to_string()
}

/// Strips tags and decodes entities in a captured markup snippet.
fn fragment_text(snippet: &str) -> String {
    let fragment = Html::parse_fragment(snippet);
    normalize_whitespace(&elem_text(fragment.root_element()))
}

/// Decodes a captured `href` the way a browser reads an attribute value, so
/// query strings such as `&section=` keep their ampersands.
fn attribute_text(value: &str) -> String {
    let quote = if value.contains('"') { '\'' } else { '"' };
    let fragment = Html::parse_fragment(&format!("<a href={quote}{value}{quote}></a>"));
    let href = fragment
        .select(&A_SELECTOR)
        .next()
        .and_then(|anchor| anchor.value().attr("href"))
        .unwrap_or(value)
        .trim()
        .to_string();
    href
}

fn preview(text: &str) -> String {
    const PREVIEW_CHARS: usize = 60;

    let text = normalize_whitespace(text);
    if text.chars().count() > PREVIEW_CHARS {
        format!("{}...", text.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        text
    }
}

/// Extracts up to [`MAX_NEWS_ITEMS`] press releases from the release index page.
///
/// Links are resolved against `base_url`. Rows whose link cannot be resolved are
/// skipped, but still count towards the cap.
pub fn parse_news_releases(page: &str, base_url: &str) -> Vec<NewsItem> {
    let page = normalize_whitespace(page);

    let items: Vec<NewsItem> = RE_NEWS_ROW
        .captures_iter(&page)
        .take(MAX_NEWS_ITEMS)
        .filter_map(|caps| {
            let date = fragment_text(&caps[1]);
            let href = attribute_text(&caps[2]);
            let title = fragment_text(&caps[3]);

            match resolve_link(base_url, &href) {
                Ok(link) => Some(NewsItem { date, title, link }),
                Err(e) => {
                    log::warn!("Skipping release '{}': {}", title, e);
                    None
                }
            }
        })
        .collect();

    log::debug!("Extracted {} press releases", items.len());
    items
}

/// Names the six positional nodes of one filing. The title is the last of them.
pub fn parse_filing_block(nodes: &[String]) -> Result<FilingBlock, ParseError> {
    let [_, _, _, _, _, title] = nodes else {
        return Err(ParseError::InvalidBlock {
            expected: FILING_BLOCK_WIDTH,
            found: nodes.len(),
        });
    };

    Ok(FilingBlock {
        title: title.clone(),
    })
}

fn parse_committee(
    position: usize,
    committee: ElementRef,
) -> Result<Vec<FilingRecord>, ParseError> {
    let name = committee
        .select(&H4_SELECTOR)
        .next()
        .and_then(|heading| heading.select(&A_SELECTOR).next())
        .map(|anchor| normalize_whitespace(&elem_text(anchor)))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ParseError::StructuralMismatch {
            committee: format!("#{} ('{}')", position, preview(&elem_text(committee))),
            detail: "expected a heading with a committee link".to_string(),
        })?;

    let nodes: Vec<String> = committee
        .children()
        .map(|child| match child.value() {
            Node::Text(text) => collapse_whitespace(&text.text),
            Node::Comment(comment) => collapse_whitespace(&comment.comment),
            _ => ElementRef::wrap(child)
                .map(|element| collapse_whitespace(&elem_text(element)))
                .unwrap_or_default(),
        })
        .collect();

    if nodes.len() % FILING_BLOCK_WIDTH != 0 {
        return Err(ParseError::StructuralMismatch {
            committee: format!("#{} ({})", position, name),
            detail: format!(
                "{} child nodes is not a multiple of {}",
                nodes.len(),
                FILING_BLOCK_WIDTH
            ),
        });
    }

    nodes
        .chunks_exact(FILING_BLOCK_WIDTH)
        .map(|nodes| {
            parse_filing_block(nodes).map(|block| FilingRecord::new(name.as_str(), block))
        })
        .collect()
}

/// Extracts every filing listed on an electronic filings results page.
///
/// Each `<dt>` is a committee; its children are consumed six at a time, one
/// filing per group. Any committee that does not fit that shape fails the
/// whole page.
pub fn parse_filings(html: &str) -> Result<Vec<FilingRecord>, ParseError> {
    let document = Html::parse_document(html);
    let mut filings = Vec::new();

    for (i, committee) in document.select(&DT_SELECTOR).enumerate() {
        filings.extend(parse_committee(i + 1, committee)?);
    }

    log::debug!("Extracted {} filings", filings.len());
    Ok(filings)
}
