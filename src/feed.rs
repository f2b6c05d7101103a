use std::fmt::Write as _;

use crate::types::NewsItem;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("XML write failed: {0}")]
    XmlError(#[from] quick_xml::Error),
    #[error("XML write failed: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Feed is not valid UTF-8: {0}")]
    EncodingError(#[from] std::string::FromUtf8Error),
}

/// Channel header of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
}

impl Channel {
    pub fn fec() -> Self {
        Self {
            title: "FEC News".to_string(),
            link: "http://www.fec.gov/".to_string(),
            description: "Press releases and announcements".to_string(),
            language: "en-us".to_string(),
        }
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::fec()
    }
}

// The feed declares ISO-8859-1, so anything outside ASCII goes out as a
// character reference. Control characters are not allowed in XML 1.0.
fn escape_ascii(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut dropped = 0;
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' | ' '..='~' => escaped.push(c),
            c if c.is_ascii() => dropped += 1,
            c => {
                let _ = write!(escaped, "&#{};", c as u32);
            }
        }
    }
    if dropped > 0 {
        log::debug!("Dropped {} control character(s) from '{}'", dropped, text.escape_debug());
    }
    escaped
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), FeedError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::from_escaped(escape_ascii(text))))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Renders an RSS 0.91 style document.
///
/// Items carry `date`, `title` and `link`, in that order. With no items the
/// channel header is followed directly by the closing tags. ASCII control
/// characters other than tab, newline and carriage return cannot appear in
/// XML 1.0 and are removed from the text.
pub fn render_feed(channel: &Channel, items: &[NewsItem]) -> Result<String, FeedError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("ISO-8859-1"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "0.91"));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;
    write_text_element(&mut writer, "title", &channel.title)?;
    write_text_element(&mut writer, "link", &channel.link)?;
    write_text_element(&mut writer, "description", &channel.description)?;
    write_text_element(&mut writer, "language", &channel.language)?;

    for item in items {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        write_text_element(&mut writer, "date", &item.date)?;
        write_text_element(&mut writer, "title", &item.title)?;
        write_text_element(&mut writer, "link", &item.link)?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let mut feed = String::from_utf8(writer.into_inner())?;
    feed.push('\n');
    Ok(feed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use quick_xml::Reader;

    #[derive(Debug, Default)]
    struct ParsedFeed {
        channel: Vec<(String, String)>,
        items: Vec<Vec<(String, String)>>,
    }

    fn parse_feed(xml: &str) -> ParsedFeed {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut parsed = ParsedFeed::default();
        let mut current_item: Option<Vec<(String, String)>> = None;
        let mut current_tag = String::new();

        loop {
            match reader.read_event().expect("feed should be well-formed") {
                Event::Start(e) => {
                    let name = String::from_utf8(e.name().as_ref().to_vec()).unwrap();
                    if name == "item" {
                        current_item = Some(Vec::new());
                    }
                    current_tag = name;
                }
                Event::Text(t) => {
                    let text = t.unescape().expect("text should unescape").into_owned();
                    let field = (current_tag.clone(), text);
                    match current_item.as_mut() {
                        Some(item) => item.push(field),
                        None => parsed.channel.push(field),
                    }
                }
                Event::End(e) if e.name().as_ref() == b"item" => {
                    parsed.items.push(current_item.take().expect("unbalanced item"));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        parsed
    }

    fn item(n: usize) -> NewsItem {
        NewsItem {
            date: format!("January {}, 2024", n),
            title: format!("Release <{}> & \"notes\"", n),
            link: format!("http://www.fec.gov/press/press2024/news/r{}.shtml?a=1&b=2", n),
        }
    }

    #[test]
    fn test_render_empty_feed() {
        let feed = render_feed(&Channel::fec(), &[]).expect("Failed to render feed");

        assert!(feed.starts_with("<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>"));
        assert!(!feed.contains("<item>"));

        let header_end = feed.find("</language>").unwrap() + "</language>".len();
        let footer = feed[header_end..].split_whitespace().collect::<String>();
        assert_eq!(footer, "</channel></rss>");

        let parsed = parse_feed(&feed);
        assert!(parsed.items.is_empty());
        assert_eq!(
            parsed.channel,
            vec![
                ("title".to_string(), "FEC News".to_string()),
                ("link".to_string(), "http://www.fec.gov/".to_string()),
                (
                    "description".to_string(),
                    "Press releases and announcements".to_string()
                ),
                ("language".to_string(), "en-us".to_string()),
            ]
        );
    }

    #[test]
    fn test_render_feed_round_trip() {
        for n in [1, 3, 10] {
            let items: Vec<NewsItem> = (1..=n).map(item).collect();
            let feed = render_feed(&Channel::fec(), &items).expect("Failed to render feed");

            let parsed = parse_feed(&feed);
            assert_eq!(parsed.items.len(), n);

            for (parsed_item, expected) in parsed.items.iter().zip(&items) {
                assert_eq!(
                    parsed_item,
                    &vec![
                        ("date".to_string(), expected.date.clone()),
                        ("title".to_string(), expected.title.clone()),
                        ("link".to_string(), expected.link.clone()),
                    ]
                );
            }
        }
    }

    #[test]
    fn test_render_feed_is_ascii() {
        let items = vec![NewsItem {
            date: "June 1, 2024".to_string(),
            title: "Comisión Electoral \u{2013} résumé".to_string(),
            link: "http://www.fec.gov/press/press2024/es.shtml".to_string(),
        }];

        let feed = render_feed(&Channel::fec(), &items).unwrap();

        assert!(feed.is_ascii());
        assert!(feed.contains("Comisi&#243;n Electoral &#8211; r&#233;sum&#233;"));

        let parsed = parse_feed(&feed);
        assert_eq!(parsed.items[0][1].1, "Comisión Electoral \u{2013} résumé");
    }

    #[test]
    fn test_render_feed_removes_control_characters() {
        let items = vec![NewsItem {
            date: "May\u{0} 2, 2024".to_string(),
            title: "Bell\u{7} and\u{1b} escape".to_string(),
            link: "http://www.fec.gov/press/press2024/bell.shtml".to_string(),
        }];

        let feed = render_feed(&Channel::fec(), &items).unwrap();

        let parsed = parse_feed(&feed);
        assert_eq!(parsed.items[0][0].1, "May 2, 2024");
        assert_eq!(parsed.items[0][1].1, "Bell and escape");
    }

    #[test]
    fn test_escape_ascii_drops_control_characters() {
        assert_eq!(escape_ascii("a\u{7}b\tc"), "ab\tc");
        assert_eq!(escape_ascii("<a href='x'>"), "&lt;a href=&apos;x&apos;&gt;");
    }

    // Text that survives a trimming reader unchanged: no edge whitespace, no
    // control characters.
    fn arb_text() -> impl Strategy<Value = String> {
        "[!-~é–ü]([ -~é–ü]{0,38}[!-~é–ü])?"
    }

    fn arb_news_item() -> impl Strategy<Value = NewsItem> {
        (arb_text(), arb_text(), arb_text())
            .prop_map(|(date, title, link)| NewsItem { date, title, link })
    }

    proptest! {
        #[test]
        fn test_render_feed_round_trips_generated_items(
            items in prop::collection::vec(arb_news_item(), 0..=10)
        ) {
            let feed = render_feed(&Channel::fec(), &items).expect("Failed to render feed");
            prop_assert!(feed.is_ascii());

            let parsed = parse_feed(&feed);
            prop_assert_eq!(parsed.items.len(), items.len());

            for (parsed_item, expected) in parsed.items.iter().zip(&items) {
                let expected_fields = vec![
                    ("date".to_string(), expected.date.clone()),
                    ("title".to_string(), expected.title.clone()),
                    ("link".to_string(), expected.link.clone()),
                ];
                prop_assert_eq!(parsed_item, &expected_fields);
            }
        }
    }
}
