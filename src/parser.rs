use crate::entity::{Episode, Feed};
use crate::FeedResult;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

// which element's text we are currently inside
#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    PubDate,
    Guid,
}

/// Parses feed bytes into a `Feed`. Minimal structure checks only: the
/// channel title is the first `title` outside any `item`, episodes are the
/// `item` elements in document order. Malformed xml is a fatal error.
pub fn parse_feed(bytes: &[u8]) -> FeedResult {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut feed = Feed::default();
    let mut in_item = false;
    let mut current = Episode::default();
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event(&mut buf)? {
            Event::Start(ref e) => match e.name() {
                b"item" => {
                    in_item = true;
                    current = Episode::default();
                }
                b"title" => field = Some(Field::Title),
                b"pubDate" if in_item => field = Some(Field::PubDate),
                b"guid" if in_item => field = Some(Field::Guid),
                b"enclosure" if in_item => {
                    current.audio_url = enclosure_url(e, &reader);
                }
                _ => field = None,
            },
            Event::Empty(ref e) => {
                if in_item && e.name() == b"enclosure" {
                    current.audio_url = enclosure_url(e, &reader);
                }
            }
            Event::Text(ref t) => {
                let text = t.unescape_and_decode(&reader)?;
                store(field, in_item, &text, &mut feed, &mut current);
            }
            Event::CData(ref t) => {
                let text = t.unescape_and_decode(&reader)?;
                store(field, in_item, &text, &mut feed, &mut current);
            }
            Event::End(ref e) => {
                if e.name() == b"item" {
                    in_item = false;
                    feed.episodes.push(std::mem::take(&mut current));
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(feed)
}

fn store(field: Option<Field>, in_item: bool, text: &str, feed: &mut Feed, current: &mut Episode) {
    match field {
        Some(Field::Title) if in_item => current.title = Some(text.to_string()),
        Some(Field::Title) => {
            if feed.title.is_none() {
                feed.title = Some(text.to_string());
            }
        }
        Some(Field::PubDate) => current.pub_date = Some(text.to_string()),
        Some(Field::Guid) => current.guid = Some(text.to_string()),
        None => {}
    }
}

fn enclosure_url<B: BufRead>(e: &BytesStart, reader: &Reader<B>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key == b"url")
        .and_then(|a| a.unescape_and_decode_value(reader).ok())
        .filter(|url| !url.is_empty())
}
