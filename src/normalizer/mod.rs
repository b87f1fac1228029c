//! Feed parsing and normalization.
//!
//! Converts RSS 0.9x/1.0/2.0, Atom, and JSON Feed bodies into the crate's
//! [`Item`] model. Items keep the feed's natural order (newest first for
//! well-behaved feeds); the poll cycle reverses them for delivery.

use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{Result, TidingsError};
use crate::domain::Item;

#[derive(Debug, Clone)]
pub struct FeedMeta {
    pub title: Option<String>,
}

#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, body: &[u8]) -> Result<(FeedMeta, Vec<Item>)> {
        let feed = parser::parse(body).map_err(|e| TidingsError::FeedParse(e.to_string()))?;

        let meta = FeedMeta {
            title: feed
                .title
                .map(|t| decode_html_entities(&t.content).to_string()),
        };

        let items: Vec<Item> = feed
            .entries
            .into_iter()
            .map(|entry| Item {
                title: entry
                    .title
                    .map(|t| decode_html_entities(&t.content).to_string()),
                link: entry.links.first().map(|l| l.href.clone()),
                content: entry
                    .content
                    .and_then(|c| c.body)
                    .map(|b| decode_html_entities(&b).to_string())
                    .or_else(|| entry.summary.map(|s| decode_html_entities(&s.content).to_string())),
                categories: entry
                    .categories
                    .into_iter()
                    .map(|c| c.label.unwrap_or(c.term))
                    .collect(),
            })
            .collect();

        Ok((meta, items))
    }
}
