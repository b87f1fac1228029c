//! Item fingerprints for deduplication.
//!
//! A fingerprint is a 64-bit FNV-1a digest of the item's normalized link,
//! optionally with the item content appended. Normalization strips the query
//! string and fragment, so a refetched item with new tracking parameters still
//! maps to the same fingerprint.

use std::hash::Hasher;

use fnv::FnvHasher;
use url::Url;

use crate::domain::{HashingOptions, Item};

/// Strip query string and fragment from a link, unless the feed opts out.
///
/// Links that fail URL parsing are hashed verbatim rather than dropped, so a
/// feed with odd links still deduplicates consistently.
pub fn normalize_link(link: &str, keep_query: bool) -> String {
    if keep_query {
        return link.to_string();
    }
    match Url::parse(link) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => link.to_string(),
    }
}

/// Compute an item's fingerprint per the owning feed's hashing options.
///
/// Deterministic across calls and across process restarts: the same normalized
/// link (and content, when enabled) always yields the same value.
pub fn fingerprint(item: &Item, opts: &HashingOptions) -> u64 {
    let mut hasher = FnvHasher::default();
    let link = item.link.as_deref().unwrap_or("");
    hasher.write(normalize_link(link, opts.keep_query).as_bytes());
    if opts.hash_content {
        if let Some(content) = &item.content {
            hasher.write(content.as_bytes());
        }
    }
    hasher.finish()
}
