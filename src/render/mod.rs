//! Notification body rendering: category hashtags and HTML message layout.
//!
//! Pure and stateless. Messages use the notification channel's HTML mode, so
//! every interpolated value is escaped here.

use std::collections::BTreeSet;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::domain::Item;

/// Turn one category name into a `#hashtag`.
///
/// Remaps are literal substring rewrites applied first (so names like `c++`
/// can survive the character mapping). Then per character: dash-like
/// characters and spaces become single underscores (runs collapse),
/// `!?()'"«»` are dropped, `&` and `+` become underscores, `#` becomes
/// `sharp`, `.` becomes `dot`, everything else is lowercased.
pub fn hashtag(category: &str, remaps: &[(String, String)]) -> String {
    let mut category = category.to_string();
    for (from, to) in remaps {
        category = category.replace(from.as_str(), to);
    }

    let mut tag = String::from("#");
    for c in category.chars() {
        match c {
            '\u{2012}'..='\u{2015}' | '\u{2E3A}' | '\u{2E3B}' | '-' | ' ' | '&' | '+' => {
                if !tag.ends_with('_') {
                    tag.push('_');
                }
            }
            '!' | '?' | '(' | ')' | '\'' | '"' | '«' | '»' => {}
            '#' => tag.push_str("sharp"),
            '.' => tag.push_str("dot"),
            _ => tag.extend(c.to_lowercase()),
        }
    }
    tag
}

/// Render an item's categories as a deduplicated, sorted hashtag line.
pub fn tags_line(categories: &[String], remaps: &[(String, String)]) -> String {
    let tags: BTreeSet<String> = categories.iter().map(|c| hashtag(c, remaps)).collect();
    tags.into_iter().collect::<Vec<_>>().join(" ")
}

/// Render the full notification body for one item.
pub fn message(feed_title: &str, item: &Item, remaps: &[(String, String)]) -> String {
    let title = item.title.as_deref().unwrap_or("");
    let link = item.link.as_deref().unwrap_or("");
    format!(
        "[{}]\n<b>{}</b>\n{}\n\n<a href=\"{}\">Read</a>",
        encode_text(feed_title),
        encode_text(title),
        encode_text(&tags_line(&item.categories, remaps)),
        encode_double_quoted_attribute(link),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feed::default_tag_remaps;

    fn no_remaps() -> Vec<(String, String)> {
        Vec::new()
    }

    #[test]
    fn test_hashtag_lowercases() {
        assert_eq!(hashtag("Rust", &no_remaps()), "#rust");
    }

    #[test]
    fn test_hashtag_spaces_and_dashes_collapse() {
        assert_eq!(hashtag("open - source", &no_remaps()), "#open_source");
        assert_eq!(hashtag("foo\u{2014}bar", &no_remaps()), "#foo_bar");
    }

    #[test]
    fn test_hashtag_punctuation_dropped() {
        assert_eq!(hashtag("really?!", &no_remaps()), "#really");
        assert_eq!(hashtag("\"quoted\" («x»)", &no_remaps()), "#quoted_x");
    }

    #[test]
    fn test_hashtag_special_characters() {
        assert_eq!(hashtag("C#", &no_remaps()), "#csharp");
        assert_eq!(hashtag("node.js", &no_remaps()), "#nodedotjs");
        assert_eq!(hashtag("tips & tricks", &no_remaps()), "#tips_tricks");
    }

    #[test]
    fn test_hashtag_default_remaps() {
        let remaps = default_tag_remaps();
        assert_eq!(hashtag("*nix", &remaps), "#unix");
        assert_eq!(hashtag("c++", &remaps), "#cpp");
    }

    #[test]
    fn test_tags_line_dedupes_and_sorts() {
        let categories = vec!["Rust".to_string(), "zig".to_string(), "rust".to_string()];
        assert_eq!(tags_line(&categories, &no_remaps()), "#rust #zig");
    }

    #[test]
    fn test_message_layout_and_escaping() {
        let item = Item {
            title: Some("Ownership & Borrowing".into()),
            link: Some("https://example.com/post?a=1&b=2".into()),
            content: None,
            categories: vec!["Rust".into()],
        };
        let body = message("My <Blog>", &item, &no_remaps());
        assert_eq!(
            body,
            "[My &lt;Blog&gt;]\n<b>Ownership &amp; Borrowing</b>\n#rust\n\n\
             <a href=\"https://example.com/post?a=1&amp;b=2\">Read</a>"
        );
    }

    #[test]
    fn test_message_empty_fields() {
        let body = message("Feed", &Item::default(), &no_remaps());
        assert_eq!(body, "[Feed]\n<b></b>\n\n\n<a href=\"\">Read</a>");
    }
}
