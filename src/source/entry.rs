//! The data types shared by the fetch client, the feed store and the UI.
//!
//! A [`FeedEntry`] is a tagged variant over every kind of content the
//! dashboard can show.  There is only one kind today ([`Post`]) but the
//! render and click paths dispatch on the tag, so adding a source means
//! adding a variant rather than touching the loops.
//!
//! ## For contributors
//!
//! To add a new kind of entry:
//!
//! 1. Add a variant to [`FeedEntry`] carrying the source's own struct.
//! 2. Extend each accessor `match` on `FeedEntry` below; the compiler will
//!    point at every one.
//! 3. Give the variant its colours in `entry_style` in `ui.rs`.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Host used to build canonical permalinks.
pub const PERMALINK_HOST: &str = "www.twitter.com";

/// A post author, joined into each post from the response's user expansion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    /// The `@handle`, without the `@`.
    pub username: String,
}

/// A single social-media post with its author already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: Author,
    /// Canonical permalink, see [`permalink`].
    pub url: String,
}

impl Post {
    pub fn new(id: String, text: String, created_at: DateTime<Utc>, author: Author) -> Self {
        let url = permalink(&author.username, &id);
        Self {
            id,
            text,
            created_at,
            author,
            url,
        }
    }
}

/// One displayable unit in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEntry {
    Twitter(Post),
}

impl FeedEntry {
    /// Short label rendered in brackets at the start of each row.
    pub fn source_tag(&self) -> &'static str {
        match self {
            FeedEntry::Twitter(_) => "Twitter",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            FeedEntry::Twitter(post) => &post.id,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            FeedEntry::Twitter(post) => &post.url,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            FeedEntry::Twitter(post) => post.created_at,
        }
    }

    pub fn author_handle(&self) -> &str {
        match self {
            FeedEntry::Twitter(post) => &post.author.username,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            FeedEntry::Twitter(post) => &post.text,
        }
    }

    /// Return the entry with every line break in its body collapsed into a
    /// single space.
    pub fn normalized(self) -> Self {
        match self {
            FeedEntry::Twitter(mut post) => {
                post.text = collapse_line_breaks(&post.text);
                FeedEntry::Twitter(post)
            }
        }
    }
}

/// `https://<host>/<handle>/status/<id>`
pub fn permalink(handle: &str, id: &str) -> String {
    format!("https://{PERMALINK_HOST}/{handle}/status/{id}")
}

/// Replace each line break (`\r\n`, `\n` or `\r`) with one space.
pub fn collapse_line_breaks(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn author() -> Author {
        Author {
            id: "42".into(),
            name: "Ferris".into(),
            username: "ferris".into(),
        }
    }

    #[test]
    fn permalink_uses_handle_and_id() {
        assert_eq!(
            permalink("ferris", "1234"),
            "https://www.twitter.com/ferris/status/1234"
        );
    }

    #[test]
    fn new_post_derives_url() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let post = Post::new("99".into(), "hi".into(), ts, author());
        assert_eq!(post.url, "https://www.twitter.com/ferris/status/99");
    }

    #[test]
    fn accessors_dispatch_on_variant() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let entry = FeedEntry::Twitter(Post::new("7".into(), "body".into(), ts, author()));
        assert_eq!(entry.source_tag(), "Twitter");
        assert_eq!(entry.id(), "7");
        assert_eq!(entry.author_handle(), "ferris");
        assert_eq!(entry.text(), "body");
        assert_eq!(entry.created_at(), ts);
        assert!(entry.url().ends_with("/ferris/status/7"));
    }

    #[test]
    fn line_breaks_become_single_spaces() {
        assert_eq!(collapse_line_breaks("a\nb"), "a b");
        assert_eq!(collapse_line_breaks("a\r\nb"), "a b");
        assert_eq!(collapse_line_breaks("a\rb\n\nc"), "a b  c");
        assert_eq!(collapse_line_breaks("no breaks"), "no breaks");
    }

    #[test]
    fn normalized_rewrites_body_only() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let entry = FeedEntry::Twitter(Post::new("1".into(), "line\nbreak".into(), ts, author()))
            .normalized();
        assert_eq!(entry.text(), "line break");
        assert_eq!(entry.id(), "1");
    }
}
