//! Bookmark search
//!
//! Filtering uses a subsequence fuzzy match, while highlighting marks only
//! literal substring occurrences of the query. A bookmark can therefore
//! match a query and still render without a highlighted span.

use regex::RegexBuilder;

use crate::models::{Bookmark, SearchHistory};

/// Maximum number of remembered queries
pub const MAX_SEARCH_HISTORY: usize = 10;

/// Opening marker wrapped around highlighted text
pub const HIGHLIGHT_OPEN: &str = "<mark>";
/// Closing marker wrapped around highlighted text
pub const HIGHLIGHT_CLOSE: &str = "</mark>";

/// Case-insensitive subsequence match
///
/// Every character of `query` must appear in `text` in order, not
/// necessarily next to each other. An empty query matches everything.
pub fn fuzzy_match(text: &str, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    let text = text.to_lowercase();
    let mut remaining = text.chars();
    query
        .to_lowercase()
        .chars()
        .all(|wanted| remaining.any(|c| c == wanted))
}

/// Bookmarks whose title, url or any tag fuzzy-matches the query
///
/// A blank query returns every bookmark.
pub fn search_bookmarks<'a, I>(bookmarks: I, query: &str) -> Vec<&'a Bookmark>
where
    I: IntoIterator<Item = &'a Bookmark>,
{
    if query.trim().is_empty() {
        return bookmarks.into_iter().collect();
    }

    bookmarks
        .into_iter()
        .filter(|b| matches_bookmark(b, query))
        .collect()
}

fn matches_bookmark(bookmark: &Bookmark, query: &str) -> bool {
    fuzzy_match(&bookmark.title, query)
        || fuzzy_match(&bookmark.url, query)
        || bookmark.tags.iter().any(|tag| fuzzy_match(tag, query))
}

/// Escape `& < > " '` as HTML entities
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render `text` as HTML with literal query occurrences highlighted
///
/// The text is escaped first, then every case-insensitive occurrence of
/// the raw query is wrapped in `<mark>`. The query is matched against the
/// escaped text, so a query like `&` also hits the `&` of an entity.
pub fn highlight_match(text: &str, query: &str) -> String {
    let escaped = escape_html(text);
    if query.trim().is_empty() {
        return escaped;
    }

    match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => pattern
            .replace_all(&escaped, format!("{}$0{}", HIGHLIGHT_OPEN, HIGHLIGHT_CLOSE).as_str())
            .into_owned(),
        Err(_) => escaped,
    }
}

/// Record a query at the front of the history
///
/// The query is trimmed; blank queries are ignored. An identical earlier
/// entry is moved to the front rather than duplicated, and the history is
/// capped at [`MAX_SEARCH_HISTORY`]. Returns false when nothing changed.
pub fn push_search_history(history: &mut Vec<SearchHistory>, query: &str, timestamp: i64) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return false;
    }

    history.retain(|entry| entry.query != query);
    history.insert(
        0,
        SearchHistory {
            query: query.to_string(),
            timestamp,
        },
    );
    history.truncate(MAX_SEARCH_HISTORY);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmark(title: &str, url: &str, tags: &[&str]) -> Bookmark {
        Bookmark {
            id: title.to_lowercase(),
            title: title.to_string(),
            url: url.to_string(),
            group_id: "default".to_string(),
            created_at: 0,
            updated_at: None,
            order: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            is_read: false,
            notes: None,
        }
    }

    #[test]
    fn test_fuzzy_match_subsequence() {
        assert!(fuzzy_match("hello world", "hw"));
        assert!(fuzzy_match("Hello World", "HWD"));
        assert!(fuzzy_match("anything", ""));
        // Order matters
        assert!(!fuzzy_match("hello", "oh"));
        assert!(!fuzzy_match("abc", "abcd"));
    }

    #[test]
    fn test_fuzzy_match_repeated_chars() {
        assert!(fuzzy_match("banana", "nn"));
        assert!(!fuzzy_match("ban", "nn"));
    }

    #[test]
    fn test_search_matches_title_url_or_tag() {
        let bookmarks = vec![
            bookmark("Rust Book", "https://doc.rust-lang.org/book", &[]),
            bookmark("News", "https://news.ycombinator.com", &["tech"]),
            bookmark("Recipes", "https://food.example", &["cooking"]),
        ];

        let by_title = search_bookmarks(&bookmarks, "rstbk");
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].title, "Rust Book");

        let by_url = search_bookmarks(&bookmarks, "ycomb");
        assert_eq!(by_url[0].title, "News");

        let by_tag = search_bookmarks(&bookmarks, "ckng");
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].title, "Recipes");
    }

    #[test]
    fn test_blank_query_returns_everything() {
        let bookmarks = vec![bookmark("A", "https://a", &[]), bookmark("B", "https://b", &[])];
        assert_eq!(search_bookmarks(&bookmarks, "   ").len(), 2);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_highlight_literal_case_insensitive() {
        assert_eq!(
            highlight_match("Rust and rust", "RUST"),
            "<mark>Rust</mark> and <mark>rust</mark>"
        );
    }

    #[test]
    fn test_highlight_escapes_before_marking() {
        assert_eq!(
            highlight_match("<b>bold</b>", "bold"),
            "&lt;b&gt;<mark>bold</mark>&lt;/b&gt;"
        );
    }

    #[test]
    fn test_highlight_regex_characters_are_literal() {
        assert_eq!(highlight_match("a.b axb", "a.b"), "<mark>a.b</mark> axb");
    }

    #[test]
    fn test_fuzzy_hit_without_highlight() {
        // Subsequence match, but not a contiguous substring
        assert!(fuzzy_match("hello world", "hw"));
        assert_eq!(highlight_match("hello world", "hw"), "hello world");
    }

    #[test]
    fn test_highlight_blank_query_only_escapes() {
        assert_eq!(highlight_match("a < b", " "), "a &lt; b");
    }

    #[test]
    fn test_history_moves_repeat_to_front() {
        let mut history = Vec::new();
        push_search_history(&mut history, "x", 1);
        push_search_history(&mut history, "y", 2);
        push_search_history(&mut history, "x", 3);

        let queries: Vec<&str> = history.iter().map(|h| h.query.as_str()).collect();
        assert_eq!(queries, vec!["x", "y"]);
        assert_eq!(history[0].timestamp, 3);
    }

    #[test]
    fn test_history_is_capped() {
        let mut history = Vec::new();
        for i in 0..11 {
            push_search_history(&mut history, &format!("q{}", i), i);
        }

        assert_eq!(history.len(), MAX_SEARCH_HISTORY);
        assert_eq!(history[0].query, "q10");
        assert!(history.iter().all(|h| h.query != "q0"));
    }

    #[test]
    fn test_history_ignores_blank_and_trims() {
        let mut history = Vec::new();
        assert!(!push_search_history(&mut history, "  ", 1));
        assert!(history.is_empty());

        push_search_history(&mut history, " rust ", 2);
        push_search_history(&mut history, "rust", 3);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].query, "rust");
    }
}
