//! Search command handlers

use anyhow::{Context, Result};

use later_core::search::{highlight_match, search_bookmarks};
use later_core::Store;

use crate::output::{Output, SearchHit};

/// Fuzzy-search bookmarks and remember the query
pub fn search(store: &mut Store, query: String, output: &Output) -> Result<()> {
    let doc = store.get()?;
    let hits: Vec<SearchHit<'_>> = search_bookmarks(&doc.bookmarks, &query)
        .into_iter()
        .map(|bookmark| SearchHit {
            bookmark,
            highlighted_title: highlight_match(&bookmark.title, &query),
            highlighted_url: highlight_match(&bookmark.url, &query),
        })
        .collect();

    store
        .save_search(&query)
        .context("Failed to save search history")?;

    output.print_search_hits(&hits);
    Ok(())
}

/// Show or clear recent searches
pub fn history(store: &mut Store, clear: bool, output: &Output) -> Result<()> {
    if clear {
        store
            .clear_search_history()
            .context("Failed to clear search history")?;
        output.success("Search history cleared");
        return Ok(());
    }

    output.print_history(&store.search_history()?);
    Ok(())
}
