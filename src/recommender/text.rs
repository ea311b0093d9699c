//! Encoder input for catalog items.
//!
//! Builds the text that gets embedded for every song:
//! 1. Title and artist
//! 2. Tags joined in their stored order
//! 3. Free-form description

use crate::catalog::CatalogItem;

/// Separator between tags in the embedded text
const TAG_SEPARATOR: &str = ", ";

/// Build the text embedded for a catalog item.
///
/// Pure function of the item fields: identical items always produce
/// identical text.
pub fn embeddable_text(item: &CatalogItem) -> String {
    let tags = item.tags.join(TAG_SEPARATOR);
    format!(
        "{} — {}. Tags: {}. {}",
        item.title, item.artist, tags, item.description
    )
    .trim()
    .to_string()
}
