//! Free-text narrowing applied on top of the structured filters.

use crate::models::Product;

/// Queries shorter than this are ignored rather than rejected, so typing
/// into the search box never blanks the listing prematurely.
pub const MIN_SEARCH_LEN: usize = 4;

/// Splits a raw search string into lowercase terms, or `None` when the
/// query is absent or still below the activation threshold.
pub fn active_terms(search: Option<&str>) -> Option<Vec<String>> {
    let raw = search?.trim();
    if raw.chars().count() < MIN_SEARCH_LEN {
        return None;
    }
    Some(
        raw.split_whitespace()
            .map(str::to_lowercase)
            .collect(),
    )
}

/// A product matches when every term matches somewhere. Terms are AND-ed;
/// each one may hit the name, the manufacturer or the article code.
pub fn product_matches(product: &Product, terms: &[String]) -> bool {
    terms.iter().all(|term| term_matches(product, term))
}

fn term_matches(product: &Product, term: &str) -> bool {
    let name = product.name.to_lowercase();
    if name.starts_with(term) {
        return true;
    }
    // Word-start matches inside the name. "7073" finds "Фільтр WL 7073".
    if name
        .split([' ', '/', '-'])
        .any(|token| !token.is_empty() && token.starts_with(term))
    {
        return true;
    }

    let manufacturer = product.manufacturer.to_lowercase();
    if manufacturer.starts_with(term)
        || manufacturer.split_whitespace().any(|t| t.starts_with(term))
    {
        return true;
    }

    product.code.to_lowercase().contains(term)
}
