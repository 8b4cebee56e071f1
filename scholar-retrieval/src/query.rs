/// Joins keyword phrases into one disjunctive arXiv query.
///
/// Phrases are trimmed and blank ones dropped; an empty result means there
/// is nothing to search for.
pub fn build_query(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|keyword| keyword.trim())
        .filter(|keyword| !keyword.is_empty())
        .collect::<Vec<_>>()
        .join(" OR ")
}
