//! Tag helpers shared by the snippet model and the store.

/// Strips a leading `#` and surrounding whitespace from a tag name
pub fn normalize_tag(name: &str) -> String {
    let trimmed = name.trim();
    trimmed.strip_prefix('#').unwrap_or(trimmed).trim().to_string()
}

/// Normalizes every tag, dropping blanks and repeated names while keeping order
pub fn normalize_tags<I, T>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut result: Vec<String> = Vec::new();
    for tag in tags {
        let clean = normalize_tag(&tag.into());
        if !clean.is_empty() && !result.contains(&clean) {
            result.push(clean);
        }
    }
    result
}

/// Brings a persisted tag list in line with an incoming one.
///
/// Tags missing from `incoming` are removed, tags only present in `incoming`
/// are appended in their incoming order. Tags present in both stay where they
/// are. Returns true if `persisted` changed.
pub fn reconcile_tags(persisted: &mut Vec<String>, incoming: &[String]) -> bool {
    let before = persisted.len();
    persisted.retain(|tag| incoming.contains(tag));
    let mut changed = persisted.len() != before;

    for tag in incoming {
        if !persisted.contains(tag) {
            persisted.push(tag.clone());
            changed = true;
        }
    }

    changed
}

/// Parses a comma separated tag list such as `"io, #net, fs"`
pub fn parse_tag_list(input: &str) -> Vec<String> {
    normalize_tags(input.split(','))
}
