use crate::error::ValidationError;

/// Derive a URL-safe product id from a title.
///
/// Lowercases the title, keeps ASCII letters and digits, and collapses every
/// other run of characters into a single `-`.
pub fn slugify_id(title: &str) -> Result<String, ValidationError> {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }
    if slug.is_empty() {
        return Err(ValidationError::EmptySlug);
    }
    Ok(slug)
}
