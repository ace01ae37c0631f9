/// Trim entries, drop empty ones and keep the first occurrence of duplicates.
pub fn normalize_list<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let value = value.as_ref().trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

/// Split comma-separated form input into a clean list.
pub fn parse_list(input: &str) -> Vec<String> {
    normalize_list(input.split(','))
}
