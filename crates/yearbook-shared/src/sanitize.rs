//! HTML escaping for untrusted text. No markup is ever let through.

/// Escape the five HTML-significant characters `& < > " '`.
pub fn escape_html(input: &str) -> String {
    html_escape::encode_quoted_attribute(input).into_owned()
}

/// Text-node serialisation: what a browser emits after assigning `textContent`
/// and reading `innerHTML` back. Only `&`, `<` and `>` are escaped; quotes are
/// safe in element content.
pub fn sanitize_text(input: &str) -> String {
    html_escape::encode_text(input).into_owned()
}

/// Trim tags, drop empties and case-insensitive duplicates, keep order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if tag.is_empty() {
            continue;
        }
        if seen.insert(tag.to_lowercase()) {
            out.push(tag.to_string());
        }
    }
    out
}
