use ammonia;

/// Clean authored text (quiz titles, question and option text) before it is stored.
///
/// Clients render these strings as HTML, so script tags and event-handler
/// attributes are stripped while harmless inline markup such as <b> survives.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitises and trims an optional field, collapsing blank input to `None`.
pub fn clean_optional(input: Option<&str>) -> Option<String> {
    input
        .map(|s| clean_html(s.trim()))
        .filter(|s| !s.is_empty())
}
