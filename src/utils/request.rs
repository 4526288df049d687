use url::form_urlencoded;

/// Decodes a raw query string into `(name, value)` pairs.
///
/// Pairs keep their original order and repeated names are not merged, so the
/// caller can tell `?expand=a&expand=b` apart from `?expand=a,b`. Values are
/// percent- and `+`-decoded but otherwise untouched (no trimming).
pub fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    match query {
        Some(query) if !query.is_empty() => form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        _ => Vec::new(),
    }
}
