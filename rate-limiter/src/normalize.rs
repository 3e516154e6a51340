/// Replace path segments that look like identifiers (purely numeric, or
/// length > 20) with the literal token `{id}`, so e.g. `/orders/42/items`
/// and `/orders/43/items` share a counter.
pub fn normalize_endpoint(path: &str) -> String {
    let looks_like_id = |segment: &str| -> bool {
        !segment.is_empty() && (segment.chars().all(|c| c.is_ascii_digit()) || segment.len() > 20)
    };

    path.split('/')
        .map(|segment| if looks_like_id(segment) { "{id}" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}
