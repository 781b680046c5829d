//! Asset path resolution against the configured base path.

/// Join a file onto the base path.
///
/// A base of `/` (or empty) yields a root-relative path. Otherwise duplicate
/// slashes collapse and the result never ends in `/`. Absolute base URLs keep
/// their scheme and host.
pub fn join_base_path(base: &str, file: &str) -> String {
    let base = base.trim();
    let file = file.trim();

    if base.is_empty() || base == "/" {
        return format!("/{}", file.trim_start_matches('/'));
    }

    let (origin, base_path) = split_origin(base);
    let (file_path, query) = split_query(file);

    let segments: Vec<&str> = base_path
        .split('/')
        .chain(file_path.split('/'))
        .filter(|s| !s.is_empty())
        .collect();

    let mut joined = format!("{}/{}", origin, segments.join("/"));
    if joined.len() > 1 && joined.ends_with('/') {
        joined.pop();
    }
    if let Some(query) = query {
        joined.push('?');
        joined.push_str(query);
    }
    joined
}

/// The stylesheet path paired with a script bundle.
///
/// Swaps the basename's extension for `.css` (appending it when there is
/// none) and keeps any query string.
pub fn stylesheet_for_script(script: &str) -> String {
    let (path, query) = split_query(script);
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    let stem = match path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &path[..name_start + dot],
        _ => path,
    };

    match query {
        Some(query) => format!("{}.css?{}", stem, query),
        None => format!("{}.css", stem),
    }
}

/// Resolve a stylesheet href.
///
/// Absolute URLs (`https://…`, `//host/…`) and root-relative paths pass
/// through unchanged; relative hrefs are joined onto the base path.
pub fn resolve_href(base: &str, href: &str) -> String {
    if is_absolute_url(href) || href.starts_with('/') {
        href.to_string()
    } else {
        join_base_path(base, href)
    }
}

fn is_absolute_url(href: &str) -> bool {
    href.starts_with("//") || href.contains("://")
}

fn split_origin(base: &str) -> (&str, &str) {
    if let Some(scheme_end) = base.find("://") {
        let host_start = scheme_end + 3;
        match base[host_start..].find('/') {
            Some(slash) => base.split_at(host_start + slash),
            None => (base, ""),
        }
    } else {
        ("", base)
    }
}

fn split_query(path: &str) -> (&str, Option<&str>) {
    match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    }
}
