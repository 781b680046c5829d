//! Path templates with parameter capture.
//!
//! Supported syntax:
//! - `static` segments compared verbatim (case-sensitive)
//! - `:name` binds one segment to `name`
//! - `:name?` binds one segment when present
//! - a trailing `*` binds the remaining path to `*`

use std::fmt;

use ssr_core::RouteParams;

/// Parameter name bound by a splat segment.
pub const SPLAT_PARAM: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param { name: String, optional: bool },
    Splat,
}

/// A parsed route path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template. Parsing never fails; a bare `:` is a static segment.
    pub fn parse(template: &str) -> Self {
        let segments = split_segments(template)
            .map(|segment| {
                if segment == SPLAT_PARAM {
                    return Segment::Splat;
                }
                match segment.strip_prefix(':') {
                    Some(name) => {
                        let (name, optional) = match name.strip_suffix('?') {
                            Some(name) => (name, true),
                            None => (name, false),
                        };
                        if name.is_empty() {
                            Segment::Static(segment.to_string())
                        } else {
                            Segment::Param {
                                name: name.to_string(),
                                optional,
                            }
                        }
                    }
                    None => Segment::Static(segment.to_string()),
                }
            })
            .collect();

        Self {
            raw: template.to_string(),
            segments,
        }
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the template has no parameters.
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Static(_)))
    }

    /// Names bound by this template, in order.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param { name, .. } => Some(name.as_str()),
                Segment::Splat => Some(SPLAT_PARAM),
                Segment::Static(_) => None,
            })
            .collect()
    }

    /// Match a concrete path, returning the captured parameters.
    ///
    /// With `exact`, every path segment must be consumed; otherwise the
    /// template may match a segment-aligned prefix of the path.
    pub fn matches(&self, path: &str, exact: bool) -> Option<RouteParams> {
        let path: Vec<&str> = split_segments(path).collect();
        let mut params = RouteParams::new();
        match_segments(&self.segments, &path, exact, &mut params).then_some(params)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn match_segments(
    template: &[Segment],
    path: &[&str],
    exact: bool,
    params: &mut RouteParams,
) -> bool {
    let Some((first, rest)) = template.split_first() else {
        return !exact || path.is_empty();
    };

    match first {
        Segment::Static(expected) => match path.split_first() {
            Some((actual, remaining)) if *actual == expected.as_str() => {
                match_segments(rest, remaining, exact, params)
            }
            _ => false,
        },
        Segment::Param { name, optional } => {
            if let Some((value, remaining)) = path.split_first() {
                params.insert(name.clone(), (*value).to_string());
                if match_segments(rest, remaining, exact, params) {
                    return true;
                }
                params.remove(name);
            }
            *optional && match_segments(rest, path, exact, params)
        }
        Segment::Splat => {
            params.insert(SPLAT_PARAM.to_string(), path.join("/"));
            true
        }
    }
}
