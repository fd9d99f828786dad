use super::{MatchResult, PathSegment};
use crate::{ParamsMap, RouterError};

/// Name a bare `*` captures under.
pub(crate) const ANONYMOUS_SPLAT: &str = "0";

/// A single route pattern compiled into segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    pattern: String,
    segments: Vec<PathSegment>,
    trailing_slash: bool,
}

impl Matcher {
    /// Compiles `pattern`, failing on syntax the matcher cannot honor.
    pub fn new(pattern: &str) -> Result<Self, RouterError> {
        check_parentheses(pattern)?;

        let (body, trailing_slash) = split_path(pattern);
        let count = body.len();
        let mut segments: Vec<PathSegment> = Vec::with_capacity(count);

        for (idx, raw) in body.into_iter().enumerate() {
            let segment = if raw.is_empty() {
                return Err(RouterError::malformed(pattern, "empty segment"));
            } else if let Some(name) = raw.strip_prefix(':') {
                validate_name(pattern, name)?;
                PathSegment::Param(name.to_string())
            } else if let Some(name) = raw.strip_prefix('*') {
                if idx + 1 != count || trailing_slash {
                    return Err(RouterError::malformed(
                        pattern,
                        "wildcard must be the last segment",
                    ));
                }
                if name.is_empty() {
                    PathSegment::Splat(ANONYMOUS_SPLAT.to_string())
                } else {
                    validate_name(pattern, name)?;
                    PathSegment::Splat(name.to_string())
                }
            } else if raw.contains('*') {
                return Err(RouterError::malformed(
                    pattern,
                    "wildcard must span a whole segment",
                ));
            } else {
                PathSegment::Static(raw.to_string())
            };

            if let Some(name) = segment.param_name() {
                if segments.iter().any(|s| s.param_name() == Some(name)) {
                    return Err(RouterError::malformed(
                        pattern,
                        format!("duplicate parameter {name:?}"),
                    ));
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            trailing_slash,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Tests `pathname` against the pattern.
    ///
    /// With `exact`, the pattern has to consume the whole path, give or take
    /// one trailing slash. Without it, the pattern may match any prefix that
    /// ends on a segment boundary. With `strict`, a pattern ending in `/`
    /// only matches paths that continue past that slash.
    ///
    /// Captured values are the path's raw text. An encoded `%2F` stays inside
    /// the one segment it was written in.
    pub fn test(
        &self,
        pathname: &str,
        exact: bool,
        strict: bool,
    ) -> Option<MatchResult> {
        let (parts, path_trailing) = split_path(pathname);
        let mut params = ParamsMap::with_capacity(self.segments.len());
        let mut url = String::new();
        let mut consumed = 0;

        for segment in &self.segments {
            match segment {
                PathSegment::Static(literal) => {
                    let part = parts.get(consumed)?;
                    if *part != literal.as_str() {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    let part = parts.get(consumed).filter(|p| !p.is_empty())?;
                    params.insert(name.clone(), part.to_string());
                }
                PathSegment::Splat(name) => {
                    let rest_parts = &parts[consumed..];
                    let mut rest = rest_parts.join("/");
                    for part in rest_parts {
                        url.push('/');
                        url.push_str(part);
                    }
                    if path_trailing && !rest_parts.is_empty() {
                        rest.push('/');
                        url.push('/');
                    }
                    params.insert(name.clone(), rest);
                    if url.is_empty() {
                        url.push('/');
                    }
                    return Some(MatchResult {
                        path: self.pattern.clone(),
                        url,
                        is_exact: true,
                        params,
                    });
                }
            }
            url.push('/');
            url.push_str(parts[consumed]);
            consumed += 1;
        }

        let remaining = parts.len() - consumed;
        if self.trailing_slash && strict {
            if remaining == 0 && !path_trailing {
                return None;
            }
            url.push('/');
        }
        if url.is_empty() {
            url.push('/');
        }

        let is_exact = remaining == 0;
        if exact && !is_exact {
            return None;
        }

        Some(MatchResult {
            path: self.pattern.clone(),
            url,
            is_exact,
            params,
        })
    }
}

/// Splits a path into its segments and reports whether it ends in a slash.
/// The leading slash is optional and `""` and `"/"` both have no segments.
pub(crate) fn split_path(path: &str) -> (Vec<&str>, bool) {
    let body = path.strip_prefix('/').unwrap_or(path);
    let (body, trailing) = match body.strip_suffix('/') {
        Some(body) => (body, true),
        None => (body, false),
    };
    let parts = if body.is_empty() {
        Vec::new()
    } else {
        body.split('/').collect()
    };
    (parts, trailing)
}

fn check_parentheses(pattern: &str) -> Result<(), RouterError> {
    let mut depth = 0usize;
    for c in pattern.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    RouterError::malformed(pattern, "unbalanced parentheses")
                })?
            }
            _ => {}
        }
    }
    match depth {
        0 if pattern.contains('(') => Err(RouterError::malformed(
            pattern,
            "parameter groups are not supported",
        )),
        0 => Ok(()),
        _ => Err(RouterError::malformed(pattern, "unbalanced parentheses")),
    }
}

fn validate_name(pattern: &str, name: &str) -> Result<(), RouterError> {
    if name.is_empty() {
        Err(RouterError::malformed(pattern, "parameter has no name"))
    } else if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Err(RouterError::malformed(
            pattern,
            format!("invalid parameter name {name:?}"),
        ))
    } else {
        Ok(())
    }
}
