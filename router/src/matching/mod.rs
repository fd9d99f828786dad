mod matcher;
mod path_segment;
mod resolve_path;

pub use matcher::*;
pub use path_segment::*;
pub use resolve_path::*;

use crate::{ParamsMap, RouterError};

/// The path (or alternative paths) a route answers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    One(String),
    /// Tried in order; the first alternative that matches wins.
    Many(Vec<String>),
}

impl RoutePattern {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let alternatives = match self {
            RoutePattern::One(path) => std::slice::from_ref(path),
            RoutePattern::Many(paths) => paths.as_slice(),
        };
        alternatives.iter().map(String::as_str)
    }
}

impl Default for RoutePattern {
    fn default() -> Self {
        RoutePattern::One("/".into())
    }
}

impl From<&str> for RoutePattern {
    fn from(path: &str) -> Self {
        RoutePattern::One(path.to_string())
    }
}

impl From<String> for RoutePattern {
    fn from(path: String) -> Self {
        RoutePattern::One(path)
    }
}

impl<S: Into<String>> From<Vec<S>> for RoutePattern {
    fn from(paths: Vec<S>) -> Self {
        RoutePattern::Many(paths.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for RoutePattern {
    fn from(paths: [S; N]) -> Self {
        RoutePattern::Many(paths.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOptions {
    pub path: RoutePattern,
    pub exact: bool,
    pub strict: bool,
}

/// A successful match of a pathname against a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// The pattern alternative that matched.
    pub path: String,
    /// The part of the pathname the pattern consumed.
    pub url: String,
    /// Whether the pattern consumed the whole pathname.
    pub is_exact: bool,
    pub params: ParamsMap,
}

/// Matches `pathname` against every alternative of `options.path` in turn.
///
/// `Ok(None)` means no alternative matched. An alternative that fails to
/// compile is an error, but only once the alternatives before it have been
/// tried and missed.
pub fn match_path(
    pathname: &str,
    options: &MatchOptions,
) -> Result<Option<MatchResult>, RouterError> {
    for pattern in options.path.iter() {
        let matcher = Matcher::new(pattern)?;
        if let Some(matched) =
            matcher.test(pathname, options.exact, options.strict)
        {
            return Ok(Some(matched));
        }
    }
    Ok(None)
}
