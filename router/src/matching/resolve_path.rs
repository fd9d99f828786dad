// Resolution rules follow Solid Router
// see <https://github.com/solidjs/solid-router/blob/main/src/utils.ts>

use std::borrow::Cow;

/// Resolves a navigation target against the router's base path.
///
/// Rooted targets (`/x`) resolve against `base`; relative ones against
/// `from`, which is itself placed under `base` if it is not already.
/// Returns `None` for targets that carry a scheme and so leave the router.
pub fn resolve_path(base: &str, path: &str, from: Option<&str>) -> Option<String> {
    if has_scheme(path) {
        return None;
    }

    let base_path = normalize(base, false);
    let prefix = match from.map(|from| normalize(from, false)) {
        Some(_) if path.starts_with('/') => base_path,
        Some(from_path)
            if !from_path
                .to_lowercase()
                .starts_with(&base_path.to_lowercase()) =>
        {
            base_path + from_path
        }
        Some(from_path) => from_path,
        None => base_path,
    };

    let prefix_empty = prefix.is_empty();
    let prefix = if prefix_empty { "/".into() } else { prefix };
    Some((prefix + normalize(path, prefix_empty)).into_owned())
}

/// Removes `base` from the front of `pathname`.
///
/// Returns `None` when `pathname` lies outside `base`. The base only matches
/// on a segment boundary, so `/app` strips `/app/x` but not `/apple`.
pub fn strip_base<'a>(base: &str, pathname: &'a str) -> Option<&'a str> {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return Some(pathname);
    }
    match pathname.strip_prefix(base) {
        Some("") => Some("/"),
        Some(rest) if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

/// Joins two path fragments with exactly one slash between them.
pub fn join_paths(from: &str, to: &str) -> String {
    let from = normalize(from, false);
    let joined = from + normalize(to, false);
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined.into_owned()
    }
}

fn has_scheme(path: &str) -> bool {
    path.starts_with("//")
        || path.starts_with("tel:")
        || path.starts_with("mailto:")
        || path
            .split_once("://")
            .map(|(prefix, _)| prefix.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or(false)
}

fn normalize(path: &str, omit_slash: bool) -> Cow<'_, str> {
    let s = path.trim_start_matches('/').trim_end_matches('/');
    if s.is_empty() || omit_slash || s.starts_with(['?', '#']) {
        s.into()
    } else {
        format!("/{s}").into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_query_string_with_opening_slash() {
        assert_eq!(normalize("/?foo=bar", false), "?foo=bar");
    }

    #[test]
    fn strip_base_respects_segment_boundaries() {
        assert_eq!(strip_base("", "/demo"), Some("/demo"));
        assert_eq!(strip_base("/app", "/app"), Some("/"));
        assert_eq!(strip_base("/app/", "/app/demo"), Some("/demo"));
        assert_eq!(strip_base("/app", "/apple"), None);
        assert_eq!(strip_base("/app", "/other"), None);
    }
}
