use crate::RouterError;
use std::fmt;

mod history;
pub use history::*;

/// Origin used to parse paths that arrive without one.
pub(crate) const BASE: &str = "http://localhost";

/// A snapshot of the current URL, split the way `window.location` splits
/// it. Navigation replaces the whole value; it is never edited in place.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct LocationSegments {
    /// The path, always starting with `/`.
    pub pathname: String,
    /// The query string without its leading `?`.
    pub search: String,
    /// The fragment without its leading `#`, if the URL has one.
    pub hash: Option<String>,
}

impl LocationSegments {
    /// Parses a path (or a full URL) into its segments.
    pub fn parse(href: &str) -> Result<Self, RouterError> {
        let base = url::Url::parse(BASE)
            .map_err(|e| RouterError::InvalidUrl(e.to_string()))?;
        let url = url::Url::options()
            .base_url(Some(&base))
            .parse(href)
            .map_err(|e| RouterError::InvalidUrl(format!("{href}: {e}")))?;

        Ok(Self {
            pathname: url.path().to_string(),
            search: url.query().unwrap_or_default().to_string(),
            hash: url.fragment().map(String::from),
        })
    }

    /// The path together with its query string and fragment.
    pub fn to_full_path(&self) -> String {
        let mut path = self.pathname.clone();
        if !self.search.is_empty() {
            path.push('?');
            path.push_str(&self.search);
        }
        if let Some(hash) = &self.hash {
            path.push('#');
            path.push_str(hash);
        }
        path
    }
}

impl TryFrom<&str> for LocationSegments {
    type Error = RouterError;

    fn try_from(href: &str) -> Result<Self, Self::Error> {
        Self::parse(href)
    }
}

impl fmt::Display for LocationSegments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_full_path())
    }
}
