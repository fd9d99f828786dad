/// One `/`-delimited piece of a compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Matched literally and case-sensitively.
    Static(String),
    /// `:name`, matches any single non-empty segment.
    Param(String),
    /// `*` or `*name`, matches the rest of the path including slashes.
    /// Only valid as the final segment.
    Splat(String),
}

impl PathSegment {
    pub fn as_raw_str(&self) -> &str {
        match self {
            PathSegment::Static(i) => i,
            PathSegment::Param(i) => i,
            PathSegment::Splat(i) => i,
        }
    }

    /// The param name this segment captures under, if any.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            PathSegment::Static(_) => None,
            PathSegment::Param(name) | PathSegment::Splat(name) => Some(name),
        }
    }
}
