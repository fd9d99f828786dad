use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("malformed route pattern {pattern:?}: {reason}")]
    MalformedPattern { pattern: String, reason: String },
    #[error("route was discarded before it finished updating")]
    BarrierDropped,
    #[error("invalid navigation target: {0}")]
    InvalidUrl(String),
    #[error("cannot move {delta} entries through the history stack")]
    HistoryExhausted { delta: isize },
}

impl RouterError {
    pub(crate) fn malformed(
        pattern: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while reading typed values out of a [`ParamsMap`](crate::ParamsMap).
#[derive(Error, Debug, Clone)]
pub enum ParamsError {
    /// A field was missing from the route params.
    #[error("could not find parameter {0}")]
    MissingParam(String),
    /// Something went wrong while parsing a field.
    #[error("failed to deserialize parameters")]
    Params(Arc<dyn std::error::Error + Send + Sync>),
}

impl PartialEq for ParamsError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::MissingParam(l0), Self::MissingParam(r0)) => l0 == r0,
            _ => false,
        }
    }
}
