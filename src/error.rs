//! Error taxonomy for portal automation.

use thiserror::Error;

/// Result alias used across the portal core.
pub type Result<T> = std::result::Result<T, PortalError>;

/// Errors raised while driving the remote portal.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The remote session could not be started or was lost.
    #[error("Session error: {0}")]
    Session(String),

    /// A bounded wait elapsed before its condition held.
    #[error("Timed out after {seconds}s waiting for {what}")]
    Timeout { what: String, seconds: u64 },

    /// A caller-supplied label is not among the live options.
    #[error("Option '{label}' not found in {level} selector")]
    OptionNotFound { level: String, label: String },

    /// Any failure while populating or submitting a search form.
    #[error("Search failed for {query}: {source}")]
    Search {
        query: String,
        #[source]
        source: Box<PortalError>,
    },

    /// Submission succeeded but no document reference appeared.
    #[error("document not found")]
    DocumentNotFound,

    /// A form control the page is expected to carry is missing.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The document transfer did not return usable content.
    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request is missing data or is malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl PortalError {
    /// Create a session error.
    pub fn session(message: impl std::fmt::Display) -> Self {
        Self::Session(message.to_string())
    }

    /// Create a timeout error.
    pub fn timeout(what: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            what: what.into(),
            seconds,
        }
    }

    /// Create an option-not-found error for a selector level.
    pub fn option_not_found(level: impl Into<String>, label: impl Into<String>) -> Self {
        Self::OptionNotFound {
            level: level.into(),
            label: label.into(),
        }
    }

    /// Wrap an error raised during a search.
    pub fn search(query: impl Into<String>, source: PortalError) -> Self {
        Self::Search {
            query: query.into(),
            source: Box::new(source),
        }
    }

    /// Short machine-friendly category, used in logs and API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Session(_) => "session",
            Self::Timeout { .. } => "timeout",
            Self::OptionNotFound { .. } => "option_not_found",
            Self::Search { .. } => "search",
            Self::DocumentNotFound => "document_not_found",
            Self::ElementNotFound(_) => "element_not_found",
            Self::Fetch { .. } | Self::Http(_) => "fetch",
            Self::Io(_) | Self::Archive(_) | Self::Json(_) => "storage",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }

    /// The innermost cause, looking through search wrappers.
    pub fn root(&self) -> &PortalError {
        match self {
            Self::Search { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_not_found_message() {
        assert_eq!(PortalError::DocumentNotFound.to_string(), "document not found");
    }

    #[test]
    fn test_search_error_wraps_cause() {
        let err = PortalError::search(
            "CNR ABC",
            PortalError::timeout("#cnr_number", 10),
        );
        assert_eq!(err.kind(), "search");
        assert!(err.to_string().contains("CNR ABC"));
        assert!(matches!(err.root(), PortalError::Timeout { seconds: 10, .. }));
    }

    #[test]
    fn test_option_not_found_names_level() {
        let err = PortalError::option_not_found("district", "Atlantis");
        assert_eq!(
            err.to_string(),
            "Option 'Atlantis' not found in district selector"
        );
    }
}
