use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    /// Target unreachable or answered with a non-success status.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The expected container never appeared in the DOM.
    #[error("selector \"{selector}\" did not appear within {timeout_secs}s")]
    SelectorTimeout { selector: String, timeout_secs: u64 },

    /// The per-node mapping function rejected a node's shape.
    #[error("extraction failed for node {index}: {reason}")]
    Extraction { index: usize, reason: String },

    /// A CSS selector could not be parsed.
    #[error("invalid selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Any other failure reported by the automation layer.
    #[error("browser error: {0}")]
    Browser(String),

    #[error("screenshot to {path} failed: {reason}")]
    Screenshot { path: String, reason: String },
}

impl From<chromiumoxide::error::CdpError> for ScraperError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Self::Browser(err.to_string())
    }
}
