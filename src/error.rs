//! Error type for the data-loading shell around the route core.
//!
//! The core computations (index building, nearest point, surface and POI
//! queries) are total and never fail. Only fetching and decoding the JSON
//! documents that feed them can go wrong.

use thiserror::Error;

/// Errors raised while loading route documents.
#[derive(Debug, Error)]
pub enum RouteDataError {
    /// A required view setting (route id or document URL) was empty.
    #[error("missing view setting `{0}`")]
    MissingSetting(&'static str),

    /// The request could not be sent or the body could not be read.
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// The body was not valid JSON.
    #[error("invalid JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The route catalog has no entry for the requested id.
    #[error("route `{route_id}` not found in catalog")]
    RouteNotFound { route_id: String },

    /// The route descriptor names no elevation document.
    #[error("route `{route_id}` has no elevation URL")]
    MissingElevationUrl { route_id: String },

    /// An in-memory source has nothing registered under the URL.
    #[error("no document registered for {0}")]
    UnknownDocument(String),
}

/// Result alias for data-loading operations.
pub type Result<T> = std::result::Result<T, RouteDataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RouteDataError::Status {
            url: "https://example.org/routes.json".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP 404 for https://example.org/routes.json");

        let err = RouteDataError::RouteNotFound { route_id: "svingom-1".to_string() };
        assert!(err.to_string().contains("svingom-1"));
    }

    #[test]
    fn test_json_error_keeps_source() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = RouteDataError::Json { url: "a.json".to_string(), source };
        assert!(std::error::Error::source(&err).is_some());
    }
}
