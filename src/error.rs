//! Fetch error taxonomy
//!
//! Fetcher errors are observable UI state, so the variants are clonable and
//! carry rendered messages rather than the underlying error values. "Record
//! not found" is not an error anywhere in this crate; it surfaces as an
//! absent result.

use thiserror::Error;

/// Errors surfaced through a fetcher's observable state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The remote interface failed or returned an unusable response
    #[error("network error: {0}")]
    Network(String),

    /// A write was attempted against an address the caller does not control
    #[error("{address} is not one of your addresses")]
    NotAuthorized {
        /// The address the caller tried to write as
        address: String,
    },

    /// The local store failed to read or write
    #[error("local store error: {0}")]
    Store(String),
}

impl FetchError {
    /// Wrap a remote-interface failure
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network(err.to_string())
    }

    /// Wrap a local-store failure
    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::Store(err.to_string())
    }

    /// Build the authorization failure for an address
    pub fn not_authorized(address: &str) -> Self {
        Self::NotAuthorized {
            address: address.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = FetchError::not_authorized("calvin");
        assert_eq!(err.to_string(), "calvin is not one of your addresses");

        let err = FetchError::network("connection refused");
        assert_eq!(err.to_string(), "network error: connection refused");
    }
}
