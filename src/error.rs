//! Error types for the fetch and publish boundaries.

use thiserror::Error;

/// A page could not be retrieved. Distinct from "row not found", which is
/// not an error at all.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not read body of {url}: {message}")]
    Body { url: String, message: String },
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("missing credentials for {service}: {missing}")]
    MissingCredentials { service: &'static str, missing: String },

    #[error("{service} rejected the credentials (HTTP {status}): {message}")]
    Unauthorized {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} API error (HTTP {status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} request failed: {message}")]
    Transport { service: &'static str, message: String },

    #[error("unexpected {service} response: {message}")]
    UnexpectedResponse { service: &'static str, message: String },
}

impl PublishError {
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            PublishError::MissingCredentials { .. } | PublishError::Unauthorized { .. }
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("not a decimal number: {raw:?}")]
pub struct ParsePercentError {
    pub raw: String,
}
