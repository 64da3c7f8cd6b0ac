use thiserror::Error;

use crate::client::Endpoint;

#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure. The request URL is stripped because its query
    /// string carries the API key.
    #[error(transparent)]
    Reqwest(reqwest::Error),

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: Endpoint, status: u16 },

    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Reqwest(err.without_url())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
