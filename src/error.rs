// src/error.rs

use std::path::PathBuf;

/// Failures retrieving the raw CSV for one poll cycle.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    #[error("GET {url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("reading body from {url}: {source}")]
    Body {
        url: String,
        source: reqwest::Error,
    },
}

/// The fetched text could not be turned into a current row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Fewer than two non-blank lines: header only, or nothing at all.
    #[error("no data row below the header")]
    NoDataRow,

    #[error("header has no {0:?} column")]
    MissingColumn(&'static str),

    #[error("malformed CSV: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading settings {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing settings {path:?}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("writing settings {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid endpoint URL {0:?}: {1}")]
    BadUrl(String, url::ParseError),
}
