use base64::DecodeError;
use thiserror::Error;

/// Errors raised while reading RFC 7468 text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// No `-----BEGIN ...-----` line before the data.
    #[error("missing a pre encapsulation boundary")]
    MissingPreEncapsulationBoundary,

    /// Input ended before the `-----END ...-----` line.
    #[error("missing a post encapsulation boundary")]
    MissingPostEncapsulationBoundary,

    #[error("missing PEM data")]
    MissingData,

    #[error("unsupported label '{0}'")]
    InvalidLabel(String),

    #[error("label doesn't match: BEGIN {begin}, END {end}")]
    LabelMismatch { begin: String, end: String },

    /// Expected a particular kind of document and found another.
    #[error("unexpected label: expected {expected}, got {actual}")]
    UnexpectedLabel { expected: String, actual: String },

    #[error("invalid encapsulation boundary")]
    InvalidEncapsulationBoundary,

    #[error("invalid base64line")]
    InvalidBase64Line,

    #[error("invalid base64finl")]
    InvalidBase64Finl,

    #[error("base64 decode: {0}")]
    Base64Decode(DecodeError),
}

pub type Result<T> = std::result::Result<T, Error>;
