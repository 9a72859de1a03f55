//! Decode errors for certification requests.
//!
//! Every failure belongs to one [`ErrorKind`]. Wrapping variants keep the
//! inner error as their `source`, and [`Error::root_cause`] walks back to the
//! innermost one.

use std::fmt;

use asn1::{Element, ObjectIdentifier};
use thiserror::Error;

use crate::extensions::ExtensionKind;

/// Coarse classification of a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An element had the wrong type, tag, or content form.
    UnexpectedTagShape,
    /// An OID was not in the directory consulted for it.
    UnknownOid,
    /// An extension payload failed to decode with its kind's decoder.
    MalformedPayload,
    /// A required element was missing, or unexpected elements followed.
    TruncatedOrTrailingInput,
    /// The `[0]` attributes container deviated from the extensionRequest shape.
    MalformedAttributes,
    /// The PEM text around the DER was invalid.
    PemFraming,
}

/// Which OID directory rejected an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidDomain {
    AttributeType,
    Attribute,
    Extension,
    KeyPurpose,
    SignatureAlgorithm,
    PublicKeyAlgorithm,
}

impl fmt::Display for OidDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OidDomain::AttributeType => "name attribute type",
            OidDomain::Attribute => "request attribute",
            OidDomain::Extension => "extension",
            OidDomain::KeyPurpose => "key purpose",
            OidDomain::SignatureAlgorithm => "signature algorithm",
            OidDomain::PublicKeyAlgorithm => "public key algorithm",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("{context}: expected {expected}, found {found}")]
    UnexpectedTagShape {
        context: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("unknown {domain} OID {oid}")]
    UnknownOid {
        domain: OidDomain,
        oid: ObjectIdentifier,
    },

    #[error("malformed {kind} payload: {source}")]
    MalformedPayload {
        kind: ExtensionKind,
        #[source]
        source: Box<Error>,
    },

    #[error("{context}: missing {expected}")]
    Truncated {
        context: &'static str,
        expected: &'static str,
    },

    #[error("{context}: {count} unexpected trailing element(s)")]
    TrailingElements { context: &'static str, count: usize },

    #[error("malformed extensionRequest attribute: {0}")]
    MalformedAttributes(#[source] Box<Error>),

    #[error("DER: {0}")]
    Der(#[from] der::error::Error),

    #[error("ASN.1: {0}")]
    Asn1(#[from] asn1::error::Error),

    #[error("PEM: {0}")]
    Pem(#[from] pem::error::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnexpectedTagShape { .. } => ErrorKind::UnexpectedTagShape,
            Error::UnknownOid { .. } => ErrorKind::UnknownOid,
            Error::MalformedPayload { .. } => ErrorKind::MalformedPayload,
            Error::Truncated { .. } | Error::TrailingElements { .. } => {
                ErrorKind::TruncatedOrTrailingInput
            }
            Error::MalformedAttributes(_) => ErrorKind::MalformedAttributes,
            Error::Der(e) | Error::Asn1(asn1::error::Error::FailedToDecodeDer(e)) => match e {
                der::error::Error::Truncated => ErrorKind::TruncatedOrTrailingInput,
                der::error::Error::Pem(_) => ErrorKind::PemFraming,
                _ => ErrorKind::UnexpectedTagShape,
            },
            // malformed OID content cannot name a table entry
            Error::Asn1(
                asn1::error::Error::ObjectIdentifierNoData
                | asn1::error::Error::ObjectIdentifierIncompleteEncoding
                | asn1::error::Error::ObjectIdentifierNonMinimalEncoding
                | asn1::error::Error::ObjectIdentifierArcOverflow
                | asn1::error::Error::ObjectIdentifierTooFewComponents
                | asn1::error::Error::ObjectIdentifierInvalidFirstArc(_)
                | asn1::error::Error::ObjectIdentifierInvalidSecondArc(_),
            ) => ErrorKind::UnknownOid,
            Error::Asn1(_) => ErrorKind::UnexpectedTagShape,
            Error::Pem(_) => ErrorKind::PemFraming,
        }
    }

    /// The innermost error behind any payload or attribute wrapping.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::MalformedPayload { source, .. } | Error::MalformedAttributes(source) => {
                source.root_cause()
            }
            other => other,
        }
    }

    pub(crate) fn unexpected(context: &'static str, expected: &'static str, found: &Element) -> Self {
        Error::UnexpectedTagShape {
            context,
            expected,
            found: found.type_name().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
