//! Error types for ASN.1 decoding.

use std::num::ParseIntError;

use thiserror::Error;

/// Errors raised while turning DER TLVs into typed elements.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("BOOLEAN: content must be a single 0x00 or 0xff octet")]
    InvalidBoolean,
    #[error("NULL: content must be empty")]
    InvalidNull,

    #[error("INTEGER: no data")]
    IntegerNoData,
    #[error("INTEGER: not minimally encoded")]
    IntegerNotMinimal,

    #[error("OBJECT IDENTIFIER: no data")]
    ObjectIdentifierNoData,
    #[error("OBJECT IDENTIFIER: incomplete encoding")]
    ObjectIdentifierIncompleteEncoding,
    #[error("OBJECT IDENTIFIER: sub-identifier has a leading 0x80 octet")]
    ObjectIdentifierNonMinimalEncoding,
    #[error("OBJECT IDENTIFIER: arc does not fit in 64 bits")]
    ObjectIdentifierArcOverflow,
    #[error("OBJECT IDENTIFIER: too few components (need at least 2)")]
    ObjectIdentifierTooFewComponents,
    #[error("OBJECT IDENTIFIER: first arc {0} must be 0, 1 or 2")]
    ObjectIdentifierInvalidFirstArc(u64),
    #[error("OBJECT IDENTIFIER: second arc {0} must be below 40 under arcs 0 and 1")]
    ObjectIdentifierInvalidSecondArc(u64),
    #[error("OBJECT IDENTIFIER: invalid component '{0}': {1}")]
    ObjectIdentifierInvalidComponent(String, ParseIntError),

    #[error("BIT STRING: no data")]
    BitStringNoData,
    #[error("BIT STRING: unused bits {0} out of range (must be 0-7)")]
    BitStringUnusedBitsOutOfRange(u8),
    #[error("BIT STRING: {0} unused bits declared on an empty string")]
    BitStringUnusedBitsWithoutData(u8),

    #[error("UTF8String: invalid UTF-8")]
    Utf8StringInvalidUtf8,
    #[error("PrintableString: invalid encoding")]
    PrintableStringInvalidEncoding,
    #[error("IA5String: invalid encoding")]
    Ia5StringInvalidEncoding,

    #[error("{0}: unexpected primitive/constructed form")]
    UnexpectedForm(&'static str),

    #[error("invalid DER encoding: {0}")]
    FailedToDecodeDer(#[from] der::error::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
