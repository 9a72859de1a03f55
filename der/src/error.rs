use nom::error::{ErrorKind, ParseError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("input ended before the element was complete")]
    Truncated,
    #[error("indefinite length is not allowed in DER")]
    IndefiniteLength,
    #[error("length is not minimally encoded")]
    NonMinimalLength,
    #[error("length field of {0} bytes does not fit in memory")]
    LengthOverflow(usize),
    #[error("high tag number form (tag byte 0x{0:02x}) is not supported")]
    HighTagNumber(u8),
    #[error("elements nested deeper than {0} levels")]
    NestingTooDeep(usize),
    #[error("parser error {0:?}")]
    Parser(ErrorKind),
    #[error("pem: {0}")]
    Pem(#[from] pem::error::Error),
}

impl<I> ParseError<I> for Error {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Eof => Error::Truncated,
            kind => Error::Parser(kind),
        }
    }

    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

pub type Result<T> = std::result::Result<T, Error>;
