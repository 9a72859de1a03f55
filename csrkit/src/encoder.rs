//! Encoding half of the conversion chain.
//!
//! An `Encoder<T, E>` is implemented on the value being encoded and produces
//! its lower-level representation `E`. Layers whose encoding cannot fail use
//! `std::convert::Infallible` as the error type, so callers can destructure
//! the result with an irrefutable `let Ok(v) = value.encode();`.

/// Converts `self` (of type `T`) into its representation `E`.
pub trait Encoder<T, E: EncodableTo<T>> {
    /// The error type returned when encoding fails.
    type Error;

    /// Encodes `self` into type `E`.
    ///
    /// # Errors
    ///
    /// Returns an error if `self` cannot be represented as `E`.
    fn encode(&self) -> Result<E, Self::Error>;
}

/// Marker trait: `Self` can be produced by encoding a `T`.
pub trait EncodableTo<T> {}
