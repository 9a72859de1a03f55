//! Decoding half of the conversion chain.
//!
//! A `Decoder<T, D>` is implemented on the source type `T` and produces a
//! `D`. The destination must opt in with `DecodableFrom<T>`:
//!
//! ```no_run
//! use csrkit::decoder::{DecodableFrom, Decoder};
//!
//! struct Raw(Vec<u8>);
//! struct Label(String);
//!
//! #[derive(Debug)]
//! struct NotUtf8;
//!
//! impl DecodableFrom<Raw> for Label {}
//!
//! impl Decoder<Raw, Label> for Raw {
//!     type Error = NotUtf8;
//!
//!     fn decode(&self) -> Result<Label, Self::Error> {
//!         String::from_utf8(self.0.clone()).map(Label).map_err(|_| NotUtf8)
//!     }
//! }
//! ```

/// Converts `self` (of type `T`) into a `D`.
pub trait Decoder<T, D: DecodableFrom<T>> {
    /// The error type returned when decoding fails.
    type Error;

    /// Decodes `self` into type `D`.
    ///
    /// # Errors
    ///
    /// Returns an error if `self` does not hold a valid encoding of `D`.
    fn decode(&self) -> Result<D, Self::Error>;
}

/// Marker trait: `Self` can be decoded from `T`.
pub trait DecodableFrom<T> {}
