//! # csrkit
//!
//! Conversion traits shared by every layer of the csrkit CSR codec.
//!
//! A certification request travels through a chain of representations,
//! and each hop is a `Decoder` on the way in and an `Encoder` on the way out:
//!
//! ```text
//! PEM ⇄ Vec<u8> ⇄ Der ⇄ ASN1Object ⇄ CertificationRequest
//! ```
//!
//! The marker traits `DecodableFrom` and `EncodableTo` restrict which pairs
//! of types may be converted, so an impossible hop is a compile error rather
//! than a runtime failure.
//!
//! ```ignore
//! use csrkit::decoder::Decoder;
//! use der::Der;
//! use asn1::ASN1Object;
//!
//! let bytes = vec![0x30, 0x00];
//! let der: Der = bytes.decode()?;
//! let asn1: ASN1Object = der.decode()?;
//! ```

#![forbid(unsafe_code)]

pub mod decoder;
pub mod encoder;
