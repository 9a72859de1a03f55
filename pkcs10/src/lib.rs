//! PKCS#10 Certification Request codec
//!
//! Defined in RFC 2986, with the PKCS#9 `extensionRequest` attribute
//! (RFC 2985) carrying X.509v3 extensions (RFC 5280).
//!
//! ```asn1
//! CertificationRequest ::= SEQUENCE {
//!     certificationRequestInfo CertificationRequestInfo,
//!     signatureAlgorithm       AlgorithmIdentifier,
//!     signature                BIT STRING
//! }
//!
//! CertificationRequestInfo ::= SEQUENCE {
//!     version       INTEGER { v1(0) },
//!     subject       Name,
//!     subjectPKInfo SubjectPublicKeyInfo,
//!     attributes    [0] Attributes
//! }
//! ```
//!
//! Encoding is total. Decoding fails closed: any OID outside the known
//! attribute, extension, key purpose or algorithm tables is rejected rather
//! than carried through.

pub mod algorithm;
pub mod attributes;
pub mod error;
pub mod extensions;
pub mod name;
pub mod oid;
pub mod public_key;
pub(crate) mod reader;
pub mod request;
pub mod signature;

pub use algorithm::{HashAlgorithm, PublicKeyAlgorithm, SignatureAlgorithmIdentifier};
pub use attributes::ExtensionAttributeList;
pub use error::{Error, ErrorKind, Result};
pub use extensions::{ExtensionAttribute, ExtensionKind};
pub use name::{DistinguishedName, NameAttribute};
pub use oid::AttributeKind;
pub use public_key::{PublicKeyInfo, RsaPublicKey};
pub use request::{CertificationRequest, CertificationRequestInfo};
pub use signature::SignatureValue;
