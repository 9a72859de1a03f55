//! Signature algorithm identifiers
//!
//! ```asn1
//! AlgorithmIdentifier ::= SEQUENCE {
//!     algorithm   OBJECT IDENTIFIER,
//!     parameters  ANY DEFINED BY algorithm OPTIONAL
//! }
//! ```
//!
//! PKCS#1 signature algorithms carry an explicit NULL parameter (RFC 8017
//! Appendix A.2.4). It is always written and accepted when absent.

use std::convert::Infallible;
use std::fmt;

use asn1::{Element, ObjectIdentifier};
use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, OidDomain, Result};
use crate::reader::SequenceReader;

/// rsaEncryption (1.2.840.113549.1.1.1)
pub const RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::from_static(&[1, 2, 840, 113549, 1, 1, 1]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 6] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublicKeyAlgorithm {
    Rsa,
}

impl PublicKeyAlgorithm {
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            PublicKeyAlgorithm::Rsa => RSA_ENCRYPTION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureAlgorithmIdentifier {
    pub hash: HashAlgorithm,
    pub key: PublicKeyAlgorithm,
}

impl SignatureAlgorithmIdentifier {
    pub fn new(hash: HashAlgorithm, key: PublicKeyAlgorithm) -> Self {
        SignatureAlgorithmIdentifier { hash, key }
    }

    pub fn oid(&self) -> ObjectIdentifier {
        let arcs: &'static [u64] = match (self.key, self.hash) {
            (PublicKeyAlgorithm::Rsa, HashAlgorithm::Md5) => &[1, 2, 840, 113549, 1, 1, 4],
            (PublicKeyAlgorithm::Rsa, HashAlgorithm::Sha1) => &[1, 2, 840, 113549, 1, 1, 5],
            (PublicKeyAlgorithm::Rsa, HashAlgorithm::Sha224) => &[1, 2, 840, 113549, 1, 1, 14],
            (PublicKeyAlgorithm::Rsa, HashAlgorithm::Sha256) => &[1, 2, 840, 113549, 1, 1, 11],
            (PublicKeyAlgorithm::Rsa, HashAlgorithm::Sha384) => &[1, 2, 840, 113549, 1, 1, 12],
            (PublicKeyAlgorithm::Rsa, HashAlgorithm::Sha512) => &[1, 2, 840, 113549, 1, 1, 13],
        };
        ObjectIdentifier::from_static(arcs)
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        HashAlgorithm::ALL
            .iter()
            .map(|hash| SignatureAlgorithmIdentifier::new(*hash, PublicKeyAlgorithm::Rsa))
            .find(|alg| &alg.oid() == oid)
    }
}

impl fmt::Display for SignatureAlgorithmIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key {
            PublicKeyAlgorithm::Rsa => write!(f, "{}WithRSAEncryption", self.hash),
        }
    }
}

/// Reads the optional parameters field, which must be NULL when present.
pub(crate) fn finish_null_parameters(mut reader: SequenceReader<'_>) -> Result<()> {
    match reader.peek() {
        None => Ok(()),
        Some(Element::Null) => {
            reader.next("parameters")?;
            reader.finish()
        }
        Some(other) => Err(Error::unexpected("AlgorithmIdentifier", "NULL parameters", other)),
    }
}

impl DecodableFrom<Element> for SignatureAlgorithmIdentifier {}

impl Decoder<Element, SignatureAlgorithmIdentifier> for Element {
    type Error = Error;

    fn decode(&self) -> Result<SignatureAlgorithmIdentifier> {
        let mut reader = SequenceReader::from_sequence("AlgorithmIdentifier", self)?;
        let oid = reader.next_oid()?;
        let algorithm = SignatureAlgorithmIdentifier::from_oid(oid).ok_or_else(|| {
            debug!("rejecting unknown signature algorithm {oid}");
            Error::UnknownOid {
                domain: OidDomain::SignatureAlgorithm,
                oid: oid.clone(),
            }
        })?;
        finish_null_parameters(reader)?;
        Ok(algorithm)
    }
}

impl EncodableTo<SignatureAlgorithmIdentifier> for Element {}

impl Encoder<SignatureAlgorithmIdentifier, Element> for SignatureAlgorithmIdentifier {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        Ok(Element::Sequence(vec![
            Element::ObjectIdentifier(self.oid()),
            Element::Null,
        ]))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;
    use crate::error::ErrorKind;

    #[rstest(
        hash,
        oid,
        name,
        case(HashAlgorithm::Md5, "1.2.840.113549.1.1.4", "md5WithRSAEncryption"),
        case(HashAlgorithm::Sha1, "1.2.840.113549.1.1.5", "sha1WithRSAEncryption"),
        case(HashAlgorithm::Sha224, "1.2.840.113549.1.1.14", "sha224WithRSAEncryption"),
        case(HashAlgorithm::Sha256, "1.2.840.113549.1.1.11", "sha256WithRSAEncryption"),
        case(HashAlgorithm::Sha384, "1.2.840.113549.1.1.12", "sha384WithRSAEncryption"),
        case(HashAlgorithm::Sha512, "1.2.840.113549.1.1.13", "sha512WithRSAEncryption")
    )]
    fn test_algorithm_table(hash: HashAlgorithm, oid: &str, name: &str) {
        let alg = SignatureAlgorithmIdentifier::new(hash, PublicKeyAlgorithm::Rsa);
        assert_eq!(oid, alg.oid().to_string());
        assert_eq!(name, alg.to_string());
        let Ok(element) = alg.encode();
        let decoded: SignatureAlgorithmIdentifier = element.decode().unwrap();
        assert_eq!(alg, decoded);
    }

    #[test]
    fn test_sha256_bytes() {
        let alg = SignatureAlgorithmIdentifier::new(HashAlgorithm::Sha256, PublicKeyAlgorithm::Rsa);
        let Ok(element) = alg.encode();
        assert_eq!(
            vec![
                0x30, 0x0d, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b,
                0x05, 0x00,
            ],
            element.to_der()
        );
    }

    #[test]
    fn test_decode_absent_parameters() {
        let element = Element::Sequence(vec![Element::ObjectIdentifier(
            ObjectIdentifier::from_str("1.2.840.113549.1.1.11").unwrap(),
        )]);
        let decoded: SignatureAlgorithmIdentifier = element.decode().unwrap();
        assert_eq!(HashAlgorithm::Sha256, decoded.hash);
    }

    #[rstest(
        input,
        expected,
        case(
            Element::Sequence(vec![Element::ObjectIdentifier(
                ObjectIdentifier::from_str("1.2.840.10045.4.3.2").unwrap()
            )]),
            ErrorKind::UnknownOid
        ),
        case(
            Element::Sequence(vec![
                Element::ObjectIdentifier(ObjectIdentifier::from_str("1.2.840.113549.1.1.11").unwrap()),
                Element::Boolean(true),
            ]),
            ErrorKind::UnexpectedTagShape
        ),
        case(
            Element::Sequence(vec![
                Element::ObjectIdentifier(ObjectIdentifier::from_str("1.2.840.113549.1.1.11").unwrap()),
                Element::Null,
                Element::Null,
            ]),
            ErrorKind::TruncatedOrTrailingInput
        ),
        case(Element::Sequence(vec![]), ErrorKind::TruncatedOrTrailingInput),
        case(Element::Null, ErrorKind::UnexpectedTagShape)
    )]
    fn test_decode_errors(input: Element, expected: ErrorKind) {
        let result: Result<SignatureAlgorithmIdentifier> = input.decode();
        assert_eq!(expected, result.unwrap_err().kind());
    }

    #[test]
    fn test_serde() {
        let alg = SignatureAlgorithmIdentifier::new(HashAlgorithm::Sha384, PublicKeyAlgorithm::Rsa);
        let json = serde_json::to_string(&alg).unwrap();
        assert_eq!(r#"{"hash":"sha384","key":"Rsa"}"#, json);
    }
}
