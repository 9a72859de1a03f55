//! Subject public key information
//!
//! ```asn1
//! SubjectPublicKeyInfo ::= SEQUENCE {
//!     algorithm         AlgorithmIdentifier,
//!     subjectPublicKey  BIT STRING
//! }
//!
//! RSAPublicKey ::= SEQUENCE {
//!     modulus           INTEGER,  -- n
//!     publicExponent    INTEGER   -- e
//! }
//! ```
//!
//! Only RSA keys are modelled. The RSA key travels DER-encoded inside the
//! BIT STRING, which must be octet aligned.

use std::convert::Infallible;
use std::fmt;

use asn1::{BitString, Element, Integer};
use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use pem::{FromPem, Label, Pem, ToPem};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithm::{RSA_ENCRYPTION, finish_null_parameters};
use crate::error::{Error, OidDomain, Result};
use crate::reader::{SequenceReader, single_element};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaPublicKey {
    pub modulus: Integer,
    pub public_exponent: Integer,
}

impl RsaPublicKey {
    pub fn new(modulus: Integer, public_exponent: Integer) -> Self {
        RsaPublicKey {
            modulus,
            public_exponent,
        }
    }

    /// Size of the modulus in bits.
    pub fn bits(&self) -> u64 {
        self.modulus.bits()
    }

    /// Reads a bare PKCS#1 `RSAPublicKey`.
    pub fn from_pkcs1_der(bytes: &[u8]) -> Result<Self> {
        single_element("RSAPublicKey", bytes)?.decode()
    }

    pub fn to_pkcs1_der(&self) -> Vec<u8> {
        let Ok(element) = self.encode();
        element.to_der()
    }
}

impl DecodableFrom<Element> for RsaPublicKey {}

impl Decoder<Element, RsaPublicKey> for Element {
    type Error = Error;

    fn decode(&self) -> Result<RsaPublicKey> {
        let mut reader = SequenceReader::from_sequence("RSAPublicKey", self)?;
        let modulus = reader.next_integer()?.clone();
        let public_exponent = reader.next_integer()?.clone();
        reader.finish()?;
        Ok(RsaPublicKey {
            modulus,
            public_exponent,
        })
    }
}

impl EncodableTo<RsaPublicKey> for Element {}

impl Encoder<RsaPublicKey, Element> for RsaPublicKey {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        Ok(Element::Sequence(vec![
            Element::Integer(self.modulus.clone()),
            Element::Integer(self.public_exponent.clone()),
        ]))
    }
}

impl FromPem for RsaPublicKey {
    type Error = Error;

    fn expected_labels() -> &'static [Label] {
        &[Label::RSAPublicKey]
    }

    fn from_pem(pem: &Pem) -> Result<Self> {
        pem.expect_label(Self::expected_labels())?;
        let bytes: Vec<u8> = pem.decode()?;
        RsaPublicKey::from_pkcs1_der(&bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicKeyInfo {
    Rsa(RsaPublicKey),
}

impl PublicKeyInfo {
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        single_element("SubjectPublicKeyInfo", bytes)?.decode()
    }

    pub fn to_der(&self) -> Vec<u8> {
        let Ok(element) = self.encode();
        element.to_der()
    }

    pub fn algorithm_name(&self) -> &'static str {
        match self {
            PublicKeyInfo::Rsa(_) => "rsaEncryption",
        }
    }
}

impl From<RsaPublicKey> for PublicKeyInfo {
    fn from(key: RsaPublicKey) -> Self {
        PublicKeyInfo::Rsa(key)
    }
}

impl fmt::Display for PublicKeyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicKeyInfo::Rsa(key) => {
                writeln!(f, "Public Key Algorithm: {}", self.algorithm_name())?;
                writeln!(f, "    Public-Key: ({} bit)", key.bits())?;
                writeln!(f, "    Modulus:")?;
                let modulus = key
                    .modulus
                    .to_signed_bytes_be()
                    .iter()
                    .map(|b| format!("{:02x}", b))
                    .collect::<Vec<_>>();
                for line in modulus.chunks(15) {
                    writeln!(f, "        {}", line.join(":"))?;
                }
                match key.public_exponent.to_u32() {
                    Some(e) => write!(f, "    Exponent: {} ({:#x})", e, e),
                    None => write!(f, "    Exponent: {}", key.public_exponent),
                }
            }
        }
    }
}

impl DecodableFrom<Element> for PublicKeyInfo {}

impl Decoder<Element, PublicKeyInfo> for Element {
    type Error = Error;

    fn decode(&self) -> Result<PublicKeyInfo> {
        let mut reader = SequenceReader::from_sequence("SubjectPublicKeyInfo", self)?;
        let mut algorithm =
            SequenceReader::from_sequence("AlgorithmIdentifier", reader.next("algorithm")?)?;
        let oid = algorithm.next_oid()?;
        if oid != &RSA_ENCRYPTION {
            debug!("rejecting unsupported public key algorithm {oid}");
            return Err(Error::UnknownOid {
                domain: OidDomain::PublicKeyAlgorithm,
                oid: oid.clone(),
            });
        }
        finish_null_parameters(algorithm)?;

        let key = reader.next_bit_string()?;
        if key.unused_bits() != 0 {
            return Err(Error::UnexpectedTagShape {
                context: "SubjectPublicKeyInfo",
                expected: "octet-aligned BIT STRING",
                found: format!("{} unused bits", key.unused_bits()),
            });
        }
        reader.finish()?;

        let rsa = RsaPublicKey::from_pkcs1_der(key.as_bytes())?;
        Ok(PublicKeyInfo::Rsa(rsa))
    }
}

impl EncodableTo<PublicKeyInfo> for Element {}

impl Encoder<PublicKeyInfo, Element> for PublicKeyInfo {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        match self {
            PublicKeyInfo::Rsa(key) => Ok(Element::Sequence(vec![
                Element::Sequence(vec![Element::ObjectIdentifier(RSA_ENCRYPTION), Element::Null]),
                Element::BitString(BitString::from_bytes(key.to_pkcs1_der())),
            ])),
        }
    }
}

impl ToPem for PublicKeyInfo {
    type Error = Infallible;

    fn pem_label(&self) -> Label {
        Label::PublicKey
    }

    fn to_pem(&self) -> std::result::Result<Pem, Self::Error> {
        Ok(Pem::from_bytes(self.pem_label(), &self.to_der()))
    }
}

impl FromPem for PublicKeyInfo {
    type Error = Error;

    /// SPKI first; a PKCS#1 block is lifted into the RSA variant.
    fn expected_labels() -> &'static [Label] {
        &[Label::PublicKey, Label::RSAPublicKey]
    }

    fn from_pem(pem: &Pem) -> Result<Self> {
        pem.expect_label(Self::expected_labels())?;
        match pem.label() {
            Label::RSAPublicKey => RsaPublicKey::from_pem(pem).map(PublicKeyInfo::Rsa),
            _ => {
                let bytes: Vec<u8> = pem.decode()?;
                PublicKeyInfo::from_der(&bytes)
            }
        }
    }
}
