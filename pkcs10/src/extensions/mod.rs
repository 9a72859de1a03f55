//! X.509v3 extensions requested through PKCS#10.
//!
//! The set of kinds is closed. Each kind owns its OID and payload type, and
//! an unknown OID fails the decode instead of being carried as raw bytes.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::LazyLock;

use asn1::{Element, ObjectIdentifier, OctetString};
use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, OidDomain, Result};
use crate::reader::{SequenceReader, single_element};

mod authority_key_identifier;
mod basic_constraints;
mod crl_distribution_points;
mod extended_key_usage;
mod general_name;
mod key_usage;
mod named_bits;
mod subject_alt_name;
mod subject_key_identifier;

pub use authority_key_identifier::AuthorityKeyIdentifier;
pub use basic_constraints::BasicConstraints;
pub use crl_distribution_points::{
    CrlDistributionPoints, DistributionPoint, DistributionPointName, ReasonFlag, ReasonFlags,
};
pub use extended_key_usage::{ExtendedKeyUsage, KeyPurpose};
pub use general_name::{GeneralName, Ia5Text};
pub use key_usage::{KeyUsage, KeyUsageBit};
pub use named_bits::NamedBit;
pub use subject_alt_name::SubjectAltName;
pub use subject_key_identifier::SubjectKeyIdentifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtensionKind {
    SubjectKeyId,
    KeyUsage,
    SubjectAltName,
    BasicConstraints,
    CrlDistributionPoints,
    AuthorityKeyId,
    ExtendedKeyUsage,
}

static BY_OID: LazyLock<HashMap<ObjectIdentifier, ExtensionKind>> = LazyLock::new(|| {
    ExtensionKind::ALL
        .iter()
        .map(|kind| (kind.oid(), *kind))
        .collect()
});

impl ExtensionKind {
    pub const ALL: [ExtensionKind; 7] = [
        ExtensionKind::SubjectKeyId,
        ExtensionKind::KeyUsage,
        ExtensionKind::SubjectAltName,
        ExtensionKind::BasicConstraints,
        ExtensionKind::CrlDistributionPoints,
        ExtensionKind::AuthorityKeyId,
        ExtensionKind::ExtendedKeyUsage,
    ];

    pub fn oid(&self) -> ObjectIdentifier {
        let arcs: &'static [u64] = match self {
            ExtensionKind::SubjectKeyId => &[2, 5, 29, 14],
            ExtensionKind::KeyUsage => &[2, 5, 29, 15],
            ExtensionKind::SubjectAltName => &[2, 5, 29, 17],
            ExtensionKind::BasicConstraints => &[2, 5, 29, 19],
            ExtensionKind::CrlDistributionPoints => &[2, 5, 29, 31],
            ExtensionKind::AuthorityKeyId => &[2, 5, 29, 35],
            ExtensionKind::ExtendedKeyUsage => &[2, 5, 29, 37],
        };
        ObjectIdentifier::from_static(arcs)
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Option<ExtensionKind> {
        BY_OID.get(oid).copied()
    }

    /// RFC 5280 module name, e.g. `keyUsage`.
    pub fn name(&self) -> &'static str {
        match self {
            ExtensionKind::SubjectKeyId => "subjectKeyIdentifier",
            ExtensionKind::KeyUsage => "keyUsage",
            ExtensionKind::SubjectAltName => "subjectAltName",
            ExtensionKind::BasicConstraints => "basicConstraints",
            ExtensionKind::CrlDistributionPoints => "cRLDistributionPoints",
            ExtensionKind::AuthorityKeyId => "authorityKeyIdentifier",
            ExtensionKind::ExtendedKeyUsage => "extKeyUsage",
        }
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExtensionKind::SubjectKeyId => "Subject Key Identifier",
            ExtensionKind::KeyUsage => "Key Usage",
            ExtensionKind::SubjectAltName => "Subject Alternative Name",
            ExtensionKind::BasicConstraints => "Basic Constraints",
            ExtensionKind::CrlDistributionPoints => "CRL Distribution Points",
            ExtensionKind::AuthorityKeyId => "Authority Key Identifier",
            ExtensionKind::ExtendedKeyUsage => "Extended Key Usage",
        };
        write!(f, "X509v3 {}", label)
    }
}

/// Payload of one extension kind.
///
/// `parse` reads the DER inside `extnValue`; the octets must hold exactly
/// one element. `to_value` is the inverse.
pub trait Extension: Sized {
    const KIND: ExtensionKind;

    fn parse(value: &OctetString) -> Result<Self>;

    fn to_value(&self) -> OctetString;
}

pub(crate) fn parse_payload<T>(value: &OctetString) -> Result<T>
where
    T: Extension + DecodableFrom<Element>,
    Element: Decoder<Element, T, Error = Error>,
{
    single_element(T::KIND.name(), value.as_bytes())?.decode()
}

pub(crate) fn payload_value<T>(payload: &T) -> OctetString
where
    T: Encoder<T, Element, Error = Infallible>,
    Element: EncodableTo<T>,
{
    let Ok(element) = payload.encode();
    OctetString::from(element.to_der())
}

/*
RFC 5280 Section 4.1.2.9

Extension  ::=  SEQUENCE  {
    extnID      OBJECT IDENTIFIER,
    critical    BOOLEAN DEFAULT FALSE,
    extnValue   OCTET STRING
}
*/

/// One requested extension.
///
/// Values of different kinds never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtensionAttribute {
    SubjectKeyId(SubjectKeyIdentifier),
    KeyUsage(KeyUsage),
    SubjectAltName(SubjectAltName),
    BasicConstraints(BasicConstraints),
    CrlDistributionPoints(CrlDistributionPoints),
    AuthorityKeyId(AuthorityKeyIdentifier),
    ExtendedKeyUsage(ExtendedKeyUsage),
}

impl ExtensionAttribute {
    pub fn kind(&self) -> ExtensionKind {
        match self {
            ExtensionAttribute::SubjectKeyId(_) => ExtensionKind::SubjectKeyId,
            ExtensionAttribute::KeyUsage(_) => ExtensionKind::KeyUsage,
            ExtensionAttribute::SubjectAltName(_) => ExtensionKind::SubjectAltName,
            ExtensionAttribute::BasicConstraints(_) => ExtensionKind::BasicConstraints,
            ExtensionAttribute::CrlDistributionPoints(_) => ExtensionKind::CrlDistributionPoints,
            ExtensionAttribute::AuthorityKeyId(_) => ExtensionKind::AuthorityKeyId,
            ExtensionAttribute::ExtendedKeyUsage(_) => ExtensionKind::ExtendedKeyUsage,
        }
    }

    pub fn oid(&self) -> ObjectIdentifier {
        self.kind().oid()
    }

    /// DER of the payload, as carried in `extnValue`.
    pub fn value(&self) -> OctetString {
        match self {
            ExtensionAttribute::SubjectKeyId(ext) => ext.to_value(),
            ExtensionAttribute::KeyUsage(ext) => ext.to_value(),
            ExtensionAttribute::SubjectAltName(ext) => ext.to_value(),
            ExtensionAttribute::BasicConstraints(ext) => ext.to_value(),
            ExtensionAttribute::CrlDistributionPoints(ext) => ext.to_value(),
            ExtensionAttribute::AuthorityKeyId(ext) => ext.to_value(),
            ExtensionAttribute::ExtendedKeyUsage(ext) => ext.to_value(),
        }
    }

    /// Decodes `value` with the decoder registered for `kind`.
    pub fn parse(kind: ExtensionKind, value: &OctetString) -> Result<Self> {
        match kind {
            ExtensionKind::SubjectKeyId => {
                SubjectKeyIdentifier::parse(value).map(ExtensionAttribute::SubjectKeyId)
            }
            ExtensionKind::KeyUsage => KeyUsage::parse(value).map(ExtensionAttribute::KeyUsage),
            ExtensionKind::SubjectAltName => {
                SubjectAltName::parse(value).map(ExtensionAttribute::SubjectAltName)
            }
            ExtensionKind::BasicConstraints => {
                BasicConstraints::parse(value).map(ExtensionAttribute::BasicConstraints)
            }
            ExtensionKind::CrlDistributionPoints => {
                CrlDistributionPoints::parse(value).map(ExtensionAttribute::CrlDistributionPoints)
            }
            ExtensionKind::AuthorityKeyId => {
                AuthorityKeyIdentifier::parse(value).map(ExtensionAttribute::AuthorityKeyId)
            }
            ExtensionKind::ExtendedKeyUsage => {
                ExtendedKeyUsage::parse(value).map(ExtensionAttribute::ExtendedKeyUsage)
            }
        }
    }
}

impl fmt::Display for ExtensionAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionAttribute::SubjectKeyId(ext) => write!(f, "{}", ext),
            ExtensionAttribute::KeyUsage(ext) => write!(f, "{}", ext),
            ExtensionAttribute::SubjectAltName(ext) => write!(f, "{}", ext),
            ExtensionAttribute::BasicConstraints(ext) => write!(f, "{}", ext),
            ExtensionAttribute::CrlDistributionPoints(ext) => write!(f, "{}", ext),
            ExtensionAttribute::AuthorityKeyId(ext) => write!(f, "{}", ext),
            ExtensionAttribute::ExtendedKeyUsage(ext) => write!(f, "{}", ext),
        }
    }
}

impl DecodableFrom<Element> for ExtensionAttribute {}

impl Decoder<Element, ExtensionAttribute> for Element {
    type Error = Error;

    fn decode(&self) -> Result<ExtensionAttribute> {
        let mut reader = SequenceReader::from_sequence("Extension", self)?;
        let oid = reader.next_oid()?;
        let kind = ExtensionKind::from_oid(oid).ok_or_else(|| {
            debug!("rejecting unknown extension {oid}");
            Error::UnknownOid {
                domain: OidDomain::Extension,
                oid: oid.clone(),
            }
        })?;
        // The model has no criticality, so the flag is read past and dropped.
        if let Some(Element::Boolean(_)) = reader.peek() {
            reader.next("critical")?;
        }
        let value = reader.next_octet_string()?;
        reader.finish()?;

        ExtensionAttribute::parse(kind, value).map_err(|e| {
            debug!("malformed {kind} payload: {e}");
            Error::MalformedPayload {
                kind,
                source: Box::new(e),
            }
        })
    }
}

impl EncodableTo<ExtensionAttribute> for Element {}

impl Encoder<ExtensionAttribute, Element> for ExtensionAttribute {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        Ok(Element::Sequence(vec![
            Element::ObjectIdentifier(self.oid()),
            Element::OctetString(self.value()),
        ]))
    }
}
