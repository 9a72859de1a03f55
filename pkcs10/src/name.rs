//! Distinguished names
//!
//! Defined in RFC 5280 Section 4.1.2.4
//!
//! ```asn1
//! Name ::= CHOICE { rdnSequence RDNSequence }
//!
//! RDNSequence ::= SEQUENCE OF RelativeDistinguishedName
//!
//! RelativeDistinguishedName ::= SET SIZE (1..MAX) OF AttributeTypeAndValue
//!
//! AttributeTypeAndValue ::= SEQUENCE {
//!     type     AttributeType,
//!     value    AttributeValue
//! }
//! ```
//!
//! Every pair is written as its own single-valued RDN, in list order, and
//! values are always written as UTF8String. Nothing is sorted, merged or
//! deduplicated, so a decoded name keeps the order it was read in.

use std::convert::Infallible;
use std::fmt;

use asn1::Element;
use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, OidDomain, Result};
use crate::oid::AttributeKind;
use crate::reader::SequenceReader;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAttribute {
    pub kind: AttributeKind,
    pub value: String,
}

impl NameAttribute {
    pub fn new(kind: AttributeKind, value: impl Into<String>) -> Self {
        NameAttribute {
            kind,
            value: value.into(),
        }
    }
}

impl fmt::Display for NameAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind, self.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistinguishedName(Vec<NameAttribute>);

impl DistinguishedName {
    pub fn new(attributes: Vec<NameAttribute>) -> Self {
        DistinguishedName(attributes)
    }

    pub fn push(&mut self, kind: AttributeKind, value: impl Into<String>) {
        self.0.push(NameAttribute::new(kind, value));
    }

    pub fn attributes(&self) -> &[NameAttribute] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &NameAttribute> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(AttributeKind, String)> for DistinguishedName {
    fn from_iter<I: IntoIterator<Item = (AttributeKind, String)>>(iter: I) -> Self {
        DistinguishedName(
            iter.into_iter()
                .map(|(kind, value)| NameAttribute { kind, value })
                .collect(),
        )
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .0
            .iter()
            .map(|attr| attr.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}", formatted)
    }
}

impl DecodableFrom<Element> for NameAttribute {}

impl Decoder<Element, NameAttribute> for Element {
    type Error = Error;

    fn decode(&self) -> Result<NameAttribute> {
        let mut reader = SequenceReader::from_sequence("AttributeTypeAndValue", self)?;
        let oid = reader.next_oid()?;
        let kind = AttributeKind::from_oid(oid).ok_or_else(|| {
            debug!("rejecting name attribute with unknown type {oid}");
            Error::UnknownOid {
                domain: OidDomain::AttributeType,
                oid: oid.clone(),
            }
        })?;
        let value = match reader.next("attribute value")? {
            Element::UTF8String(s) | Element::PrintableString(s) | Element::IA5String(s) => {
                s.clone()
            }
            other => {
                return Err(Error::unexpected(
                    "AttributeTypeAndValue",
                    "directory string",
                    other,
                ));
            }
        };
        reader.finish()?;
        Ok(NameAttribute { kind, value })
    }
}

impl EncodableTo<NameAttribute> for Element {}

impl Encoder<NameAttribute, Element> for NameAttribute {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        Ok(Element::Sequence(vec![
            Element::ObjectIdentifier(self.kind.oid()),
            Element::UTF8String(self.value.clone()),
        ]))
    }
}

/// Decodes a single-valued RDN, `SET { AttributeTypeAndValue }`.
///
/// Multi-valued RDNs are rejected since they have no place in the flat model.
pub(crate) fn decode_rdn(element: &Element) -> Result<NameAttribute> {
    match element {
        Element::Set(entries) => {
            let mut reader = SequenceReader::new("RelativeDistinguishedName", entries);
            let attribute: NameAttribute = reader.next("AttributeTypeAndValue")?.decode()?;
            reader.finish()?;
            Ok(attribute)
        }
        other => Err(Error::unexpected("RelativeDistinguishedName", "SET", other)),
    }
}

pub(crate) fn encode_rdn(attribute: &NameAttribute) -> Element {
    let Ok(entry) = attribute.encode();
    Element::Set(vec![entry])
}

impl DecodableFrom<Element> for DistinguishedName {}

impl Decoder<Element, DistinguishedName> for Element {
    type Error = Error;

    fn decode(&self) -> Result<DistinguishedName> {
        match self {
            Element::Sequence(rdns) => rdns
                .iter()
                .map(decode_rdn)
                .collect::<Result<Vec<_>>>()
                .map(DistinguishedName),
            other => Err(Error::unexpected("Name", "SEQUENCE", other)),
        }
    }
}

impl EncodableTo<DistinguishedName> for Element {}

impl Encoder<DistinguishedName, Element> for DistinguishedName {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        Ok(Element::Sequence(self.0.iter().map(encode_rdn).collect()))
    }
}
