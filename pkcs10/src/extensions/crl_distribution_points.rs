use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;

use asn1::{BitString, Element, OctetString};
use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use serde::{Deserialize, Serialize};

use super::general_name::{GeneralName, decode_general_names, encode_general_names};
use super::named_bits::{NamedBit, decode_named_bits, encode_named_bits};
use super::{Extension, ExtensionKind, parse_payload, payload_value};
use crate::error::{Error, Result};
use crate::name::NameAttribute;
use crate::reader::SequenceReader;

/*
RFC 5280 Section 4.2.1.13

CRLDistributionPoints ::= SEQUENCE SIZE (1..MAX) OF DistributionPoint

DistributionPoint ::= SEQUENCE {
    distributionPoint       [0]     DistributionPointName OPTIONAL,
    reasons                 [1]     ReasonFlags OPTIONAL,
    cRLIssuer               [2]     GeneralNames OPTIONAL }

DistributionPointName ::= CHOICE {
    fullName                [0]     GeneralNames,
    nameRelativeToCRLIssuer [1]     RelativeDistinguishedName }

ReasonFlags ::= BIT STRING {
    unused                  (0),
    keyCompromise           (1),
    cACompromise            (2),
    affiliationChanged      (3),
    superseded              (4),
    cessationOfOperation    (5),
    certificateHold         (6),
    privilegeWithdrawn      (7),
    aACompromise            (8) }
*/

const CONTEXT: &str = "DistributionPoint";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrlDistributionPoints(Vec<DistributionPoint>);

impl CrlDistributionPoints {
    pub fn new(points: Vec<DistributionPoint>) -> Self {
        CrlDistributionPoints(points)
    }

    pub fn points(&self) -> &[DistributionPoint] {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_point: Option<DistributionPointName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasons: Option<ReasonFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crl_issuer: Option<Vec<GeneralName>>,
}

/// The relative form holds a single-valued RDN, matching the name model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DistributionPointName {
    FullName(Vec<GeneralName>),
    NameRelativeToCrlIssuer(NameAttribute),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReasonFlag {
    KeyCompromise = 1,
    #[serde(rename = "cACompromise")]
    CaCompromise = 2,
    AffiliationChanged = 3,
    Superseded = 4,
    CessationOfOperation = 5,
    CertificateHold = 6,
    PrivilegeWithdrawn = 7,
    #[serde(rename = "aACompromise")]
    AaCompromise = 8,
}

impl NamedBit for ReasonFlag {
    const ALL: &'static [Self] = &[
        ReasonFlag::KeyCompromise,
        ReasonFlag::CaCompromise,
        ReasonFlag::AffiliationChanged,
        ReasonFlag::Superseded,
        ReasonFlag::CessationOfOperation,
        ReasonFlag::CertificateHold,
        ReasonFlag::PrivilegeWithdrawn,
        ReasonFlag::AaCompromise,
    ];

    fn bit(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ReasonFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReasonFlag::KeyCompromise => "Key Compromise",
            ReasonFlag::CaCompromise => "CA Compromise",
            ReasonFlag::AffiliationChanged => "Affiliation Changed",
            ReasonFlag::Superseded => "Superseded",
            ReasonFlag::CessationOfOperation => "Cessation Of Operation",
            ReasonFlag::CertificateHold => "Certificate Hold",
            ReasonFlag::PrivilegeWithdrawn => "Privilege Withdrawn",
            ReasonFlag::AaCompromise => "AA Compromise",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReasonFlags(BTreeSet<ReasonFlag>);

impl ReasonFlags {
    pub fn new(flags: impl IntoIterator<Item = ReasonFlag>) -> Self {
        ReasonFlags(flags.into_iter().collect())
    }

    pub fn contains(&self, flag: ReasonFlag) -> bool {
        self.0.contains(&flag)
    }
}

impl fmt::Display for ReasonFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = self.0.iter().map(|r| r.to_string()).collect::<Vec<_>>();
        write!(f, "{}", flags.join(", "))
    }
}

fn join_names(names: &[GeneralName]) -> String {
    names
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for DistributionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        match &self.distribution_point {
            Some(DistributionPointName::FullName(names)) => {
                parts.push(format!("Full Name: {}", join_names(names)))
            }
            Some(DistributionPointName::NameRelativeToCrlIssuer(rdn)) => {
                parts.push(format!("Relative Name: {}", rdn))
            }
            None => {}
        }
        if let Some(reasons) = &self.reasons {
            parts.push(format!("Reasons: {}", reasons));
        }
        if let Some(issuer) = &self.crl_issuer {
            parts.push(format!("CRL Issuer: {}", join_names(issuer)));
        }
        write!(f, "{}", parts.join("; "))
    }
}

impl fmt::Display for CrlDistributionPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let points = self.0.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        write!(f, "{}", points.join(" | "))
    }
}

impl Extension for CrlDistributionPoints {
    const KIND: ExtensionKind = ExtensionKind::CrlDistributionPoints;

    fn parse(value: &OctetString) -> Result<Self> {
        parse_payload(value)
    }

    fn to_value(&self) -> OctetString {
        payload_value(self)
    }
}

impl DecodableFrom<Element> for CrlDistributionPoints {}

impl Decoder<Element, CrlDistributionPoints> for Element {
    type Error = Error;

    fn decode(&self) -> Result<CrlDistributionPoints> {
        match self {
            Element::Sequence(points) => points
                .iter()
                .map(|point| point.decode())
                .collect::<Result<Vec<DistributionPoint>>>()
                .map(CrlDistributionPoints),
            other => Err(Error::unexpected("CRLDistributionPoints", "SEQUENCE", other)),
        }
    }
}

impl EncodableTo<CrlDistributionPoints> for Element {}

impl Encoder<CrlDistributionPoints, Element> for CrlDistributionPoints {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        Ok(Element::Sequence(
            self.0
                .iter()
                .map(|point| {
                    let Ok(element) = point.encode();
                    element
                })
                .collect(),
        ))
    }
}

impl DecodableFrom<Element> for DistributionPoint {}

impl Decoder<Element, DistributionPoint> for Element {
    type Error = Error;

    fn decode(&self) -> Result<DistributionPoint> {
        let mut reader = SequenceReader::from_sequence(CONTEXT, self)?;

        let distribution_point = match reader.peek() {
            Some(Element::ContextSpecific { slot: 0, elements }) => {
                reader.next("distributionPoint")?;
                let mut inner = SequenceReader::new(CONTEXT, elements);
                let name: DistributionPointName = inner.next("DistributionPointName")?.decode()?;
                inner.finish()?;
                Some(name)
            }
            _ => None,
        };

        let reasons = match reader.peek() {
            Some(Element::ContextSpecificPrimitive { slot: 1, data }) => {
                reader.next("reasons")?;
                let bits = BitString::try_from(data.as_slice())?;
                Some(ReasonFlags(decode_named_bits(&bits)))
            }
            _ => None,
        };

        let crl_issuer = match reader.peek() {
            Some(Element::ContextSpecific { slot: 2, elements }) => {
                reader.next("cRLIssuer")?;
                Some(decode_general_names(elements)?)
            }
            _ => None,
        };

        reader.finish()?;
        Ok(DistributionPoint {
            distribution_point,
            reasons,
            crl_issuer,
        })
    }
}

impl EncodableTo<DistributionPoint> for Element {}

impl Encoder<DistributionPoint, Element> for DistributionPoint {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        let mut elements = Vec::new();
        if let Some(name) = &self.distribution_point {
            let Ok(name) = name.encode();
            elements.push(Element::ContextSpecific {
                slot: 0,
                elements: vec![name],
            });
        }
        if let Some(reasons) = &self.reasons {
            elements.push(Element::ContextSpecificPrimitive {
                slot: 1,
                data: Vec::from(&encode_named_bits(&reasons.0)),
            });
        }
        if let Some(issuer) = &self.crl_issuer {
            elements.push(Element::ContextSpecific {
                slot: 2,
                elements: encode_general_names(issuer),
            });
        }
        Ok(Element::Sequence(elements))
    }
}

impl DecodableFrom<Element> for DistributionPointName {}

impl Decoder<Element, DistributionPointName> for Element {
    type Error = Error;

    fn decode(&self) -> Result<DistributionPointName> {
        match self {
            Element::ContextSpecific { slot: 0, elements } => {
                decode_general_names(elements).map(DistributionPointName::FullName)
            }
            Element::ContextSpecific { slot: 1, elements } => {
                let mut reader = SequenceReader::new("nameRelativeToCRLIssuer", elements);
                let attribute: NameAttribute = reader.next("AttributeTypeAndValue")?.decode()?;
                reader.finish()?;
                Ok(DistributionPointName::NameRelativeToCrlIssuer(attribute))
            }
            other => Err(Error::unexpected(
                "DistributionPointName",
                "fullName [0] or nameRelativeToCRLIssuer [1]",
                other,
            )),
        }
    }
}

impl EncodableTo<DistributionPointName> for Element {}

impl Encoder<DistributionPointName, Element> for DistributionPointName {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        let element = match self {
            DistributionPointName::FullName(names) => Element::ContextSpecific {
                slot: 0,
                elements: encode_general_names(names),
            },
            DistributionPointName::NameRelativeToCrlIssuer(attribute) => {
                let Ok(entry) = attribute.encode();
                Element::ContextSpecific {
                    slot: 1,
                    elements: vec![entry],
                }
            }
        };
        Ok(element)
    }
}
