use std::convert::Infallible;
use std::fmt;

use asn1::{Element, OctetString};
use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use serde::{Deserialize, Serialize};

use super::general_name::{GeneralName, decode_general_names, encode_general_names};
use super::{Extension, ExtensionKind, parse_payload, payload_value};
use crate::error::{Error, Result};

/*
RFC 5280 Section 4.2.1.6
SubjectAltName ::= GeneralNames
*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectAltName(Vec<GeneralName>);

impl SubjectAltName {
    pub fn new(names: Vec<GeneralName>) -> Self {
        SubjectAltName(names)
    }

    pub fn names(&self) -> &[GeneralName] {
        &self.0
    }
}

impl fmt::Display for SubjectAltName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.0.iter().map(|n| n.to_string()).collect::<Vec<_>>();
        write!(f, "{}", names.join(", "))
    }
}

impl Extension for SubjectAltName {
    const KIND: ExtensionKind = ExtensionKind::SubjectAltName;

    fn parse(value: &OctetString) -> Result<Self> {
        parse_payload(value)
    }

    fn to_value(&self) -> OctetString {
        payload_value(self)
    }
}

impl DecodableFrom<Element> for SubjectAltName {}

impl Decoder<Element, SubjectAltName> for Element {
    type Error = Error;

    fn decode(&self) -> Result<SubjectAltName> {
        match self {
            Element::Sequence(names) => decode_general_names(names).map(SubjectAltName),
            other => Err(Error::unexpected("SubjectAltName", "SEQUENCE", other)),
        }
    }
}

impl EncodableTo<SubjectAltName> for Element {}

impl Encoder<SubjectAltName, Element> for SubjectAltName {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        Ok(Element::Sequence(encode_general_names(&self.0)))
    }
}
