use std::convert::Infallible;
use std::fmt;

use asn1::{Element, OctetString};
use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use serde::{Deserialize, Serialize};

use super::{Extension, ExtensionKind, parse_payload, payload_value};
use crate::error::{Error, Result};

/*
RFC 5280 Section 4.2.1.2
SubjectKeyIdentifier ::= KeyIdentifier
KeyIdentifier ::= OCTET STRING
*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectKeyIdentifier(OctetString);

impl SubjectKeyIdentifier {
    pub fn new(key_identifier: Vec<u8>) -> Self {
        SubjectKeyIdentifier(OctetString::from(key_identifier))
    }

    pub fn key_identifier(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for SubjectKeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self
            .0
            .as_bytes()
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>();
        write!(f, "{}", hex.join(":"))
    }
}

impl Extension for SubjectKeyIdentifier {
    const KIND: ExtensionKind = ExtensionKind::SubjectKeyId;

    fn parse(value: &OctetString) -> Result<Self> {
        parse_payload(value)
    }

    fn to_value(&self) -> OctetString {
        payload_value(self)
    }
}

impl DecodableFrom<Element> for SubjectKeyIdentifier {}

impl Decoder<Element, SubjectKeyIdentifier> for Element {
    type Error = Error;

    fn decode(&self) -> Result<SubjectKeyIdentifier> {
        match self {
            Element::OctetString(os) => Ok(SubjectKeyIdentifier(os.clone())),
            other => Err(Error::unexpected("SubjectKeyIdentifier", "OCTET STRING", other)),
        }
    }
}

impl EncodableTo<SubjectKeyIdentifier> for Element {}

impl Encoder<SubjectKeyIdentifier, Element> for SubjectKeyIdentifier {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        Ok(Element::OctetString(self.0.clone()))
    }
}
