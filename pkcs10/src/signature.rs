use std::convert::Infallible;

use asn1::{BitString, Element, OctetString};
use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Raw signature octets produced by an external signer.
///
/// Written as a BIT STRING with zero unused bits. A signature with unused
/// bits is rejected on decode, since dropping them would change the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureValue(OctetString);

impl SignatureValue {
    pub fn new(bytes: Vec<u8>) -> Self {
        SignatureValue(OctetString::from(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0.into_bytes()
    }
}

impl From<Vec<u8>> for SignatureValue {
    fn from(bytes: Vec<u8>) -> Self {
        SignatureValue::new(bytes)
    }
}

impl DecodableFrom<Element> for SignatureValue {}

impl Decoder<Element, SignatureValue> for Element {
    type Error = Error;

    fn decode(&self) -> Result<SignatureValue> {
        match self {
            Element::BitString(bs) if bs.unused_bits() == 0 => {
                Ok(SignatureValue::new(bs.as_bytes().to_vec()))
            }
            Element::BitString(bs) => Err(Error::UnexpectedTagShape {
                context: "signature",
                expected: "octet-aligned BIT STRING",
                found: format!("{} unused bits", bs.unused_bits()),
            }),
            other => Err(Error::unexpected("signature", "BIT STRING", other)),
        }
    }
}

impl EncodableTo<SignatureValue> for Element {}

impl Encoder<SignatureValue, Element> for SignatureValue {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        Ok(Element::BitString(BitString::from_bytes(self.as_bytes().to_vec())))
    }
}
