use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;

use asn1::{Element, OctetString};
use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use serde::{Deserialize, Serialize};

use super::named_bits::{NamedBit, decode_named_bits, encode_named_bits};
use super::{Extension, ExtensionKind, parse_payload, payload_value};
use crate::error::{Error, Result};

/*
RFC 5280 Section 4.2.1.3
KeyUsage ::= BIT STRING {
    digitalSignature        (0),
    nonRepudiation          (1), -- renamed to contentCommitment
    keyEncipherment         (2),
    dataEncipherment        (3),
    keyAgreement            (4),
    keyCertSign             (5),
    cRLSign                 (6),
    encipherOnly            (7),
    decipherOnly            (8)
}
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyUsageBit {
    DigitalSignature,
    ContentCommitment,
    KeyEncipherment,
    DataEncipherment,
    KeyAgreement,
    KeyCertSign,
    #[serde(rename = "cRLSign")]
    CrlSign,
    EncipherOnly,
    DecipherOnly,
}

impl NamedBit for KeyUsageBit {
    const ALL: &'static [Self] = &[
        KeyUsageBit::DigitalSignature,
        KeyUsageBit::ContentCommitment,
        KeyUsageBit::KeyEncipherment,
        KeyUsageBit::DataEncipherment,
        KeyUsageBit::KeyAgreement,
        KeyUsageBit::KeyCertSign,
        KeyUsageBit::CrlSign,
        KeyUsageBit::EncipherOnly,
        KeyUsageBit::DecipherOnly,
    ];

    fn bit(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for KeyUsageBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyUsageBit::DigitalSignature => "Digital Signature",
            KeyUsageBit::ContentCommitment => "Non Repudiation",
            KeyUsageBit::KeyEncipherment => "Key Encipherment",
            KeyUsageBit::DataEncipherment => "Data Encipherment",
            KeyUsageBit::KeyAgreement => "Key Agreement",
            KeyUsageBit::KeyCertSign => "Certificate Sign",
            KeyUsageBit::CrlSign => "CRL Sign",
            KeyUsageBit::EncipherOnly => "Encipher Only",
            KeyUsageBit::DecipherOnly => "Decipher Only",
        };
        write!(f, "{}", name)
    }
}

/// Set of key usages. Order of construction does not matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyUsage(BTreeSet<KeyUsageBit>);

impl KeyUsage {
    pub fn new(bits: impl IntoIterator<Item = KeyUsageBit>) -> Self {
        KeyUsage(bits.into_iter().collect())
    }

    pub fn contains(&self, bit: KeyUsageBit) -> bool {
        self.0.contains(&bit)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyUsageBit> {
        self.0.iter()
    }
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let usages = self.0.iter().map(|b| b.to_string()).collect::<Vec<_>>();
        write!(f, "{}", usages.join(", "))
    }
}

impl Extension for KeyUsage {
    const KIND: ExtensionKind = ExtensionKind::KeyUsage;

    fn parse(value: &OctetString) -> Result<Self> {
        parse_payload(value)
    }

    fn to_value(&self) -> OctetString {
        payload_value(self)
    }
}

impl DecodableFrom<Element> for KeyUsage {}

impl Decoder<Element, KeyUsage> for Element {
    type Error = Error;

    fn decode(&self) -> Result<KeyUsage> {
        match self {
            Element::BitString(bs) => Ok(KeyUsage(decode_named_bits(bs))),
            other => Err(Error::unexpected("KeyUsage", "BIT STRING", other)),
        }
    }
}

impl EncodableTo<KeyUsage> for Element {}

impl Encoder<KeyUsage, Element> for KeyUsage {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        Ok(Element::BitString(encode_named_bits(&self.0)))
    }
}
