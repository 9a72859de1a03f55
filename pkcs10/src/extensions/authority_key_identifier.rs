use std::convert::Infallible;
use std::fmt;

use asn1::{Element, Integer, OctetString};
use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use serde::{Deserialize, Serialize};

use super::general_name::{GeneralName, decode_general_names, encode_general_names};
use super::{Extension, ExtensionKind, parse_payload, payload_value};
use crate::error::{Error, Result};
use crate::reader::SequenceReader;

/*
RFC 5280 Section 4.2.1.1
AuthorityKeyIdentifier ::= SEQUENCE {
    keyIdentifier             [0] KeyIdentifier           OPTIONAL,
    authorityCertIssuer       [1] GeneralNames            OPTIONAL,
    authorityCertSerialNumber [2] CertificateSerialNumber OPTIONAL
}

KeyIdentifier ::= OCTET STRING
CertificateSerialNumber ::= INTEGER
*/

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityKeyIdentifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_identifier: Option<OctetString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority_cert_issuer: Option<Vec<GeneralName>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority_cert_serial_number: Option<Integer>,
}

impl fmt::Display for AuthorityKeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(key_id) = &self.key_identifier {
            let hex = key_id
                .as_bytes()
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>();
            parts.push(format!("keyid:{}", hex.join(":")));
        }
        if let Some(issuer) = &self.authority_cert_issuer {
            for name in issuer {
                parts.push(name.to_string());
            }
        }
        if let Some(serial) = &self.authority_cert_serial_number {
            parts.push(format!("serial:{}", serial));
        }
        write!(f, "{}", parts.join(", "))
    }
}

impl Extension for AuthorityKeyIdentifier {
    const KIND: ExtensionKind = ExtensionKind::AuthorityKeyId;

    fn parse(value: &OctetString) -> Result<Self> {
        parse_payload(value)
    }

    fn to_value(&self) -> OctetString {
        payload_value(self)
    }
}

impl DecodableFrom<Element> for AuthorityKeyIdentifier {}

impl Decoder<Element, AuthorityKeyIdentifier> for Element {
    type Error = Error;

    fn decode(&self) -> Result<AuthorityKeyIdentifier> {
        let mut reader = SequenceReader::from_sequence("AuthorityKeyIdentifier", self)?;

        let key_identifier = match reader.peek() {
            Some(Element::ContextSpecificPrimitive { slot: 0, data }) => {
                reader.next("keyIdentifier")?;
                Some(OctetString::from(data.as_slice()))
            }
            _ => None,
        };

        let authority_cert_issuer = match reader.peek() {
            Some(Element::ContextSpecific { slot: 1, elements }) => {
                reader.next("authorityCertIssuer")?;
                Some(decode_general_names(elements)?)
            }
            _ => None,
        };

        let authority_cert_serial_number = match reader.peek() {
            Some(Element::ContextSpecificPrimitive { slot: 2, data }) => {
                reader.next("authorityCertSerialNumber")?;
                Some(Integer::try_from(data.as_slice())?)
            }
            _ => None,
        };

        reader.finish()?;
        Ok(AuthorityKeyIdentifier {
            key_identifier,
            authority_cert_issuer,
            authority_cert_serial_number,
        })
    }
}

impl EncodableTo<AuthorityKeyIdentifier> for Element {}

impl Encoder<AuthorityKeyIdentifier, Element> for AuthorityKeyIdentifier {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        let mut elements = Vec::new();
        if let Some(key_id) = &self.key_identifier {
            elements.push(Element::ContextSpecificPrimitive {
                slot: 0,
                data: key_id.as_bytes().to_vec(),
            });
        }
        if let Some(issuer) = &self.authority_cert_issuer {
            elements.push(Element::ContextSpecific {
                slot: 1,
                elements: encode_general_names(issuer),
            });
        }
        if let Some(serial) = &self.authority_cert_serial_number {
            elements.push(Element::ContextSpecificPrimitive {
                slot: 2,
                data: serial.to_signed_bytes_be(),
            });
        }
        Ok(Element::Sequence(elements))
    }
}
