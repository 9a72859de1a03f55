use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::LazyLock;

use asn1::{Element, ObjectIdentifier, OctetString};
use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Extension, ExtensionKind, parse_payload, payload_value};
use crate::error::{Error, OidDomain, Result};

/*
RFC 5280 Section 4.2.1.12
ExtendedKeyUsage ::= SEQUENCE SIZE (1..MAX) OF KeyPurposeId
KeyPurposeId ::= OBJECT IDENTIFIER
*/

/// Key purposes under id-kp (1.3.6.1.5.5.7.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyPurpose {
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    #[serde(rename = "OCSPSigning")]
    OcspSigning,
}

static BY_OID: LazyLock<HashMap<ObjectIdentifier, KeyPurpose>> = LazyLock::new(|| {
    KeyPurpose::ALL
        .iter()
        .map(|purpose| (purpose.oid(), *purpose))
        .collect()
});

impl KeyPurpose {
    pub const ALL: [KeyPurpose; 6] = [
        KeyPurpose::ServerAuth,
        KeyPurpose::ClientAuth,
        KeyPurpose::CodeSigning,
        KeyPurpose::EmailProtection,
        KeyPurpose::TimeStamping,
        KeyPurpose::OcspSigning,
    ];

    pub fn oid(&self) -> ObjectIdentifier {
        let arcs: &'static [u64] = match self {
            KeyPurpose::ServerAuth => &[1, 3, 6, 1, 5, 5, 7, 3, 1],
            KeyPurpose::ClientAuth => &[1, 3, 6, 1, 5, 5, 7, 3, 2],
            KeyPurpose::CodeSigning => &[1, 3, 6, 1, 5, 5, 7, 3, 3],
            KeyPurpose::EmailProtection => &[1, 3, 6, 1, 5, 5, 7, 3, 4],
            KeyPurpose::TimeStamping => &[1, 3, 6, 1, 5, 5, 7, 3, 8],
            KeyPurpose::OcspSigning => &[1, 3, 6, 1, 5, 5, 7, 3, 9],
        };
        ObjectIdentifier::from_static(arcs)
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Option<KeyPurpose> {
        BY_OID.get(oid).copied()
    }
}

impl fmt::Display for KeyPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyPurpose::ServerAuth => "TLS Web Server Authentication",
            KeyPurpose::ClientAuth => "TLS Web Client Authentication",
            KeyPurpose::CodeSigning => "Code Signing",
            KeyPurpose::EmailProtection => "E-mail Protection",
            KeyPurpose::TimeStamping => "Time Stamping",
            KeyPurpose::OcspSigning => "OCSP Signing",
        };
        write!(f, "{}", name)
    }
}

/// Ordered list of key purposes, kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtendedKeyUsage(Vec<KeyPurpose>);

impl ExtendedKeyUsage {
    pub fn new(purposes: Vec<KeyPurpose>) -> Self {
        ExtendedKeyUsage(purposes)
    }

    pub fn purposes(&self) -> &[KeyPurpose] {
        &self.0
    }
}

impl fmt::Display for ExtendedKeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let purposes = self.0.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        write!(f, "{}", purposes.join(", "))
    }
}

impl Extension for ExtendedKeyUsage {
    const KIND: ExtensionKind = ExtensionKind::ExtendedKeyUsage;

    fn parse(value: &OctetString) -> Result<Self> {
        parse_payload(value)
    }

    fn to_value(&self) -> OctetString {
        payload_value(self)
    }
}

impl DecodableFrom<Element> for ExtendedKeyUsage {}

impl Decoder<Element, ExtendedKeyUsage> for Element {
    type Error = Error;

    fn decode(&self) -> Result<ExtendedKeyUsage> {
        match self {
            Element::Sequence(elements) => elements
                .iter()
                .map(|elem| match elem {
                    Element::ObjectIdentifier(oid) => KeyPurpose::from_oid(oid).ok_or_else(|| {
                        debug!("rejecting unknown key purpose {oid}");
                        Error::UnknownOid {
                            domain: OidDomain::KeyPurpose,
                            oid: oid.clone(),
                        }
                    }),
                    other => Err(Error::unexpected("ExtendedKeyUsage", "OBJECT IDENTIFIER", other)),
                })
                .collect::<Result<Vec<_>>>()
                .map(ExtendedKeyUsage),
            other => Err(Error::unexpected("ExtendedKeyUsage", "SEQUENCE", other)),
        }
    }
}

impl EncodableTo<ExtendedKeyUsage> for Element {}

impl Encoder<ExtendedKeyUsage, Element> for ExtendedKeyUsage {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        Ok(Element::Sequence(
            self.0
                .iter()
                .map(|purpose| Element::ObjectIdentifier(purpose.oid()))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_purpose_oid_round_trip() {
        for purpose in KeyPurpose::ALL {
            assert_eq!(Some(purpose), KeyPurpose::from_oid(&purpose.oid()));
        }
    }

    #[test]
    fn test_der_layout() {
        let eku = ExtendedKeyUsage::new(vec![KeyPurpose::ServerAuth, KeyPurpose::CodeSigning]);
        assert_eq!(
            &[
                0x30, 0x14, 0x06, 0x08, 0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x01, 0x06, 0x08,
                0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x03,
            ],
            eku.to_value().as_bytes()
        );
    }

    #[rstest(
        purposes,
        case(vec![KeyPurpose::ServerAuth, KeyPurpose::CodeSigning]),
        case(vec![KeyPurpose::CodeSigning, KeyPurpose::ServerAuth]),
        case(KeyPurpose::ALL.to_vec()),
        case(vec![])
    )]
    fn test_round_trip_keeps_order(purposes: Vec<KeyPurpose>) {
        let eku = ExtendedKeyUsage::new(purposes);
        assert_eq!(eku, ExtendedKeyUsage::parse(&eku.to_value()).unwrap());
    }

    #[test]
    fn test_unknown_purpose() {
        // anyExtendedKeyUsage 2.5.29.37.0 is not in the closed set
        let value = OctetString::from(vec![0x30, 0x06, 0x06, 0x04, 0x55, 0x1d, 0x25, 0x00]);
        let err = ExtendedKeyUsage::parse(&value).unwrap_err();
        assert_eq!(ErrorKind::UnknownOid, err.kind());
    }

    #[test]
    fn test_serde() {
        let eku = ExtendedKeyUsage::new(vec![KeyPurpose::ServerAuth, KeyPurpose::OcspSigning]);
        let json = serde_json::to_string(&eku).unwrap();
        assert_eq!(r#"["serverAuth","OCSPSigning"]"#, json);
    }
}
