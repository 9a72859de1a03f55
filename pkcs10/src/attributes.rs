//! The `[0] attributes` field of a certification request.
//!
//! ```asn1
//! Attributes ::= SET OF Attribute
//!
//! Attribute ::= SEQUENCE {
//!     type   OBJECT IDENTIFIER,
//!     values SET SIZE (1..MAX) OF AttributeValue
//! }
//!
//! extensionRequest ATTRIBUTE ::= {
//!     WITH SYNTAX ExtensionRequest
//!     ID pkcs-9-at-extensionRequest
//! }
//!
//! ExtensionRequest ::= Extensions
//! Extensions ::= SEQUENCE SIZE (1..MAX) OF Extension
//! ```
//!
//! The only attribute understood is a single extensionRequest. An empty list
//! is written as an empty `[0]`.

use std::convert::Infallible;

use asn1::Element;
use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, OidDomain, Result};
use crate::extensions::{ExtensionAttribute, ExtensionKind};
use crate::oid::EXTENSION_REQUEST;
use crate::reader::SequenceReader;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionAttributeList(Vec<ExtensionAttribute>);

impl ExtensionAttributeList {
    pub fn new(extensions: Vec<ExtensionAttribute>) -> Self {
        ExtensionAttributeList(extensions)
    }

    pub fn push(&mut self, extension: ExtensionAttribute) {
        self.0.push(extension);
    }

    pub fn extensions(&self) -> &[ExtensionAttribute] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtensionAttribute> {
        self.0.iter()
    }

    /// First extension of `kind`, if any.
    pub fn get(&self, kind: ExtensionKind) -> Option<&ExtensionAttribute> {
        self.0.iter().find(|ext| ext.kind() == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<ExtensionAttribute>> for ExtensionAttributeList {
    fn from(extensions: Vec<ExtensionAttribute>) -> Self {
        ExtensionAttributeList(extensions)
    }
}

fn malformed(cause: Error) -> Error {
    debug!("malformed attributes container: {cause}");
    Error::MalformedAttributes(Box::new(cause))
}

/// Unwraps the container down to the extension SEQUENCE's children.
fn requested_extensions(attributes: &[Element]) -> Result<&[Element]> {
    let mut reader = SequenceReader::new("attributes", attributes);
    if reader.peek().is_none() {
        return Ok(&[]);
    }
    let attribute = reader.next("Attribute")?;
    reader.finish()?;

    let mut attribute = SequenceReader::from_sequence("Attribute", attribute)?;
    let oid = attribute.next_oid()?;
    if oid != &EXTENSION_REQUEST {
        return Err(Error::UnknownOid {
            domain: OidDomain::Attribute,
            oid: oid.clone(),
        });
    }
    let values = match attribute.next("values")? {
        Element::Set(values) => values,
        other => return Err(Error::unexpected("Attribute", "SET", other)),
    };
    attribute.finish()?;

    let mut values = SequenceReader::new("extensionRequest", values);
    let extensions = values.next("Extensions")?;
    values.finish()?;

    match extensions {
        Element::Sequence(extensions) if extensions.is_empty() => Err(Error::Truncated {
            context: "Extensions",
            expected: "at least one Extension",
        }),
        Element::Sequence(extensions) => Ok(extensions),
        other => Err(Error::unexpected("Extensions", "SEQUENCE", other)),
    }
}

impl DecodableFrom<Element> for ExtensionAttributeList {}

impl Decoder<Element, ExtensionAttributeList> for Element {
    type Error = Error;

    fn decode(&self) -> Result<ExtensionAttributeList> {
        let extensions = match self {
            Element::ContextSpecific { slot: 0, elements } => {
                requested_extensions(elements).map_err(malformed)?
            }
            other => {
                return Err(malformed(Error::unexpected("attributes", "[0]", other)));
            }
        };
        extensions
            .iter()
            .map(|ext| ext.decode())
            .collect::<Result<Vec<ExtensionAttribute>>>()
            .map(ExtensionAttributeList)
    }
}

impl EncodableTo<ExtensionAttributeList> for Element {}

impl Encoder<ExtensionAttributeList, Element> for ExtensionAttributeList {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        if self.0.is_empty() {
            return Ok(Element::ContextSpecific {
                slot: 0,
                elements: vec![],
            });
        }
        let extensions = self
            .0
            .iter()
            .map(|ext| {
                let Ok(element) = ext.encode();
                element
            })
            .collect();
        Ok(Element::ContextSpecific {
            slot: 0,
            elements: vec![Element::Sequence(vec![
                Element::ObjectIdentifier(EXTENSION_REQUEST),
                Element::Set(vec![Element::Sequence(extensions)]),
            ])],
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use asn1::{ASN1Object, ObjectIdentifier, OctetString};
    use rstest::rstest;

    use super::*;
    use crate::error::ErrorKind;
    use crate::extensions::{
        BasicConstraints, ExtendedKeyUsage, KeyPurpose, KeyUsage, KeyUsageBit,
        SubjectKeyIdentifier,
    };

    fn encode(list: &ExtensionAttributeList) -> Element {
        let Ok(element) = list.encode();
        element
    }

    fn decode(element: &Element) -> Result<ExtensionAttributeList> {
        element.decode()
    }

    fn sample() -> ExtensionAttributeList {
        ExtensionAttributeList::new(vec![
            ExtensionAttribute::ExtendedKeyUsage(ExtendedKeyUsage::new(vec![
                KeyPurpose::ServerAuth,
                KeyPurpose::CodeSigning,
            ])),
            ExtensionAttribute::KeyUsage(KeyUsage::new([
                KeyUsageBit::CrlSign,
                KeyUsageBit::DigitalSignature,
            ])),
        ])
    }

    fn wrap(attributes: Vec<Element>) -> Element {
        Element::ContextSpecific {
            slot: 0,
            elements: attributes,
        }
    }

    fn extension_request(values: Vec<Element>) -> Element {
        Element::Sequence(vec![
            Element::ObjectIdentifier(EXTENSION_REQUEST),
            Element::Set(values),
        ])
    }

    fn key_usage_extension() -> Element {
        let Ok(element) =
            ExtensionAttribute::KeyUsage(KeyUsage::new([KeyUsageBit::DigitalSignature])).encode();
        element
    }

    #[test]
    fn test_empty_list() {
        let empty = ExtensionAttributeList::default();
        assert_eq!(vec![0xa0, 0x00], encode(&empty).to_der());

        let parsed = ASN1Object::from_der(&[0xa0, 0x00]).unwrap();
        assert_eq!(empty, decode(&parsed.elements()[0]).unwrap());
    }

    #[test]
    fn test_round_trip() {
        let list = sample();
        let bytes = encode(&list).to_der();
        let parsed = ASN1Object::from_der(&bytes).unwrap();
        assert_eq!(list, decode(&parsed.elements()[0]).unwrap());
    }

    #[test]
    fn test_layout() {
        let list = ExtensionAttributeList::new(vec![ExtensionAttribute::BasicConstraints(
            BasicConstraints::default(),
        )]);
        assert_eq!(
            vec![
                0xa0, 0x1c, 0x30, 0x1a, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01,
                0x09, 0x0e, 0x31, 0x0d, 0x30, 0x0b, 0x30, 0x09, 0x06, 0x03, 0x55, 0x1d, 0x13,
                0x04, 0x02, 0x30, 0x00,
            ],
            encode(&list).to_der()
        );
    }

    #[test]
    fn test_get_by_kind() {
        let list = sample();
        assert!(matches!(
            list.get(ExtensionKind::KeyUsage),
            Some(ExtensionAttribute::KeyUsage(_))
        ));
        assert_eq!(None, list.get(ExtensionKind::SubjectAltName));
    }

    #[rstest(
        input,
        root,
        // wrong tag
        case(
            Element::ContextSpecific { slot: 1, elements: vec![] },
            ErrorKind::UnexpectedTagShape
        ),
        case(Element::Set(vec![]), ErrorKind::UnexpectedTagShape),
        // challengePassword instead of extensionRequest
        case(
            wrap(vec![Element::Sequence(vec![
                Element::ObjectIdentifier(ObjectIdentifier::from_str("1.2.840.113549.1.9.7").unwrap()),
                Element::Set(vec![Element::UTF8String("secret".into())]),
            ])]),
            ErrorKind::UnknownOid
        ),
        // two attributes
        case(
            wrap(vec![
                extension_request(vec![Element::Sequence(vec![key_usage_extension()])]),
                extension_request(vec![Element::Sequence(vec![key_usage_extension()])]),
            ]),
            ErrorKind::TruncatedOrTrailingInput
        ),
        // two values in the SET
        case(
            wrap(vec![extension_request(vec![
                Element::Sequence(vec![key_usage_extension()]),
                Element::Sequence(vec![key_usage_extension()]),
            ])]),
            ErrorKind::TruncatedOrTrailingInput
        ),
        // empty SET
        case(wrap(vec![extension_request(vec![])]), ErrorKind::TruncatedOrTrailingInput),
        // empty extension SEQUENCE
        case(
            wrap(vec![extension_request(vec![Element::Sequence(vec![])])]),
            ErrorKind::TruncatedOrTrailingInput
        ),
        // values not a SET
        case(
            wrap(vec![Element::Sequence(vec![
                Element::ObjectIdentifier(EXTENSION_REQUEST),
                Element::Sequence(vec![]),
            ])]),
            ErrorKind::UnexpectedTagShape
        ),
        // trailing element after the values
        case(
            wrap(vec![Element::Sequence(vec![
                Element::ObjectIdentifier(EXTENSION_REQUEST),
                Element::Set(vec![Element::Sequence(vec![key_usage_extension()])]),
                Element::Null,
            ])]),
            ErrorKind::TruncatedOrTrailingInput
        )
    )]
    fn test_malformed_container(input: Element, root: ErrorKind) {
        let err = decode(&input).unwrap_err();
        assert_eq!(ErrorKind::MalformedAttributes, err.kind());
        assert_eq!(root, err.root_cause().kind());
    }

    #[test]
    fn test_extension_errors_propagate_unchanged() {
        let unknown = Element::Sequence(vec![
            Element::ObjectIdentifier(ObjectIdentifier::from_str("2.5.29.32").unwrap()),
            Element::OctetString(OctetString::from(vec![0x30, 0x00])),
        ]);
        let err = decode(&wrap(vec![extension_request(vec![Element::Sequence(vec![
            unknown,
        ])])]))
        .unwrap_err();
        assert_eq!(ErrorKind::UnknownOid, err.kind());

        let bad_payload = Element::Sequence(vec![
            Element::ObjectIdentifier(ExtensionKind::SubjectKeyId.oid()),
            Element::OctetString(OctetString::from(vec![0x05, 0x00])),
        ]);
        let err = decode(&wrap(vec![extension_request(vec![Element::Sequence(vec![
            bad_payload,
        ])])]))
        .unwrap_err();
        assert_eq!(ErrorKind::MalformedPayload, err.kind());
    }

    #[test]
    fn test_serde_keeps_order() {
        let list = ExtensionAttributeList::new(vec![
            ExtensionAttribute::SubjectKeyId(SubjectKeyIdentifier::new(vec![0x01])),
            ExtensionAttribute::BasicConstraints(BasicConstraints::default()),
        ]);
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(r#"[{"subjectKeyId":"01"},{"basicConstraints":{"ca":false}}]"#, json);
        let back: ExtensionAttributeList = serde_json::from_str(&json).unwrap();
        assert_eq!(list, back);
    }
}
