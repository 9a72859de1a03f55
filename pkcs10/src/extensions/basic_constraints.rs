use std::convert::Infallible;
use std::fmt;

use asn1::{Element, Integer, OctetString};
use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use serde::{Deserialize, Serialize};

use super::{Extension, ExtensionKind, parse_payload, payload_value};
use crate::error::{Error, Result};
use crate::reader::SequenceReader;

/*
RFC 5280 Section 4.2.1.9
BasicConstraints ::= SEQUENCE {
    cA                      BOOLEAN DEFAULT FALSE,
    pathLenConstraint       INTEGER (0..MAX) OPTIONAL
}
*/

/// `ca` is written only when true, as DER omits DEFAULT values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicConstraints {
    #[serde(default)]
    pub ca: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_len_constraint: Option<u32>,
}

impl fmt::Display for BasicConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CA:{}", if self.ca { "TRUE" } else { "FALSE" })?;
        if let Some(path_len) = self.path_len_constraint {
            write!(f, ", pathlen:{}", path_len)?;
        }
        Ok(())
    }
}

impl Extension for BasicConstraints {
    const KIND: ExtensionKind = ExtensionKind::BasicConstraints;

    fn parse(value: &OctetString) -> Result<Self> {
        parse_payload(value)
    }

    fn to_value(&self) -> OctetString {
        payload_value(self)
    }
}

impl DecodableFrom<Element> for BasicConstraints {}

impl Decoder<Element, BasicConstraints> for Element {
    type Error = Error;

    fn decode(&self) -> Result<BasicConstraints> {
        let mut reader = SequenceReader::from_sequence("BasicConstraints", self)?;
        let ca = match reader.peek() {
            Some(Element::Boolean(ca)) => {
                reader.next("cA")?;
                *ca
            }
            _ => false,
        };
        let path_len_constraint = match reader.peek() {
            Some(Element::Integer(_)) => {
                let path_len = reader.next_integer()?;
                let value = path_len.to_u32().ok_or_else(|| Error::UnexpectedTagShape {
                    context: "BasicConstraints",
                    expected: "pathLenConstraint in 0..=u32::MAX",
                    found: path_len.to_string(),
                })?;
                Some(value)
            }
            _ => None,
        };
        reader.finish()?;
        Ok(BasicConstraints {
            ca,
            path_len_constraint,
        })
    }
}

impl EncodableTo<BasicConstraints> for Element {}

impl Encoder<BasicConstraints, Element> for BasicConstraints {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        let mut elements = Vec::new();
        if self.ca {
            elements.push(Element::Boolean(true));
        }
        if let Some(path_len) = self.path_len_constraint {
            elements.push(Element::Integer(Integer::from(path_len)));
        }
        Ok(Element::Sequence(elements))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::error::ErrorKind;

    #[rstest(
        bc,
        der,
        case(BasicConstraints { ca: false, path_len_constraint: None }, vec![0x30, 0x00]),
        case(BasicConstraints { ca: true, path_len_constraint: None }, vec![0x30, 0x03, 0x01, 0x01, 0xff]),
        case(
            BasicConstraints { ca: true, path_len_constraint: Some(3) },
            vec![0x30, 0x06, 0x01, 0x01, 0xff, 0x02, 0x01, 0x03]
        ),
        case(
            BasicConstraints { ca: false, path_len_constraint: Some(200) },
            vec![0x30, 0x04, 0x02, 0x02, 0x00, 0xc8]
        )
    )]
    fn test_basic_constraints_der(bc: BasicConstraints, der: Vec<u8>) {
        assert_eq!(der, bc.to_value().as_bytes());
        assert_eq!(bc, BasicConstraints::parse(&OctetString::from(der)).unwrap());
    }

    #[test]
    fn test_explicit_false_is_accepted() {
        let value = OctetString::from(vec![0x30, 0x03, 0x01, 0x01, 0x00]);
        assert_eq!(BasicConstraints::default(), BasicConstraints::parse(&value).unwrap());
    }

    #[rstest(
        der,
        expected,
        // negative pathLenConstraint
        case(vec![0x30, 0x03, 0x02, 0x01, 0xff], ErrorKind::UnexpectedTagShape),
        // pathLen before cA
        case(vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x01, 0x01, 0xff], ErrorKind::TruncatedOrTrailingInput),
        case(vec![0x04, 0x00], ErrorKind::UnexpectedTagShape)
    )]
    fn test_basic_constraints_errors(der: Vec<u8>, expected: ErrorKind) {
        let err = BasicConstraints::parse(&OctetString::from(der)).unwrap_err();
        assert_eq!(expected, err.kind());
    }

    #[test]
    fn test_display() {
        let bc = BasicConstraints {
            ca: true,
            path_len_constraint: Some(0),
        };
        assert_eq!("CA:TRUE, pathlen:0", bc.to_string());
    }
}
