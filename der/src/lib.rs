//! Distinguished Encoding Rules: the raw tag-length-value layer.
//!
//! `Der` is an ordered list of top-level `Tlv`s. Universal SEQUENCE and SET
//! and constructed context-specific tags are parsed recursively; every other
//! tag keeps its content octets as-is so higher layers can interpret them.

use std::convert::Infallible;

use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use nom::bytes::complete::take;
use nom::number::complete::be_u8;
use nom::{IResult, Parser};
use pem::Pem;

pub mod error;

use error::{Error, Result};

pub const TAG_CONSTRUCTED: u8 = 0x20;
const TAG_NUMBER_MASK: u8 = 0x1f;
const CLASS_MASK: u8 = 0xc0;
const CLASS_CONTEXT_SPECIFIC: u8 = 0x80;
const LENGTH_LONG_FORM: u8 = 0x80;

/// Nesting limit for constructed elements. A CSR is at most about ten levels deep.
const MAX_DEPTH: usize = 32;

type ParseResult<'a, T> = IResult<&'a [u8], T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Der {
    elements: Vec<Tlv>,
}

impl Der {
    pub fn new(elements: Vec<Tlv>) -> Self {
        Der { elements }
    }

    pub fn elements(&self) -> &[Tlv] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<Tlv> {
        self.elements
    }

    /// Parses every TLV in `input`, which must end exactly on an element boundary.
    pub fn parse(input: &[u8]) -> Result<Der> {
        let mut elements = Vec::new();
        let mut rest = input;
        while !rest.is_empty() {
            let (next, tlv) = Tlv::parse(rest).map_err(|e| match e {
                nom::Err::Error(e) | nom::Err::Failure(e) => e,
                nom::Err::Incomplete(_) => Error::Truncated,
            })?;
            rest = next;
            elements.push(tlv);
        }
        Ok(Der { elements })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for tlv in &self.elements {
            tlv.write_to(&mut out);
        }
        out
    }
}

impl DecodableFrom<Vec<u8>> for Der {}

impl Decoder<Vec<u8>, Der> for Vec<u8> {
    type Error = Error;

    fn decode(&self) -> Result<Der> {
        Der::parse(self)
    }
}

impl<'a> DecodableFrom<&'a [u8]> for Der {}

impl<'a> Decoder<&'a [u8], Der> for &'a [u8] {
    type Error = Error;

    fn decode(&self) -> Result<Der> {
        Der::parse(self)
    }
}

impl DecodableFrom<Pem> for Der {}

impl Decoder<Pem, Der> for Pem {
    type Error = Error;

    fn decode(&self) -> Result<Der> {
        let bytes: Vec<u8> = self.decode()?;
        Der::parse(&bytes)
    }
}

impl EncodableTo<Der> for Vec<u8> {}

impl Encoder<Der, Vec<u8>> for Der {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Vec<u8>, Self::Error> {
        Ok(self.to_bytes())
    }
}

/// Universal class tags understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniversalTag {
    Boolean,
    Integer,
    BitString,
    OctetString,
    Null,
    ObjectIdentifier,
    Utf8String,
    PrintableString,
    Ia5String,
    Sequence,
    Set,
}

impl UniversalTag {
    /// The full identifier octet, including the constructed bit for SEQUENCE and SET.
    pub fn to_byte(self) -> u8 {
        match self {
            UniversalTag::Boolean => 0x01,
            UniversalTag::Integer => 0x02,
            UniversalTag::BitString => 0x03,
            UniversalTag::OctetString => 0x04,
            UniversalTag::Null => 0x05,
            UniversalTag::ObjectIdentifier => 0x06,
            UniversalTag::Utf8String => 0x0c,
            UniversalTag::PrintableString => 0x13,
            UniversalTag::Ia5String => 0x16,
            UniversalTag::Sequence => 0x10 | TAG_CONSTRUCTED,
            UniversalTag::Set => 0x11 | TAG_CONSTRUCTED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Universal(UniversalTag),
    ContextSpecific { slot: u8, constructed: bool },
    /// Any other identifier octet (application, private, or an unsupported universal type).
    Other(u8),
}

impl Tag {
    pub fn to_byte(self) -> u8 {
        match self {
            Tag::Universal(tag) => tag.to_byte(),
            Tag::ContextSpecific { slot, constructed } => {
                let constructed = if constructed { TAG_CONSTRUCTED } else { 0 };
                CLASS_CONTEXT_SPECIFIC | constructed | (slot & TAG_NUMBER_MASK)
            }
            Tag::Other(byte) => byte,
        }
    }

    /// Whether the content of this tag is parsed as nested TLVs.
    pub fn is_constructed(self) -> bool {
        match self {
            Tag::Universal(UniversalTag::Sequence | UniversalTag::Set) => true,
            Tag::ContextSpecific { constructed, .. } => constructed,
            _ => false,
        }
    }
}

impl From<u8> for Tag {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Tag::Universal(UniversalTag::Boolean),
            0x02 => Tag::Universal(UniversalTag::Integer),
            0x03 => Tag::Universal(UniversalTag::BitString),
            0x04 => Tag::Universal(UniversalTag::OctetString),
            0x05 => Tag::Universal(UniversalTag::Null),
            0x06 => Tag::Universal(UniversalTag::ObjectIdentifier),
            0x0c => Tag::Universal(UniversalTag::Utf8String),
            0x13 => Tag::Universal(UniversalTag::PrintableString),
            0x16 => Tag::Universal(UniversalTag::Ia5String),
            0x30 => Tag::Universal(UniversalTag::Sequence),
            0x31 => Tag::Universal(UniversalTag::Set),
            b if b & CLASS_MASK == CLASS_CONTEXT_SPECIFIC => Tag::ContextSpecific {
                slot: b & TAG_NUMBER_MASK,
                constructed: b & TAG_CONSTRUCTED != 0,
            },
            b => Tag::Other(b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Data(Vec<u8>),
    Tlvs(Vec<Tlv>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    tag: Tag,
    value: Value,
}

impl Tlv {
    pub fn new_primitive(tag: Tag, data: Vec<u8>) -> Self {
        Tlv {
            tag,
            value: Value::Data(data),
        }
    }

    pub fn new_constructed(tag: Tag, tlvs: Vec<Tlv>) -> Self {
        Tlv {
            tag,
            value: Value::Tlvs(tlvs),
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn data(&self) -> Option<&[u8]> {
        match &self.value {
            Value::Data(data) => Some(data),
            Value::Tlvs(_) => None,
        }
    }

    pub fn tlvs(&self) -> Option<&[Tlv]> {
        match &self.value {
            Value::Data(_) => None,
            Value::Tlvs(tlvs) => Some(tlvs),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.push(self.tag.to_byte());
        match &self.value {
            Value::Data(data) => {
                write_length(data.len(), out);
                out.extend_from_slice(data);
            }
            Value::Tlvs(tlvs) => {
                let mut content = Vec::new();
                for tlv in tlvs {
                    tlv.write_to(&mut content);
                }
                write_length(content.len(), out);
                out.extend_from_slice(&content);
            }
        }
    }

    fn parse(input: &[u8]) -> ParseResult<'_, Tlv> {
        Self::parse_nested(input, 0)
    }

    fn parse_nested(input: &[u8], depth: usize) -> ParseResult<'_, Tlv> {
        if depth > MAX_DEPTH {
            return Err(nom::Err::Failure(Error::NestingTooDeep(MAX_DEPTH)));
        }
        let (input, tag) = parse_tag(input)?;
        let (input, length) = parse_length(input)?;
        let (input, data) = take(length).parse(input)?;

        if tag.is_constructed() {
            let mut tlvs = Vec::new();
            let mut data = data;
            while !data.is_empty() {
                let (rest, tlv) = Self::parse_nested(data, depth + 1)?;
                data = rest;
                tlvs.push(tlv);
            }
            return Ok((input, Tlv::new_constructed(tag, tlvs)));
        }

        Ok((input, Tlv::new_primitive(tag, data.to_vec())))
    }
}

impl EncodableTo<Tlv> for Vec<u8> {}

impl Encoder<Tlv, Vec<u8>> for Tlv {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Vec<u8>, Self::Error> {
        Ok(self.to_bytes())
    }
}

fn parse_tag(input: &[u8]) -> ParseResult<'_, Tag> {
    let (input, n) = be_u8(input)?;
    if n & TAG_NUMBER_MASK == TAG_NUMBER_MASK {
        return Err(nom::Err::Failure(Error::HighTagNumber(n)));
    }
    Ok((input, Tag::from(n)))
}

fn parse_length(input: &[u8]) -> ParseResult<'_, usize> {
    let (input, n) = be_u8(input)?;
    if n & LENGTH_LONG_FORM == 0 {
        // short form: 0-127
        return Ok((input, n as usize));
    }

    // long form: the low 7 bits count the length octets that follow
    let count = (n & !LENGTH_LONG_FORM) as usize;
    if count == 0 {
        return Err(nom::Err::Failure(Error::IndefiniteLength));
    }
    if count > size_of::<usize>() {
        return Err(nom::Err::Failure(Error::LengthOverflow(count)));
    }
    let (input, bytes) = take(count).parse(input)?;
    let length = bytes.iter().fold(0usize, |n, &b| (n << 8) | b as usize);
    if length < LENGTH_LONG_FORM as usize || bytes.first() == Some(&0) {
        return Err(nom::Err::Failure(Error::NonMinimalLength));
    }
    Ok((input, length))
}

fn write_length(length: usize, out: &mut Vec<u8>) {
    if length < LENGTH_LONG_FORM as usize {
        out.push(length as u8);
        return;
    }
    let bytes = length.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    let significant = &bytes[skip..];
    out.push(LENGTH_LONG_FORM | significant.len() as u8);
    out.extend_from_slice(significant);
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn seq(tlvs: Vec<Tlv>) -> Tlv {
        Tlv::new_constructed(Tag::Universal(UniversalTag::Sequence), tlvs)
    }

    fn int(data: Vec<u8>) -> Tlv {
        Tlv::new_primitive(Tag::Universal(UniversalTag::Integer), data)
    }

    #[rstest(input, expected,
        case(vec![0x02], Tag::Universal(UniversalTag::Integer)),
        case(vec![0x30, 0x01], Tag::Universal(UniversalTag::Sequence)),
        case(vec![0x31], Tag::Universal(UniversalTag::Set)),
        case(vec![0xa0], Tag::ContextSpecific { slot: 0, constructed: true }),
        case(vec![0x86], Tag::ContextSpecific { slot: 6, constructed: false }),
        case(vec![0x17], Tag::Other(0x17)),
        case(vec![0x61], Tag::Other(0x61)),
    )]
    fn test_parse_tag(input: Vec<u8>, expected: Tag) {
        let (_, actual) = parse_tag(&input).unwrap();
        assert_eq!(expected, actual);
        assert_eq!(input[0], actual.to_byte());
    }

    #[test]
    fn test_parse_tag_rejects_high_tag_number() {
        let err = parse_tag(&[0x1f, 0x81, 0x00]).unwrap_err();
        assert_eq!(nom::Err::Failure(Error::HighTagNumber(0x1f)), err);
    }

    #[rstest(input, expected,
        case(vec![0x02], 0x02),
        case(vec![0x7f, 0x01], 0x7f),
        case(vec![0x81, 0x80], 0x80),
        case(vec![0x82, 0x02, 0x10], 256 * 0x02 + 0x10),
        case(vec![0x83, 0x01, 0x00, 0x00], 256 * 256),
        case(vec![0x82, 0xff, 0xff], 256 * 0xff + 0xff),
    )]
    fn test_parse_length(input: Vec<u8>, expected: usize) {
        let (_, actual) = parse_length(&input).unwrap();
        assert_eq!(expected, actual);
    }

    #[rstest(input, expected,
        case(vec![], Error::Truncated),
        case(vec![0x80], Error::IndefiniteLength),
        case(vec![0x82, 0x01], Error::Truncated),
        case(vec![0x81, 0x05], Error::NonMinimalLength),
        case(vec![0x82, 0x00, 0x90], Error::NonMinimalLength),
        case(vec![0x89, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], Error::LengthOverflow(9)),
    )]
    fn test_parse_length_error(input: Vec<u8>, expected: Error) {
        let actual = match parse_length(&input).unwrap_err() {
            nom::Err::Error(e) | nom::Err::Failure(e) => e,
            nom::Err::Incomplete(_) => panic!("complete parsers never report Incomplete"),
        };
        assert_eq!(expected, actual);
    }

    #[rstest(input, expected,
        case(vec![0x02, 0x01, 0x01], int(vec![0x01])),
        case(vec![0x02, 0x09, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01], int(vec![0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01])),
        case(vec![0x13, 0x02, 0x68, 0x69], Tlv::new_primitive(Tag::Universal(UniversalTag::PrintableString), vec![0x68, 0x69])),
        case(vec![0x16, 0x02, 0x68, 0x69], Tlv::new_primitive(Tag::Universal(UniversalTag::Ia5String), vec![0x68, 0x69])),
        case(vec![0x0c, 0x04, 0xf0, 0x9f, 0x98, 0x8e], Tlv::new_primitive(Tag::Universal(UniversalTag::Utf8String), vec![0xf0, 0x9f, 0x98, 0x8e])),
        case(vec![0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x0e], Tlv::new_primitive(Tag::Universal(UniversalTag::ObjectIdentifier), vec![0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x0e])),
        case(vec![0x05, 0x00], Tlv::new_primitive(Tag::Universal(UniversalTag::Null), vec![])),
        case(vec![0x04, 0x04, 0x03, 0x02, 0x06, 0xa0], Tlv::new_primitive(Tag::Universal(UniversalTag::OctetString), vec![0x03, 0x02, 0x06, 0xa0])),
        case(vec![0x03, 0x03, 0x01, 0x86, 0x00], Tlv::new_primitive(Tag::Universal(UniversalTag::BitString), vec![0x01, 0x86, 0x00])),
        case(vec![0x82, 0x03, 0x61, 0x2e, 0x62], Tlv::new_primitive(Tag::ContextSpecific { slot: 2, constructed: false }, vec![0x61, 0x2e, 0x62])),
    )]
    fn test_tlv_parse_primitive(input: Vec<u8>, expected: Tlv) {
        let (rest, actual) = Tlv::parse(&input).unwrap();
        assert!(rest.is_empty());
        assert_eq!(expected, actual);
    }

    #[rstest(input, expected,
        case(
            vec![0x30, 0x09, 0x02, 0x01, 0x07, 0x02, 0x01, 0x08, 0x02, 0x01, 0x09],
            seq(vec![int(vec![0x07]), int(vec![0x08]), int(vec![0x09])])
        ),
        case(vec![0x30, 0x00], seq(vec![])),
        case(vec![0xa0, 0x00], Tlv::new_constructed(Tag::ContextSpecific { slot: 0, constructed: true }, vec![])),
        case(
            vec![0xa0, 0x07, 0x30, 0x05, 0x02, 0x01, 0x01, 0x05, 0x00],
            Tlv::new_constructed(
                Tag::ContextSpecific { slot: 0, constructed: true },
                vec![seq(vec![int(vec![0x01]), Tlv::new_primitive(Tag::Universal(UniversalTag::Null), vec![])])],
            )
        ),
    )]
    fn test_tlv_parse_structured(input: Vec<u8>, expected: Tlv) {
        let (_, actual) = Tlv::parse(&input).unwrap();
        assert_eq!(expected, actual);
        assert_eq!(input, actual.to_bytes());
    }

    #[rstest(input, expected,
        case(vec![0x30, 0x05, 0x02, 0x01], Error::Truncated),
        case(vec![0x30, 0x03, 0x02, 0x02, 0x01], Error::Truncated),
        case(vec![0x30, 0x80, 0x00, 0x00], Error::IndefiniteLength),
        case(vec![0x02], Error::Truncated),
    )]
    fn test_der_parse_error(input: Vec<u8>, expected: Error) {
        let err = Der::parse(&input).unwrap_err();
        assert_eq!(expected, err);
    }

    #[test]
    fn test_der_parse_rejects_deep_nesting() {
        // 40 levels of SEQUENCE { ... } still fit in short-form lengths
        let mut deep = vec![0x05, 0x00];
        for _ in 0..40 {
            let mut outer = vec![0x30, deep.len() as u8];
            outer.extend(deep);
            deep = outer;
        }
        assert_eq!(Err(Error::NestingTooDeep(MAX_DEPTH)), Der::parse(&deep));
    }

    #[test]
    fn test_der_parse_multiple_top_level() {
        let der = Der::parse(&[0x05, 0x00, 0x02, 0x01, 0x2a]).unwrap();
        assert_eq!(2, der.elements().len());
        assert_eq!(Tag::Universal(UniversalTag::Null), der.elements()[0].tag());
    }

    #[rstest(length, expected,
        case(0, vec![0x00]),
        case(0x7f, vec![0x7f]),
        case(0x80, vec![0x81, 0x80]),
        case(0xff, vec![0x81, 0xff]),
        case(0x100, vec![0x82, 0x01, 0x00]),
        case(0x01_0000, vec![0x83, 0x01, 0x00, 0x00]),
    )]
    fn test_write_length(length: usize, expected: Vec<u8>) {
        let mut out = Vec::new();
        write_length(length, &mut out);
        assert_eq!(expected, out);
        let (_, parsed) = parse_length(&out).unwrap();
        assert_eq!(length, parsed);
    }

    #[test]
    fn test_encode_long_content() {
        let tlv = Tlv::new_primitive(Tag::Universal(UniversalTag::OctetString), vec![0xab; 300]);
        let bytes = tlv.to_bytes();
        assert_eq!(&[0x04, 0x82, 0x01, 0x2c], &bytes[..4]);
        assert_eq!(304, bytes.len());
        let der: Der = bytes.decode().unwrap();
        assert_eq!(vec![tlv], der.into_elements());
    }
}
