use std::borrow::Cow;
use std::convert::Infallible;
use std::{fmt::Display, str::FromStr};

use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use der::{Der, Tag, Tlv, UniversalTag};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod error;

use error::{Error, Result};

/// A sequence of top-level elements, usually exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ASN1Object {
    elements: Vec<Element>,
}

impl ASN1Object {
    pub fn new(elements: Vec<Element>) -> Self {
        ASN1Object { elements }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }

    /// Parses `bytes` as DER and types every top-level element.
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let der = Der::parse(bytes)?;
        der.decode()
    }

    pub fn to_der(&self) -> Vec<u8> {
        let Ok(der) = self.encode();
        der.to_bytes()
    }
}

impl DecodableFrom<Der> for ASN1Object {}

impl Decoder<Der, ASN1Object> for Der {
    type Error = Error;

    fn decode(&self) -> Result<ASN1Object> {
        let elements = self
            .elements()
            .iter()
            .map(Element::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(ASN1Object { elements })
    }
}

impl EncodableTo<ASN1Object> for Der {}

impl Encoder<ASN1Object, Der> for ASN1Object {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Der, Self::Error> {
        Ok(Der::new(self.elements.iter().map(Tlv::from).collect()))
    }
}

impl TryFrom<&OctetString> for ASN1Object {
    type Error = Error;

    fn try_from(value: &OctetString) -> Result<Self> {
        ASN1Object::from_der(value.as_bytes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Boolean(bool),
    Integer(Integer),
    BitString(BitString),
    OctetString(OctetString),
    Null,
    ObjectIdentifier(ObjectIdentifier),
    UTF8String(String),
    PrintableString(String),
    IA5String(String),
    Sequence(Vec<Element>),
    Set(Vec<Element>),
    /// Constructed `[slot]`: an EXPLICIT wrapper (one child) or an IMPLICIT
    /// SEQUENCE/SET whose children are listed directly.
    ContextSpecific {
        slot: u8,
        elements: Vec<Element>,
    },
    /// Primitive `[slot]`: IMPLICIT tagging of a primitive type, raw content octets.
    ContextSpecificPrimitive {
        slot: u8,
        data: Vec<u8>,
    },
    Unimplemented(Tlv),
}

impl Element {
    /// Short ASN.1 name of this element's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Element::Boolean(_) => "BOOLEAN",
            Element::Integer(_) => "INTEGER",
            Element::BitString(_) => "BIT STRING",
            Element::OctetString(_) => "OCTET STRING",
            Element::Null => "NULL",
            Element::ObjectIdentifier(_) => "OBJECT IDENTIFIER",
            Element::UTF8String(_) => "UTF8String",
            Element::PrintableString(_) => "PrintableString",
            Element::IA5String(_) => "IA5String",
            Element::Sequence(_) => "SEQUENCE",
            Element::Set(_) => "SET",
            Element::ContextSpecific { .. } => "constructed context-specific",
            Element::ContextSpecificPrimitive { .. } => "primitive context-specific",
            Element::Unimplemented(_) => "unsupported type",
        }
    }

    pub fn to_der(&self) -> Vec<u8> {
        Tlv::from(self).to_bytes()
    }
}

fn primitive_data<'a>(tlv: &'a Tlv, name: &'static str) -> Result<&'a [u8]> {
    tlv.data().ok_or(Error::UnexpectedForm(name))
}

fn children(tlv: &Tlv, name: &'static str) -> Result<Vec<Element>> {
    tlv.tlvs()
        .ok_or(Error::UnexpectedForm(name))?
        .iter()
        .map(Element::try_from)
        .collect()
}

impl TryFrom<&Tlv> for Element {
    type Error = Error;

    fn try_from(tlv: &Tlv) -> Result<Self> {
        match tlv.tag() {
            Tag::Universal(tag) => match tag {
                UniversalTag::Boolean => match primitive_data(tlv, "BOOLEAN")? {
                    [0x00] => Ok(Element::Boolean(false)),
                    [0xff] => Ok(Element::Boolean(true)),
                    _ => Err(Error::InvalidBoolean),
                },
                UniversalTag::Integer => {
                    let data = primitive_data(tlv, "INTEGER")?;
                    Ok(Element::Integer(Integer::try_from(data)?))
                }
                UniversalTag::BitString => {
                    let data = primitive_data(tlv, "BIT STRING")?;
                    Ok(Element::BitString(BitString::try_from(data)?))
                }
                UniversalTag::OctetString => {
                    let data = primitive_data(tlv, "OCTET STRING")?;
                    Ok(Element::OctetString(OctetString::from(data)))
                }
                UniversalTag::Null => {
                    if !primitive_data(tlv, "NULL")?.is_empty() {
                        return Err(Error::InvalidNull);
                    }
                    Ok(Element::Null)
                }
                UniversalTag::ObjectIdentifier => {
                    let data = primitive_data(tlv, "OBJECT IDENTIFIER")?;
                    Ok(Element::ObjectIdentifier(ObjectIdentifier::try_from(data)?))
                }
                UniversalTag::Utf8String => {
                    let data = primitive_data(tlv, "UTF8String")?;
                    let s = String::from_utf8(data.to_vec())
                        .map_err(|_| Error::Utf8StringInvalidUtf8)?;
                    Ok(Element::UTF8String(s))
                }
                UniversalTag::PrintableString => {
                    let data = primitive_data(tlv, "PrintableString")?;
                    let s = String::from_utf8(data.to_vec())
                        .map_err(|_| Error::PrintableStringInvalidEncoding)?;
                    Ok(Element::PrintableString(s))
                }
                UniversalTag::Ia5String => {
                    let data = primitive_data(tlv, "IA5String")?;
                    let s = String::from_utf8(data.to_vec())
                        .map_err(|_| Error::Ia5StringInvalidEncoding)?;
                    Ok(Element::IA5String(s))
                }
                UniversalTag::Sequence => Ok(Element::Sequence(children(tlv, "SEQUENCE")?)),
                UniversalTag::Set => Ok(Element::Set(children(tlv, "SET")?)),
            },
            Tag::ContextSpecific {
                slot,
                constructed: true,
            } => Ok(Element::ContextSpecific {
                slot,
                elements: children(tlv, "context-specific")?,
            }),
            Tag::ContextSpecific {
                slot,
                constructed: false,
            } => Ok(Element::ContextSpecificPrimitive {
                slot,
                data: primitive_data(tlv, "context-specific")?.to_vec(),
            }),
            Tag::Other(_) => Ok(Element::Unimplemented(tlv.clone())),
        }
    }
}

impl From<&Element> for Tlv {
    fn from(element: &Element) -> Self {
        let universal = |tag: UniversalTag, data: Vec<u8>| Tlv::new_primitive(Tag::Universal(tag), data);
        match element {
            Element::Boolean(b) => universal(UniversalTag::Boolean, vec![if *b { 0xff } else { 0x00 }]),
            Element::Integer(i) => universal(UniversalTag::Integer, i.to_signed_bytes_be()),
            Element::BitString(bs) => universal(UniversalTag::BitString, Vec::from(bs)),
            Element::OctetString(os) => universal(UniversalTag::OctetString, os.as_bytes().to_vec()),
            Element::Null => universal(UniversalTag::Null, vec![]),
            Element::ObjectIdentifier(oid) => universal(UniversalTag::ObjectIdentifier, oid.to_bytes()),
            Element::UTF8String(s) => universal(UniversalTag::Utf8String, s.as_bytes().to_vec()),
            Element::PrintableString(s) => {
                universal(UniversalTag::PrintableString, s.as_bytes().to_vec())
            }
            Element::IA5String(s) => universal(UniversalTag::Ia5String, s.as_bytes().to_vec()),
            Element::Sequence(elements) => Tlv::new_constructed(
                Tag::Universal(UniversalTag::Sequence),
                elements.iter().map(Tlv::from).collect(),
            ),
            Element::Set(elements) => Tlv::new_constructed(
                Tag::Universal(UniversalTag::Set),
                elements.iter().map(Tlv::from).collect(),
            ),
            Element::ContextSpecific { slot, elements } => Tlv::new_constructed(
                Tag::ContextSpecific {
                    slot: *slot,
                    constructed: true,
                },
                elements.iter().map(Tlv::from).collect(),
            ),
            Element::ContextSpecificPrimitive { slot, data } => Tlv::new_primitive(
                Tag::ContextSpecific {
                    slot: *slot,
                    constructed: false,
                },
                data.clone(),
            ),
            Element::Unimplemented(tlv) => tlv.clone(),
        }
    }
}

impl EncodableTo<Element> for Tlv {}

impl Encoder<Element, Tlv> for Element {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Tlv, Self::Error> {
        Ok(Tlv::from(self))
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Boolean(b) => write!(f, "BOOLEAN {}", b),
            Element::Integer(i) => write!(f, "INTEGER {}", i),
            Element::BitString(bs) => write!(f, "BIT STRING {}", bs),
            Element::OctetString(os) => write!(f, "OCTET STRING {}", os),
            Element::Null => write!(f, "NULL"),
            Element::ObjectIdentifier(oid) => write!(f, "OBJECT IDENTIFIER {}", oid),
            Element::UTF8String(s) => write!(f, "UTF8String {}", s),
            Element::PrintableString(s) => write!(f, "PrintableString {}", s),
            Element::IA5String(s) => write!(f, "IA5String {}", s),
            Element::Sequence(elements) => write!(f, "SEQUENCE ({} elements)", elements.len()),
            Element::Set(elements) => write!(f, "SET ({} elements)", elements.len()),
            Element::ContextSpecific { slot, elements } => {
                write!(f, "[{}] ({} elements)", slot, elements.len())
            }
            Element::ContextSpecificPrimitive { slot, data } => {
                write!(f, "[{}] IMPLICIT {}", slot, hex(data))
            }
            Element::Unimplemented(tlv) => write!(f, "UNIMPLEMENTED 0x{:02x}", tlv.tag().to_byte()),
        }
    }
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

// ASN.1 INTEGER values are signed and arbitrary sized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Integer {
    inner: BigInt,
}

impl Integer {
    pub fn as_bigint(&self) -> &BigInt {
        &self.inner
    }

    pub fn to_u32(&self) -> Option<u32> {
        self.inner.to_u32()
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.inner.to_i64()
    }

    /// Minimal two's complement content octets.
    pub fn to_signed_bytes_be(&self) -> Vec<u8> {
        self.inner.to_signed_bytes_be()
    }

    /// Interprets `bytes` as an unsigned big-endian magnitude.
    pub fn from_unsigned_bytes_be(bytes: &[u8]) -> Self {
        Integer {
            inner: BigInt::from_bytes_be(num_bigint::Sign::Plus, bytes),
        }
    }

    /// Big-endian magnitude without a sign octet. Empty for zero.
    pub fn to_unsigned_bytes_be(&self) -> Vec<u8> {
        let (_, bytes) = self.inner.to_bytes_be();
        if bytes == [0] { Vec::new() } else { bytes }
    }

    pub fn bits(&self) -> u64 {
        self.inner.bits()
    }
}

impl TryFrom<&[u8]> for Integer {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        match value {
            [] => Err(Error::IntegerNoData),
            [0x00, next, ..] if *next & 0x80 == 0 => Err(Error::IntegerNotMinimal),
            [0xff, next, ..] if *next & 0x80 != 0 => Err(Error::IntegerNotMinimal),
            _ => Ok(Integer {
                inner: BigInt::from_signed_bytes_be(value),
            }),
        }
    }
}

impl From<BigInt> for Integer {
    fn from(inner: BigInt) -> Self {
        Integer { inner }
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer {
            inner: BigInt::from(value),
        }
    }
}

impl From<u32> for Integer {
    fn from(value: u32) -> Self {
        Integer {
            inner: BigInt::from(value),
        }
    }
}

impl Serialize for Integer {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.inner.to_string())
    }
}

impl<'de> Deserialize<'de> for Integer {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let inner = s.parse::<BigInt>().map_err(serde::de::Error::custom)?;
        Ok(Integer { inner })
    }
}

impl Display for Integer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// An OBJECT IDENTIFIER as its list of arcs.
///
/// Values built through `FromStr`, `new`, DER decoding or serde are checked
/// against the X.660 arc rules. `from_static` is meant for well-known
/// constants and does not check.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectIdentifier {
    arcs: Cow<'static, [u64]>,
}

impl ObjectIdentifier {
    pub const fn from_static(arcs: &'static [u64]) -> Self {
        ObjectIdentifier {
            arcs: Cow::Borrowed(arcs),
        }
    }

    pub fn new(arcs: Vec<u64>) -> Result<Self> {
        match arcs.as_slice() {
            [] | [_] => Err(Error::ObjectIdentifierTooFewComponents),
            [first, ..] if *first > 2 => Err(Error::ObjectIdentifierInvalidFirstArc(*first)),
            [first, second, ..] if *first < 2 && *second >= 40 => {
                Err(Error::ObjectIdentifierInvalidSecondArc(*second))
            }
            [2, second, ..] if *second > u64::MAX - 80 => Err(Error::ObjectIdentifierArcOverflow),
            _ => Ok(ObjectIdentifier {
                arcs: Cow::Owned(arcs),
            }),
        }
    }

    pub fn arcs(&self) -> &[u64] {
        &self.arcs
    }

    /// Content octets of the DER encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let (first, rest) = match self.arcs.as_ref() {
            [first, second, rest @ ..] => (first.saturating_mul(40).saturating_add(*second), rest),
            [first] => (first.saturating_mul(40), &[][..]),
            [] => return Vec::new(),
        };
        let mut out = Vec::new();
        for arc in std::iter::once(first).chain(rest.iter().copied()) {
            push_base128(arc, &mut out);
        }
        out
    }
}

fn push_base128(mut value: u64, out: &mut Vec<u8>) {
    let mut groups = vec![(value & 0x7f) as u8];
    value >>= 7;
    while value > 0 {
        groups.push((value & 0x7f) as u8 | 0x80);
        value >>= 7;
    }
    out.extend(groups.iter().rev());
}

impl TryFrom<&[u8]> for ObjectIdentifier {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        if value.is_empty() {
            return Err(Error::ObjectIdentifierNoData);
        }

        let mut subids = Vec::new();
        let mut current = 0u64;
        let mut in_progress = false;
        for &b in value {
            if !in_progress && b == 0x80 {
                return Err(Error::ObjectIdentifierNonMinimalEncoding);
            }
            if current > u64::MAX >> 7 {
                return Err(Error::ObjectIdentifierArcOverflow);
            }
            current = (current << 7) | u64::from(b & 0x7f);
            if b & 0x80 == 0 {
                subids.push(current);
                current = 0;
                in_progress = false;
            } else {
                in_progress = true;
            }
        }
        if in_progress {
            return Err(Error::ObjectIdentifierIncompleteEncoding);
        }

        let mut subids = subids.into_iter();
        let first = subids.next().ok_or(Error::ObjectIdentifierNoData)?;
        let (a, b) = match first {
            0..40 => (0, first),
            40..80 => (1, first - 40),
            _ => (2, first - 80),
        };
        let mut arcs = vec![a, b];
        arcs.extend(subids);
        Ok(ObjectIdentifier {
            arcs: Cow::Owned(arcs),
        })
    }
}

impl Display for ObjectIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self
            .arcs
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{}", s)
    }
}

impl FromStr for ObjectIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let arcs = s
            .split('.')
            .map(|c| {
                c.parse::<u64>()
                    .map_err(|e| Error::ObjectIdentifierInvalidComponent(c.to_string(), e))
            })
            .collect::<Result<Vec<u64>>>()?;
        ObjectIdentifier::new(arcs)
    }
}

impl PartialEq<&str> for ObjectIdentifier {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

impl Serialize for ObjectIdentifier {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ObjectIdentifier {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ObjectIdentifier::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitString {
    unused: u8,
    data: Vec<u8>,
}

impl BitString {
    pub fn new(unused: u8, data: Vec<u8>) -> Result<Self> {
        if unused > 7 {
            return Err(Error::BitStringUnusedBitsOutOfRange(unused));
        }
        if data.is_empty() && unused != 0 {
            return Err(Error::BitStringUnusedBitsWithoutData(unused));
        }
        Ok(BitString { unused, data })
    }

    /// An octet-aligned bit string (no unused bits).
    pub fn from_bytes(data: Vec<u8>) -> Self {
        BitString { unused: 0, data }
    }

    /// Packs `bits` MSB first and drops trailing zero bits, the DER form of a
    /// named bit list (X.690 11.2.2).
    pub fn from_named_bits(bits: &[bool]) -> Self {
        let last_bit = bits.iter().rposition(|&b| b).map_or(0, |p| p + 1);
        let num_bytes = last_bit.div_ceil(8);
        let data = (0..num_bytes)
            .map(|byte_idx| {
                (0..8)
                    .filter_map(|bit_idx| {
                        let bit_pos = byte_idx * 8 + bit_idx;
                        (bit_pos < last_bit && bits.get(bit_pos) == Some(&true))
                            .then_some(0x80u8 >> bit_idx)
                    })
                    .sum::<u8>()
            })
            .collect::<Vec<_>>();
        BitString {
            unused: (num_bytes * 8 - last_bit) as u8,
            data,
        }
    }

    pub fn unused_bits(&self) -> u8 {
        self.unused
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn bit_len(&self) -> usize {
        self.data.len() * 8 - self.unused as usize
    }

    /// Bit `index`, counting from the most significant bit of the first octet.
    pub fn bit(&self, index: usize) -> bool {
        if index >= self.bit_len() {
            return false;
        }
        self.data
            .get(index / 8)
            .is_some_and(|byte| *byte & (0x80u8 >> (index % 8)) != 0)
    }
}

impl AsRef<[u8]> for BitString {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl TryFrom<&[u8]> for BitString {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        match value.split_first() {
            Some((&unused, data)) => BitString::new(unused, data.to_vec()),
            None => Err(Error::BitStringNoData),
        }
    }
}

impl From<&BitString> for Vec<u8> {
    fn from(value: &BitString) -> Self {
        let mut result = Vec::with_capacity(value.data.len() + 1);
        result.push(value.unused);
        result.extend_from_slice(&value.data);
        result
    }
}

impl Display for BitString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits = (0..self.bit_len())
            .map(|i| if self.bit(i) { '1' } else { '0' })
            .collect::<String>();
        write!(f, "{}", bits)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OctetString {
    inner: Vec<u8>,
}

impl OctetString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.inner
    }
}

impl Serialize for OctetString {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex(&self.inner))
        } else {
            self.inner.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for OctetString {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if !deserializer.is_human_readable() {
            let inner = Vec::<u8>::deserialize(deserializer)?;
            return Ok(OctetString { inner });
        }
        // hex, optionally separated by colons or whitespace
        let s = String::deserialize(deserializer)?;
        let cleaned = s.replace(|c: char| c.is_whitespace() || c == ':', "");
        if cleaned.len() % 2 != 0 {
            return Err(serde::de::Error::custom("hex string must have even length"));
        }
        let inner = (0..cleaned.len())
            .step_by(2)
            .map(|i| {
                cleaned
                    .get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid hex string: {}", s)))
            })
            .collect::<std::result::Result<Vec<u8>, D::Error>>()?;
        Ok(OctetString { inner })
    }
}

impl AsRef<[u8]> for OctetString {
    fn as_ref(&self) -> &[u8] {
        &self.inner
    }
}

impl From<Vec<u8>> for OctetString {
    fn from(value: Vec<u8>) -> Self {
        OctetString { inner: value }
    }
}

impl From<&[u8]> for OctetString {
    fn from(value: &[u8]) -> Self {
        OctetString {
            inner: value.to_vec(),
        }
    }
}

impl Display for OctetString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex(&self.inner))
    }
}
