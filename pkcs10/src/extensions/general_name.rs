use std::convert::Infallible;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use asn1::Element;
use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::name::DistinguishedName;
use crate::reader::SequenceReader;

/*
RFC 5280 Section 4.2.1.6
GeneralName ::= CHOICE {
    otherName                 [0] OtherName,
    rfc822Name                [1] IA5String,
    dNSName                   [2] IA5String,
    x400Address               [3] ORAddress,
    directoryName             [4] Name,
    ediPartyName              [5] EDIPartyName,
    uniformResourceIdentifier [6] IA5String,
    iPAddress                 [7] OCTET STRING,
    registeredID              [8] OBJECT IDENTIFIER
}

GeneralNames ::= SEQUENCE SIZE (1..MAX) OF GeneralName
*/

/// The GeneralName choices a request can carry.
///
/// otherName, x400Address, ediPartyName and registeredID are rejected on
/// decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeneralName {
    Rfc822Name(Ia5Text),
    DnsName(Ia5Text),
    /// Explicitly tagged, since Name is a CHOICE.
    DirectoryName(DistinguishedName),
    Uri(Ia5Text),
    IpAddress(IpAddr),
}

const CONTEXT: &str = "GeneralName";

/// ASCII text for the IA5String choices of a GeneralName.
///
/// Internationalized names must be given in their ASCII form, e.g. the
/// punycode `xn--` label for a dNSName.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ia5Text(String);

impl Ia5Text {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if !text.is_ascii() {
            return Err(non_ascii());
        }
        Ok(Ia5Text(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn non_ascii() -> Error {
    Error::UnexpectedTagShape {
        context: CONTEXT,
        expected: "IA5String",
        found: "non-ASCII text".to_string(),
    }
}

impl TryFrom<String> for Ia5Text {
    type Error = Error;

    fn try_from(text: String) -> Result<Self> {
        Ia5Text::new(text)
    }
}

impl TryFrom<&str> for Ia5Text {
    type Error = Error;

    fn try_from(text: &str) -> Result<Self> {
        Ia5Text::new(text)
    }
}

impl From<Ia5Text> for String {
    fn from(text: Ia5Text) -> Self {
        text.0
    }
}

impl fmt::Display for Ia5Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn ia5_text(data: &[u8]) -> Result<Ia5Text> {
    match std::str::from_utf8(data) {
        Ok(text) => Ia5Text::new(text),
        Err(_) => Err(non_ascii()),
    }
}

fn ip_address(data: &[u8]) -> Result<IpAddr> {
    if let Ok(octets) = <[u8; 4]>::try_from(data) {
        return Ok(IpAddr::V4(Ipv4Addr::from(octets)));
    }
    if let Ok(octets) = <[u8; 16]>::try_from(data) {
        return Ok(IpAddr::V6(Ipv6Addr::from(octets)));
    }
    Err(Error::UnexpectedTagShape {
        context: CONTEXT,
        expected: "4 or 16 octet iPAddress",
        found: format!("{} octets", data.len()),
    })
}

impl fmt::Display for GeneralName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneralName::Rfc822Name(email) => write!(f, "email:{}", email),
            GeneralName::DnsName(dns) => write!(f, "DNS:{}", dns),
            GeneralName::DirectoryName(name) => write!(f, "DirName:{}", name),
            GeneralName::Uri(uri) => write!(f, "URI:{}", uri),
            GeneralName::IpAddress(ip) => write!(f, "IP Address:{}", ip),
        }
    }
}

impl DecodableFrom<Element> for GeneralName {}

impl Decoder<Element, GeneralName> for Element {
    type Error = Error;

    fn decode(&self) -> Result<GeneralName> {
        match self {
            Element::ContextSpecificPrimitive { slot: 1, data } => {
                ia5_text(data).map(GeneralName::Rfc822Name)
            }
            Element::ContextSpecificPrimitive { slot: 2, data } => {
                ia5_text(data).map(GeneralName::DnsName)
            }
            Element::ContextSpecificPrimitive { slot: 6, data } => {
                ia5_text(data).map(GeneralName::Uri)
            }
            Element::ContextSpecificPrimitive { slot: 7, data } => {
                ip_address(data).map(GeneralName::IpAddress)
            }
            Element::ContextSpecific { slot: 4, elements } => {
                let mut reader = SequenceReader::new(CONTEXT, elements);
                let name: DistinguishedName = reader.next("directoryName")?.decode()?;
                reader.finish()?;
                Ok(GeneralName::DirectoryName(name))
            }
            other => Err(Error::unexpected(
                CONTEXT,
                "rfc822Name, dNSName, directoryName, URI or iPAddress",
                other,
            )),
        }
    }
}

impl EncodableTo<GeneralName> for Element {}

impl Encoder<GeneralName, Element> for GeneralName {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        let element = match self {
            GeneralName::Rfc822Name(email) => Element::ContextSpecificPrimitive {
                slot: 1,
                data: email.as_str().as_bytes().to_vec(),
            },
            GeneralName::DnsName(dns) => Element::ContextSpecificPrimitive {
                slot: 2,
                data: dns.as_str().as_bytes().to_vec(),
            },
            GeneralName::DirectoryName(name) => {
                let Ok(name) = name.encode();
                Element::ContextSpecific {
                    slot: 4,
                    elements: vec![name],
                }
            }
            GeneralName::Uri(uri) => Element::ContextSpecificPrimitive {
                slot: 6,
                data: uri.as_str().as_bytes().to_vec(),
            },
            GeneralName::IpAddress(IpAddr::V4(ip)) => Element::ContextSpecificPrimitive {
                slot: 7,
                data: ip.octets().to_vec(),
            },
            GeneralName::IpAddress(IpAddr::V6(ip)) => Element::ContextSpecificPrimitive {
                slot: 7,
                data: ip.octets().to_vec(),
            },
        };
        Ok(element)
    }
}

/// Decodes the children of a `GeneralNames` SEQUENCE or implicit tag.
pub(crate) fn decode_general_names(elements: &[Element]) -> Result<Vec<GeneralName>> {
    elements
        .iter()
        .map(|e| e.decode())
        .collect::<Result<Vec<GeneralName>>>()
}

pub(crate) fn encode_general_names(names: &[GeneralName]) -> Vec<Element> {
    names
        .iter()
        .map(|name| {
            let Ok(element) = name.encode();
            element
        })
        .collect()
}
