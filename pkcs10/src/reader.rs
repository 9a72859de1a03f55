use std::slice;

use asn1::{ASN1Object, BitString, Element, Integer, ObjectIdentifier, OctetString};

use crate::error::{Error, Result};

/// Cursor over the children of a constructed element.
///
/// Every `next_*` call consumes one child and reports a missing child as
/// truncation; [`SequenceReader::finish`] reports anything left over.
pub(crate) struct SequenceReader<'a> {
    context: &'static str,
    elements: slice::Iter<'a, Element>,
}

impl<'a> SequenceReader<'a> {
    pub(crate) fn new(context: &'static str, elements: &'a [Element]) -> Self {
        SequenceReader {
            context,
            elements: elements.iter(),
        }
    }

    /// Opens `element`, which must be a SEQUENCE.
    pub(crate) fn from_sequence(context: &'static str, element: &'a Element) -> Result<Self> {
        match element {
            Element::Sequence(elements) => Ok(Self::new(context, elements)),
            other => Err(Error::unexpected(context, "SEQUENCE", other)),
        }
    }

    pub(crate) fn peek(&self) -> Option<&'a Element> {
        self.elements.as_slice().first()
    }

    pub(crate) fn next(&mut self, expected: &'static str) -> Result<&'a Element> {
        self.elements.next().ok_or(Error::Truncated {
            context: self.context,
            expected,
        })
    }

    pub(crate) fn next_oid(&mut self) -> Result<&'a ObjectIdentifier> {
        match self.next("OBJECT IDENTIFIER")? {
            Element::ObjectIdentifier(oid) => Ok(oid),
            other => Err(Error::unexpected(self.context, "OBJECT IDENTIFIER", other)),
        }
    }

    pub(crate) fn next_integer(&mut self) -> Result<&'a Integer> {
        match self.next("INTEGER")? {
            Element::Integer(integer) => Ok(integer),
            other => Err(Error::unexpected(self.context, "INTEGER", other)),
        }
    }

    pub(crate) fn next_octet_string(&mut self) -> Result<&'a OctetString> {
        match self.next("OCTET STRING")? {
            Element::OctetString(os) => Ok(os),
            other => Err(Error::unexpected(self.context, "OCTET STRING", other)),
        }
    }

    pub(crate) fn next_bit_string(&mut self) -> Result<&'a BitString> {
        match self.next("BIT STRING")? {
            Element::BitString(bs) => Ok(bs),
            other => Err(Error::unexpected(self.context, "BIT STRING", other)),
        }
    }

    pub(crate) fn finish(self) -> Result<()> {
        match self.elements.len() {
            0 => Ok(()),
            count => Err(Error::TrailingElements {
                context: self.context,
                count,
            }),
        }
    }
}

/// Decodes `bytes` as exactly one DER element.
pub(crate) fn single_element(context: &'static str, bytes: &[u8]) -> Result<Element> {
    let mut elements = ASN1Object::from_der(bytes)?.into_elements();
    match elements.len() {
        0 => Err(Error::Truncated {
            context,
            expected: "DER element",
        }),
        1 => elements.pop().ok_or(Error::Truncated {
            context,
            expected: "DER element",
        }),
        n => Err(Error::TrailingElements {
            context,
            count: n - 1,
        }),
    }
}
