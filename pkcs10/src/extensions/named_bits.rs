use std::collections::BTreeSet;

use asn1::BitString;

/// A member of an RFC 5280 named bit list such as KeyUsage or ReasonFlags.
pub trait NamedBit: Copy + Ord + 'static {
    const ALL: &'static [Self];

    /// Position of this bit, counting from the first bit of the string.
    fn bit(&self) -> usize;

    fn from_bit(bit: usize) -> Option<Self> {
        Self::ALL.iter().copied().find(|named| named.bit() == bit)
    }
}

pub(crate) fn encode_named_bits<T: NamedBit>(set: &BTreeSet<T>) -> BitString {
    let len = set.iter().map(|named| named.bit() + 1).max().unwrap_or(0);
    let mut bits = vec![false; len];
    for named in set {
        bits[named.bit()] = true;
    }
    BitString::from_named_bits(&bits)
}

/// Bits with no name are dropped.
pub(crate) fn decode_named_bits<T: NamedBit>(bs: &BitString) -> BTreeSet<T> {
    (0..bs.bit_len())
        .filter(|&i| bs.bit(i))
        .filter_map(T::from_bit)
        .collect()
}
