//! Directory of distinguished-name attribute types.
//!
//! Maps each [`AttributeKind`] to its OID and back. The forward direction is
//! total; the reverse lookup returns `None` for anything outside the table.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use asn1::ObjectIdentifier;
use serde::{Deserialize, Serialize};

/// PKCS#9 extensionRequest (1.2.840.113549.1.9.14)
pub const EXTENSION_REQUEST: ObjectIdentifier =
    ObjectIdentifier::from_static(&[1, 2, 840, 113549, 1, 9, 14]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeKind {
    CommonName,
    SerialNumber,
    Name,
    Surname,
    GivenName,
    Initials,
    GenerationQualifier,
    CountryName,
    LocalityName,
    StateOrProvinceName,
    StreetAddress,
    OrganizationName,
    OrganizationalUnitName,
    Title,
    DNQualifier,
    Pseudonym,
    EmailAddress,
    IPAddress,
    DomainComponent,
    UserId,
}

static BY_OID: LazyLock<HashMap<ObjectIdentifier, AttributeKind>> = LazyLock::new(|| {
    AttributeKind::ALL
        .iter()
        .map(|kind| (kind.oid(), *kind))
        .collect()
});

impl AttributeKind {
    pub const ALL: [AttributeKind; 20] = [
        AttributeKind::CommonName,
        AttributeKind::SerialNumber,
        AttributeKind::Name,
        AttributeKind::Surname,
        AttributeKind::GivenName,
        AttributeKind::Initials,
        AttributeKind::GenerationQualifier,
        AttributeKind::CountryName,
        AttributeKind::LocalityName,
        AttributeKind::StateOrProvinceName,
        AttributeKind::StreetAddress,
        AttributeKind::OrganizationName,
        AttributeKind::OrganizationalUnitName,
        AttributeKind::Title,
        AttributeKind::DNQualifier,
        AttributeKind::Pseudonym,
        AttributeKind::EmailAddress,
        AttributeKind::IPAddress,
        AttributeKind::DomainComponent,
        AttributeKind::UserId,
    ];

    pub fn oid(&self) -> ObjectIdentifier {
        let arcs: &'static [u64] = match self {
            AttributeKind::CommonName => &[2, 5, 4, 3],
            AttributeKind::SerialNumber => &[2, 5, 4, 5],
            AttributeKind::Name => &[2, 5, 4, 41],
            AttributeKind::Surname => &[2, 5, 4, 4],
            AttributeKind::GivenName => &[2, 5, 4, 42],
            AttributeKind::Initials => &[2, 5, 4, 43],
            AttributeKind::GenerationQualifier => &[2, 5, 4, 44],
            AttributeKind::CountryName => &[2, 5, 4, 6],
            AttributeKind::LocalityName => &[2, 5, 4, 7],
            AttributeKind::StateOrProvinceName => &[2, 5, 4, 8],
            AttributeKind::StreetAddress => &[2, 5, 4, 9],
            AttributeKind::OrganizationName => &[2, 5, 4, 10],
            AttributeKind::OrganizationalUnitName => &[2, 5, 4, 11],
            AttributeKind::Title => &[2, 5, 4, 12],
            AttributeKind::DNQualifier => &[2, 5, 4, 46],
            AttributeKind::Pseudonym => &[2, 5, 4, 65],
            AttributeKind::EmailAddress => &[1, 2, 840, 113549, 1, 9, 1],
            AttributeKind::IPAddress => &[1, 3, 6, 1, 4, 1, 42, 2, 11, 2, 1],
            AttributeKind::DomainComponent => &[0, 9, 2342, 19200300, 100, 1, 25],
            AttributeKind::UserId => &[0, 9, 2342, 19200300, 100, 1, 1],
        };
        ObjectIdentifier::from_static(arcs)
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Option<AttributeKind> {
        BY_OID.get(oid).copied()
    }

    /// Short label used when printing names, following OpenSSL's short names.
    pub fn short_name(&self) -> &'static str {
        match self {
            AttributeKind::CommonName => "CN",
            AttributeKind::SerialNumber => "serialNumber",
            AttributeKind::Name => "name",
            AttributeKind::Surname => "SN",
            AttributeKind::GivenName => "GN",
            AttributeKind::Initials => "initials",
            AttributeKind::GenerationQualifier => "generationQualifier",
            AttributeKind::CountryName => "C",
            AttributeKind::LocalityName => "L",
            AttributeKind::StateOrProvinceName => "ST",
            AttributeKind::StreetAddress => "street",
            AttributeKind::OrganizationName => "O",
            AttributeKind::OrganizationalUnitName => "OU",
            AttributeKind::Title => "title",
            AttributeKind::DNQualifier => "dnQualifier",
            AttributeKind::Pseudonym => "pseudonym",
            AttributeKind::EmailAddress => "emailAddress",
            AttributeKind::IPAddress => "ipAddress",
            AttributeKind::DomainComponent => "DC",
            AttributeKind::UserId => "UID",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[test]
    fn test_every_kind_round_trips() {
        for kind in AttributeKind::ALL {
            assert_eq!(Some(kind), AttributeKind::from_oid(&kind.oid()), "{kind:?}");
        }
    }

    #[test]
    fn test_oids_are_distinct() {
        let oids: HashSet<_> = AttributeKind::ALL.iter().map(|k| k.oid()).collect();
        assert_eq!(AttributeKind::ALL.len(), oids.len());
    }

    #[rstest(
        kind,
        expected,
        case(AttributeKind::CommonName, "2.5.4.3"),
        case(AttributeKind::Name, "2.5.4.41"),
        case(AttributeKind::DNQualifier, "2.5.4.46"),
        case(AttributeKind::Pseudonym, "2.5.4.65"),
        case(AttributeKind::EmailAddress, "1.2.840.113549.1.9.1"),
        case(AttributeKind::IPAddress, "1.3.6.1.4.1.42.2.11.2.1"),
        case(AttributeKind::DomainComponent, "0.9.2342.19200300.100.1.25"),
        case(AttributeKind::UserId, "0.9.2342.19200300.100.1.1")
    )]
    fn test_oid_table(kind: AttributeKind, expected: &str) {
        assert_eq!(expected, kind.oid().to_string());
        let parsed = ObjectIdentifier::from_str(expected).unwrap();
        assert_eq!(Some(kind), AttributeKind::from_oid(&parsed));
    }

    #[rstest(
        oid,
        case("2.5.4.2"),
        case("2.5.4.100"),
        case("1.2.840.113549.1.9.14"),
        case("2.5.29.15")
    )]
    fn test_from_oid_unknown(oid: &str) {
        let oid = ObjectIdentifier::from_str(oid).unwrap();
        assert_eq!(None, AttributeKind::from_oid(&oid));
    }

    #[test]
    fn test_domain_component_bytes() {
        // 0.9 packs into a single 0x09 octet; 19200300 needs four base-128 groups.
        assert_eq!(
            vec![0x09, 0x92, 0x26, 0x89, 0x93, 0xf2, 0x2c, 0x64, 0x01, 0x19],
            AttributeKind::DomainComponent.oid().to_bytes()
        );
    }
}
