use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use asn1::{Element, Integer};
use csrkit::decoder::{DecodableFrom, Decoder};
use csrkit::encoder::{EncodableTo, Encoder};
use pem::{FromPem, Label, Pem, ToPem};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::algorithm::SignatureAlgorithmIdentifier;
use crate::attributes::ExtensionAttributeList;
use crate::error::{Error, Result};
use crate::name::DistinguishedName;
use crate::public_key::PublicKeyInfo;
use crate::reader::{SequenceReader, single_element};
use crate::signature::SignatureValue;

/*
RFC 2986 Section 4.1
CertificationRequestInfo ::= SEQUENCE {
    version       INTEGER { v1(0) } (v1,...),
    subject       Name,
    subjectPKInfo SubjectPublicKeyInfo{{ PKInfoAlgorithms }},
    attributes    [0] Attributes{{ CRIAttributes }}
}
*/

/// The signed portion of a request.
///
/// `version` is carried as read; only v1 (0) is defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationRequestInfo {
    pub version: Integer,
    pub subject: DistinguishedName,
    pub public_key_info: PublicKeyInfo,
    #[serde(default)]
    pub attributes: ExtensionAttributeList,
}

impl CertificationRequestInfo {
    pub fn new(
        subject: DistinguishedName,
        public_key_info: PublicKeyInfo,
        attributes: ExtensionAttributeList,
    ) -> Self {
        CertificationRequestInfo {
            version: Integer::from(0u32),
            subject,
            public_key_info,
            attributes,
        }
    }

    /// DER of the info, which is what the signer signs.
    pub fn to_der(&self) -> Vec<u8> {
        let Ok(element) = self.encode();
        let bytes = element.to_der();
        trace!(len = bytes.len(), "encoded CertificationRequestInfo");
        bytes
    }

    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        trace!(len = bytes.len(), "decoding CertificationRequestInfo");
        single_element("CertificationRequestInfo", bytes)?.decode()
    }
}

impl DecodableFrom<Element> for CertificationRequestInfo {}

impl Decoder<Element, CertificationRequestInfo> for Element {
    type Error = Error;

    fn decode(&self) -> Result<CertificationRequestInfo> {
        let mut reader = SequenceReader::from_sequence("CertificationRequestInfo", self)?;
        let version = reader.next_integer()?.clone();
        if version.to_i64() != Some(0) {
            debug!("CertificationRequestInfo has version {version}, expected 0");
        }
        let subject: DistinguishedName = reader.next("subject")?.decode()?;
        let public_key_info: PublicKeyInfo = reader.next("subjectPKInfo")?.decode()?;
        let attributes: ExtensionAttributeList = reader.next("attributes")?.decode()?;
        reader.finish()?;

        Ok(CertificationRequestInfo {
            version,
            subject,
            public_key_info,
            attributes,
        })
    }
}

impl EncodableTo<CertificationRequestInfo> for Element {}

impl Encoder<CertificationRequestInfo, Element> for CertificationRequestInfo {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        let Ok(subject) = self.subject.encode();
        let Ok(public_key_info) = self.public_key_info.encode();
        let Ok(attributes) = self.attributes.encode();
        Ok(Element::Sequence(vec![
            Element::Integer(self.version.clone()),
            subject,
            public_key_info,
            attributes,
        ]))
    }
}

/*
RFC 2986 Section 4.2
CertificationRequest ::= SEQUENCE {
    certificationRequestInfo CertificationRequestInfo,
    signatureAlgorithm       AlgorithmIdentifier{{ SignatureAlgorithms }},
    signature                BIT STRING
}
*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationRequest {
    pub info: CertificationRequestInfo,
    pub signature_algorithm: SignatureAlgorithmIdentifier,
    pub signature: SignatureValue,
}

impl CertificationRequest {
    pub fn new(
        info: CertificationRequestInfo,
        signature_algorithm: SignatureAlgorithmIdentifier,
        signature: SignatureValue,
    ) -> Self {
        CertificationRequest {
            info,
            signature_algorithm,
            signature,
        }
    }

    pub fn to_der(&self) -> Vec<u8> {
        let Ok(element) = self.encode();
        let bytes = element.to_der();
        trace!(len = bytes.len(), "encoded CertificationRequest");
        bytes
    }

    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        trace!(len = bytes.len(), "decoding CertificationRequest");
        single_element("CertificationRequest", bytes)?.decode()
    }
}

impl DecodableFrom<Element> for CertificationRequest {}

impl Decoder<Element, CertificationRequest> for Element {
    type Error = Error;

    fn decode(&self) -> Result<CertificationRequest> {
        let mut reader = SequenceReader::from_sequence("CertificationRequest", self)?;
        let info: CertificationRequestInfo = reader.next("certificationRequestInfo")?.decode()?;
        let signature_algorithm: SignatureAlgorithmIdentifier =
            reader.next("signatureAlgorithm")?.decode()?;
        let signature: SignatureValue = reader.next("signature")?.decode()?;
        reader.finish()?;

        Ok(CertificationRequest {
            info,
            signature_algorithm,
            signature,
        })
    }
}

impl EncodableTo<CertificationRequest> for Element {}

impl Encoder<CertificationRequest, Element> for CertificationRequest {
    type Error = Infallible;

    fn encode(&self) -> std::result::Result<Element, Self::Error> {
        let Ok(info) = self.info.encode();
        let Ok(signature_algorithm) = self.signature_algorithm.encode();
        let Ok(signature) = self.signature.encode();
        Ok(Element::Sequence(vec![info, signature_algorithm, signature]))
    }
}

impl ToPem for CertificationRequest {
    type Error = Infallible;

    fn pem_label(&self) -> Label {
        Label::CertificateRequest
    }

    fn to_pem(&self) -> std::result::Result<Pem, Self::Error> {
        Ok(Pem::from_bytes(self.pem_label(), &self.to_der()))
    }
}

impl FromPem for CertificationRequest {
    type Error = Error;

    fn expected_labels() -> &'static [Label] {
        &[Label::CertificateRequest, Label::NewCertificateRequest]
    }

    fn from_pem(pem: &Pem) -> Result<Self> {
        pem.expect_label(Self::expected_labels())?;
        let bytes: Vec<u8> = pem.decode()?;
        CertificationRequest::from_der(&bytes)
    }
}

impl FromStr for CertificationRequest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let pem = Pem::from_str(s)?;
        CertificationRequest::from_pem(&pem)
    }
}

fn write_indented(f: &mut fmt::Formatter<'_>, indent: usize, text: &str) -> fmt::Result {
    for line in text.lines() {
        writeln!(f, "{:indent$}{}", "", line, indent = indent)?;
    }
    Ok(())
}

impl fmt::Display for CertificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = &self.info;
        writeln!(f, "Certificate Request:")?;
        writeln!(f, "    Data:")?;
        match info.version.to_i64() {
            Some(v) => writeln!(f, "        Version: {} ({:#x})", v + 1, v)?,
            None => writeln!(f, "        Version: {}", info.version)?,
        }
        writeln!(f, "        Subject: {}", info.subject)?;
        writeln!(f, "        Subject Public Key Info:")?;
        write_indented(f, 12, &info.public_key_info.to_string())?;
        writeln!(f, "        Attributes:")?;
        if info.attributes.is_empty() {
            writeln!(f, "            (none)")?;
        } else {
            writeln!(f, "            Requested Extensions:")?;
            for ext in info.attributes.iter() {
                writeln!(f, "                {}:", ext.kind())?;
                write_indented(f, 20, &ext.to_string())?;
            }
        }
        writeln!(f, "    Signature Algorithm: {}", self.signature_algorithm)?;
        writeln!(f, "    Signature Value:")?;
        for chunk in self.signature.as_bytes().chunks(18) {
            let line = chunk
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>();
            writeln!(f, "        {}", line.join(":"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::algorithm::{HashAlgorithm, PublicKeyAlgorithm};
    use crate::error::ErrorKind;
    use crate::extensions::{
        ExtendedKeyUsage, ExtensionAttribute, KeyPurpose, KeyUsage, KeyUsageBit,
    };
    use crate::oid::AttributeKind;
    use crate::public_key::RsaPublicKey;

    // openssl req -new -sha256 -subj "/CN=node.fcomb.io/O=fcomb"
    //   -addext "extendedKeyUsage=serverAuth,codeSigning"
    //   -addext "keyUsage=cRLSign,digitalSignature"
    const OPENSSL_REQUEST: &str = "-----BEGIN CERTIFICATE REQUEST-----
MIIBHzCBygIBADAoMRYwFAYDVQQDDA1ub2RlLmZjb21iLmlvMQ4wDAYDVQQKDAVm
Y29tYjBcMA0GCSqGSIb3DQEBAQUAA0sAMEgCQQC906BfEnBoGEGwYQapBjjvdqxD
nRcGztTX7lMF1RIsKl2b7CBW14+oiQd277Bkucxyn7XnsUTqcsZ4OBeGn4fhAgMB
AAGgPTA7BgkqhkiG9w0BCQ4xLjAsMB0GA1UdJQQWMBQGCCsGAQUFBwMBBggrBgEF
BQcDAzALBgNVHQ8EBAMCAYIwDQYJKoZIhvcNAQELBQADQQA0vETwINAim3tOz3rF
eKlEGLdimxatCnILqoPJL/RLhf3J1yB663S6+jFaS6fSEhNlbu7+DeUNI3w61Jtb
K613
-----END CERTIFICATE REQUEST-----
";

    // Same key and subject, keyUsage marked critical.
    const OPENSSL_REQUEST_CRITICAL: &str = "-----BEGIN CERTIFICATE REQUEST-----
MIIBIjCBzQIBADAoMRYwFAYDVQQDDA1ub2RlLmZjb21iLmlvMQ4wDAYDVQQKDAVm
Y29tYjBcMA0GCSqGSIb3DQEBAQUAA0sAMEgCQQC906BfEnBoGEGwYQapBjjvdqxD
nRcGztTX7lMF1RIsKl2b7CBW14+oiQd277Bkucxyn7XnsUTqcsZ4OBeGn4fhAgMB
AAGgQDA+BgkqhkiG9w0BCQ4xMTAvMB0GA1UdJQQWMBQGCCsGAQUFBwMBBggrBgEF
BQcDAzAOBgNVHQ8BAf8EBAMCAYIwDQYJKoZIhvcNAQELBQADQQCg1iXh9DrGM0za
OmTlC+f4hGAO5SWb2/Rczqa6gigNGvQT/V4GrRggSSJeeZWSk1l3JkdQlyXVIRzY
ynM6fX9k
-----END CERTIFICATE REQUEST-----
";

    fn subject() -> DistinguishedName {
        [
            (AttributeKind::CommonName, "node.fcomb.io".to_string()),
            (AttributeKind::OrganizationName, "fcomb".to_string()),
        ]
        .into_iter()
        .collect()
    }

    fn extensions() -> ExtensionAttributeList {
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

    fn tiny_key() -> PublicKeyInfo {
        PublicKeyInfo::Rsa(RsaPublicKey::new(
            Integer::from(3u32),
            Integer::from(65537u32),
        ))
    }

    fn scenario() -> CertificationRequest {
        CertificationRequest::new(
            CertificationRequestInfo::new(subject(), tiny_key(), extensions()),
            SignatureAlgorithmIdentifier::new(HashAlgorithm::Sha256, PublicKeyAlgorithm::Rsa),
            SignatureValue::new(vec![0xde, 0xad, 0xbe, 0xef]),
        )
    }

    fn scenario_der() -> Vec<u8> {
        [
            // CertificationRequest, CertificationRequestInfo, version 0
            &[0x30, 0x81, 0xa3, 0x30, 0x81, 0x8a, 0x02, 0x01, 0x00][..],
            // subject
            &[0x30, 0x28, 0x31, 0x16, 0x30, 0x14, 0x06, 0x03, 0x55, 0x04, 0x03, 0x0c, 0x0d],
            b"node.fcomb.io",
            &[0x31, 0x0e, 0x30, 0x0c, 0x06, 0x03, 0x55, 0x04, 0x0a, 0x0c, 0x05],
            b"fcomb",
            // subjectPKInfo
            &[
                0x30, 0x1c, 0x30, 0x0d, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01,
                0x01, 0x01, 0x05, 0x00, 0x03, 0x0b, 0x00, 0x30, 0x08, 0x02, 0x01, 0x03, 0x02,
                0x03, 0x01, 0x00, 0x01,
            ],
            // [0] { extensionRequest SET { SEQUENCE {
            &[
                0xa0, 0x3d, 0x30, 0x3b, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01,
                0x09, 0x0e, 0x31, 0x2e, 0x30, 0x2c,
            ],
            // extKeyUsage
            &[
                0x30, 0x1d, 0x06, 0x03, 0x55, 0x1d, 0x25, 0x04, 0x16, 0x30, 0x14, 0x06, 0x08,
                0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x01, 0x06, 0x08, 0x2b, 0x06, 0x01,
                0x05, 0x05, 0x07, 0x03, 0x03,
            ],
            // keyUsage
            &[
                0x30, 0x0b, 0x06, 0x03, 0x55, 0x1d, 0x0f, 0x04, 0x04, 0x03, 0x02, 0x01, 0x82,
            ],
            // sha256WithRSAEncryption
            &[
                0x30, 0x0d, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b,
                0x05, 0x00,
            ],
            // signature
            &[0x03, 0x05, 0x00, 0xde, 0xad, 0xbe, 0xef],
        ]
        .concat()
    }

    fn position(haystack: &[u8], needle: &[u8]) -> usize {
        haystack
            .windows(needle.len())
            .position(|w| w == needle)
            .unwrap()
    }

    #[test]
    fn test_scenario_layout_and_decode() {
        let request = scenario();
        let der = request.to_der();
        assert_eq!(scenario_der(), der);

        let decoded = CertificationRequest::from_der(&der).unwrap();
        assert_eq!(request, decoded);
        assert_eq!("CN=node.fcomb.io, O=fcomb", decoded.info.subject.to_string());
        assert!(decoded.info.attributes.get(crate::ExtensionKind::KeyUsage).is_some());
    }

    #[test]
    fn test_info_round_trip() {
        let info = CertificationRequestInfo::new(subject(), tiny_key(), extensions());
        let der = info.to_der();
        assert_eq!(&scenario_der()[3..144], der.as_slice());
        assert_eq!(info, CertificationRequestInfo::from_der(&der).unwrap());
    }

    #[test]
    fn test_info_without_extensions() {
        let info = CertificationRequestInfo::new(
            subject(),
            tiny_key(),
            ExtensionAttributeList::default(),
        );
        let der = info.to_der();
        assert_eq!(&[0xa0, 0x00], &der[der.len() - 2..]);
        assert_eq!(info, CertificationRequestInfo::from_der(&der).unwrap());
    }

    #[test]
    fn test_openssl_request_re_encodes_identically() {
        let pem = Pem::from_str(OPENSSL_REQUEST).unwrap();
        let original: Vec<u8> = pem.decode().unwrap();

        let request = CertificationRequest::from_pem(&pem).unwrap();
        assert_eq!(subject(), request.info.subject);
        assert_eq!(extensions(), request.info.attributes);
        assert_eq!(
            SignatureAlgorithmIdentifier::new(HashAlgorithm::Sha256, PublicKeyAlgorithm::Rsa),
            request.signature_algorithm
        );
        assert_eq!(64, request.signature.as_bytes().len());
        let PublicKeyInfo::Rsa(key) = &request.info.public_key_info;
        assert_eq!(512, key.bits());

        assert_eq!(original, request.to_der());
    }

    #[test]
    fn test_openssl_request_with_critical_extension() {
        let request = CertificationRequest::from_str(OPENSSL_REQUEST_CRITICAL).unwrap();
        assert_eq!(extensions(), request.info.attributes);
    }

    #[test]
    fn test_corrupted_name_oid() {
        let mut der = scenario_der();
        // 2.5.4.3 (commonName) -> 2.5.4.2
        let at = position(&der, &[0x06, 0x03, 0x55, 0x04, 0x03]);
        der[at + 4] = 0x02;

        let err = CertificationRequest::from_der(&der).unwrap_err();
        assert_eq!(ErrorKind::UnknownOid, err.root_cause().kind());
    }

    #[rstest(
        oid,
        offset,
        byte,
        // leading 0x80 in the first sub-identifier
        case(&[0x06, 0x03, 0x55, 0x04, 0x03], 2, 0x80),
        // commonName arc left without a final octet
        case(&[0x06, 0x03, 0x55, 0x04, 0x03], 4, 0x83),
        // codeSigning arc left without a final octet
        case(&[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x03], 7, 0x83)
    )]
    fn test_malformed_oid_content(oid: &[u8], offset: usize, byte: u8) {
        let mut der = scenario_der();
        let at = position(&der, oid);
        der[at + offset] = byte;

        let err = CertificationRequest::from_der(&der).unwrap_err();
        assert_eq!(ErrorKind::UnknownOid, err.root_cause().kind());
    }

    #[test]
    fn test_corrupted_key_purpose_oid() {
        let mut der = scenario_der();
        // id-kp-codeSigning -> id-kp 7
        let at = position(&der, &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x03]);
        der[at + 7] = 0x07;

        let err = CertificationRequest::from_der(&der).unwrap_err();
        assert_eq!(ErrorKind::MalformedPayload, err.kind());
        assert_eq!(ErrorKind::UnknownOid, err.root_cause().kind());
    }

    #[test]
    fn test_corrupted_signature_algorithm() {
        let mut der = scenario_der();
        let at = position(&der, &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b]);
        der[at + 8] = 0x0a;

        let err = CertificationRequest::from_der(&der).unwrap_err();
        assert_eq!(ErrorKind::UnknownOid, err.kind());
    }

    #[rstest(
        der,
        case(scenario_der()[..scenario_der().len() - 1].to_vec()),
        case([scenario_der(), vec![0x05, 0x00]].concat()),
        case(vec![])
    )]
    fn test_truncated_or_trailing_input(der: Vec<u8>) {
        let err = CertificationRequest::from_der(&der).unwrap_err();
        assert_eq!(ErrorKind::TruncatedOrTrailingInput, err.kind());
    }

    #[test]
    fn test_missing_and_extra_fields() {
        let Ok(info) = scenario().info.encode();
        let Ok(algorithm) = scenario().signature_algorithm.encode();
        let Ok(signature) = scenario().signature.encode();

        let missing = Element::Sequence(vec![info.clone(), algorithm.clone()]);
        let err = CertificationRequest::from_der(&missing.to_der()).unwrap_err();
        assert_eq!(ErrorKind::TruncatedOrTrailingInput, err.kind());

        let extra = Element::Sequence(vec![info, algorithm, signature, Element::Null]);
        let err = CertificationRequest::from_der(&extra.to_der()).unwrap_err();
        assert_eq!(ErrorKind::TruncatedOrTrailingInput, err.kind());
    }

    #[test]
    fn test_wrong_element_type() {
        let Ok(algorithm) = scenario().signature_algorithm.encode();
        let Ok(signature) = scenario().signature.encode();
        let doc = Element::Sequence(vec![Element::Null, algorithm, signature]);
        let err = CertificationRequest::from_der(&doc.to_der()).unwrap_err();
        assert_eq!(ErrorKind::UnexpectedTagShape, err.kind());
    }

    #[test]
    fn test_signature_with_unused_bits_is_rejected() {
        let mut der = scenario_der();
        let len = der.len();
        // 03 05 04 de ad be e0
        der[len - 5] = 0x04;
        der[len - 1] = 0xe0;

        let err = CertificationRequest::from_der(&der).unwrap_err();
        assert_eq!(ErrorKind::UnexpectedTagShape, err.kind());
    }

    #[test]
    fn test_pem_round_trip() {
        let request = scenario();
        let Ok(pem) = request.to_pem();
        let text = pem.to_string();
        assert!(text.starts_with("-----BEGIN CERTIFICATE REQUEST-----"));
        assert_eq!(request, CertificationRequest::from_str(&text).unwrap());
    }

    #[test]
    fn test_new_certificate_request_label() {
        let request = scenario();
        let pem = Pem::from_bytes(Label::NewCertificateRequest, &request.to_der());
        assert_eq!(request, CertificationRequest::from_str(&pem.to_string()).unwrap());
    }

    #[test]
    fn test_wrong_pem_label() {
        let pem = Pem::from_bytes(Label::PublicKey, &scenario().to_der());
        let err = CertificationRequest::from_pem(&pem).unwrap_err();
        assert_eq!(ErrorKind::PemFraming, err.kind());
    }

    #[test]
    fn test_display() {
        let text = CertificationRequest::from_str(OPENSSL_REQUEST)
            .unwrap()
            .to_string();
        assert!(text.contains("Version: 1 (0x0)"));
        assert!(text.contains("Subject: CN=node.fcomb.io, O=fcomb"));
        assert!(text.contains("X509v3 Extended Key Usage:"));
        assert!(text.contains("TLS Web Server Authentication, Code Signing"));
        assert!(text.contains("Signature Algorithm: sha256WithRSAEncryption"));
    }

    #[test]
    fn test_serde_json_round_trip() {
        let request = scenario();
        let json = serde_json::to_string(&request).unwrap();
        let back: CertificationRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, back);
    }
}
