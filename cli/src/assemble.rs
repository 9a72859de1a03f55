use clap::Args;
use pem::ToPem;
use pkcs10::{
    CertificationRequest, CertificationRequestInfo, HashAlgorithm, PublicKeyAlgorithm,
    SignatureAlgorithmIdentifier, SignatureValue,
};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::utils::{read_input, write_output};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum HashArg {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl From<HashArg> for HashAlgorithm {
    fn from(hash: HashArg) -> Self {
        match hash {
            HashArg::Md5 => HashAlgorithm::Md5,
            HashArg::Sha1 => HashAlgorithm::Sha1,
            HashArg::Sha224 => HashAlgorithm::Sha224,
            HashArg::Sha256 => HashAlgorithm::Sha256,
            HashArg::Sha384 => HashAlgorithm::Sha384,
            HashArg::Sha512 => HashAlgorithm::Sha512,
        }
    }
}

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the DER CertificationRequestInfo produced by `info`
    #[arg(short, long)]
    info: String,

    /// Path to the raw signature over the info bytes
    #[arg(short, long)]
    signature: String,

    /// Hash algorithm the signature was made with
    #[arg(long, value_enum, default_value = "sha256")]
    hash: HashArg,

    /// Write DER instead of PEM
    #[arg(long)]
    der: bool,

    /// Output file. If not specified, writes to stdout
    #[arg(long)]
    out: Option<String>,
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let info = CertificationRequestInfo::from_der(&read_input(Some(&config.info))?)?;
    let signature = SignatureValue::new(read_input(Some(&config.signature))?);
    if signature.as_bytes().is_empty() {
        return Err(Error::InvalidInput(format!(
            "signature file {} is empty",
            config.signature
        )));
    }
    let algorithm = SignatureAlgorithmIdentifier::new(config.hash.into(), PublicKeyAlgorithm::Rsa);

    let request = CertificationRequest::new(info, algorithm, signature);
    let der = request.to_der();

    // read the result back before handing it out
    let decoded = CertificationRequest::from_der(&der)?;
    if decoded != request {
        return Err("assembled request does not decode to the same value".into());
    }
    debug!(len = der.len(), "request verified");
    info!(subject = %request.info.subject, algorithm = %algorithm, "assembled request");

    if config.der {
        write_output(config.out.as_deref(), &der)
    } else {
        let Ok(pem) = request.to_pem();
        write_output(config.out.as_deref(), pem.to_string().as_bytes())
    }
}
