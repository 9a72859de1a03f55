use clap::Args;
use pkcs10::{CertificationRequestInfo, PublicKeyInfo};
use tracing::info;

use crate::error::Result;
use crate::template::Template;
use crate::utils::{decode_pem_or_der, format_hex_dump, read_input, write_output};

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the request template (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    template: String,

    /// Path to the public key (PEM PUBLIC KEY, PEM RSA PUBLIC KEY, or DER SubjectPublicKeyInfo)
    #[arg(short = 'k', long)]
    public_key: String,

    /// Output file. If not specified, writes to stdout
    #[arg(long)]
    out: Option<String>,

    /// Write a hex dump instead of raw DER
    #[arg(long)]
    hex: bool,
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let template = Template::load(&config.template)?;
    let key_bytes = read_input(Some(&config.public_key))?;
    let public_key_info = decode_pem_or_der(&key_bytes, PublicKeyInfo::from_der)?;

    let info =
        CertificationRequestInfo::new(template.subject, public_key_info, template.extensions);
    let der = info.to_der();
    info!(subject = %info.subject, len = der.len(), "built CertificationRequestInfo");

    if config.hex {
        write_output(config.out.as_deref(), format_hex_dump(&der).as_bytes())
    } else {
        write_output(config.out.as_deref(), &der)
    }
}
