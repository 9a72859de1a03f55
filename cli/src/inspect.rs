use clap::Args;
use pkcs10::CertificationRequest;

use crate::error::Result;
use crate::output::{OutputFormat, to_structured};
use crate::utils::{decode_pem_or_der, read_input};

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the request (PEM or DER format). If not specified, reads from stdin
    file: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Show only subject
    #[arg(long)]
    show_subject: bool,

    /// Show only requested extensions
    #[arg(long)]
    show_extensions: bool,
}

impl Config {
    fn should_show_specific_fields(&self) -> bool {
        self.show_subject || self.show_extensions
    }
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let input = read_input(config.file.as_deref())?;
    let request = decode_pem_or_der(&input, CertificationRequest::from_der)?;

    if config.should_show_specific_fields() {
        let info = &request.info;
        if config.show_subject {
            println!("Subject: {}", info.subject);
        }
        if config.show_extensions {
            for ext in info.attributes.iter() {
                println!("{}: {}", ext.kind(), ext);
            }
        }
        return Ok(());
    }

    match to_structured(&request, config.output)? {
        Some(text) => println!("{}", text.trim_end()),
        None => print!("{request}"),
    }
    Ok(())
}
