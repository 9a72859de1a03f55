use std::path::Path;

use clap::Args;
use pkcs10::extensions::{ExtendedKeyUsage, KeyPurpose, KeyUsage, KeyUsageBit};
use pkcs10::{AttributeKind, DistinguishedName, ExtensionAttribute, ExtensionAttributeList};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::utils::{read_input, write_output};

/// Subject and requested extensions of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Template {
    pub(crate) subject: DistinguishedName,
    #[serde(default)]
    pub(crate) extensions: ExtensionAttributeList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum TemplateFormat {
    Yaml,
    Json,
}

impl TemplateFormat {
    /// `.json` files are JSON, anything else is read as YAML.
    fn from_path(path: &str) -> Self {
        match Path::new(path).extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => TemplateFormat::Json,
            _ => TemplateFormat::Yaml,
        }
    }
}

impl Template {
    pub(crate) fn demo() -> Self {
        let mut subject = DistinguishedName::default();
        subject.push(AttributeKind::CommonName, "node.fcomb.io");
        subject.push(AttributeKind::OrganizationName, "fcomb");

        let extensions = ExtensionAttributeList::new(vec![
            ExtensionAttribute::ExtendedKeyUsage(ExtendedKeyUsage::new(vec![
                KeyPurpose::ServerAuth,
                KeyPurpose::CodeSigning,
            ])),
            ExtensionAttribute::KeyUsage(KeyUsage::new([
                KeyUsageBit::CrlSign,
                KeyUsageBit::DigitalSignature,
            ])),
        ]);
        Template {
            subject,
            extensions,
        }
    }

    pub(crate) fn parse(text: &str, format: TemplateFormat) -> Result<Self> {
        match format {
            TemplateFormat::Yaml => Ok(serde_yml::from_str(text)?),
            TemplateFormat::Json => Ok(serde_json::from_str(text)?),
        }
    }

    /// Template files must be valid UTF-8.
    pub(crate) fn from_bytes(bytes: Vec<u8>, format: TemplateFormat) -> Result<Self> {
        let text = String::from_utf8(bytes)?;
        Template::parse(&text, format)
    }

    pub(crate) fn load(path: &str) -> Result<Self> {
        let format = TemplateFormat::from_path(path);
        let template = Template::from_bytes(read_input(Some(path))?, format)?;
        debug!(
            path,
            subject = %template.subject,
            extensions = template.extensions.len(),
            "loaded template"
        );
        Ok(template)
    }

    pub(crate) fn render(&self, format: TemplateFormat) -> Result<String> {
        match format {
            TemplateFormat::Yaml => Ok(serde_yml::to_string(self)?),
            TemplateFormat::Json => Ok(serde_json::to_string_pretty(self)? + "\n"),
        }
    }
}

#[derive(Args)]
pub(crate) struct Config {
    /// Template format
    #[arg(short, long, value_enum, default_value = "yaml")]
    format: TemplateFormat,

    /// Output file. If not specified, writes to stdout
    #[arg(long)]
    out: Option<String>,
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let text = Template::demo().render(config.format)?;
    write_output(config.out.as_deref(), text.as_bytes())
}
