//! csrkit - build and inspect PKCS#10 certification requests
//!
//! The signing key never touches this tool. `info` writes the bytes to sign,
//! an external signer signs them, and `assemble` attaches the signature.
//!
//! ```bash
//! csrkit template > csr.yaml
//! csrkit info --template csr.yaml --public-key key.pub --out info.der
//! openssl dgst -sha256 -sign key.pem -out info.sig info.der
//! csrkit assemble --info info.der --signature info.sig > request.pem
//! csrkit inspect request.pem
//! ```

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod assemble;
mod error;
mod info;
mod inspect;
mod output;
mod template;
mod utils;

use error::Result;

#[derive(Parser)]
#[command(name = "csrkit")]
#[command(version, about = "PKCS#10 certification request toolkit", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an example request template
    Template {
        #[command(flatten)]
        config: template::Config,
    },
    /// Build the DER CertificationRequestInfo to be signed
    Info {
        #[command(flatten)]
        config: info::Config,
    },
    /// Attach an external signature and write the request
    Assemble {
        #[command(flatten)]
        config: assemble::Config,
    },
    /// Decode and display a request
    Inspect {
        #[command(flatten)]
        config: inspect::Config,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("csrkit=debug,pkcs10=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Template { config } => template::execute(config),
        Commands::Info { config } => info::execute(config),
        Commands::Assemble { config } => assemble::execute(config),
        Commands::Inspect { config } => inspect::execute(config),
    }
}
