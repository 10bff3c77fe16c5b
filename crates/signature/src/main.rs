use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use notation_signature::{Algorithm, Certificate, SignRequest, SignerInfo, verify_authenticity};
use serde::de::DeserializeOwned;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "notation-sig", version, about = "Inspect signer info and sign requests")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true, env = "NOTATION_SIG_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the authentic signing time of a signer info (JSON).
    AuthenticTime {
        #[arg(env = "NOTATION_SIG_SIGNER_INFO")]
        signer_info: PathBuf,
    },
    /// Validate a sign request (JSON) without signing it.
    Validate {
        #[arg(env = "NOTATION_SIG_SIGN_REQUEST")]
        request: PathBuf,
    },
    /// Check that a signer info's chain contains a trusted certificate.
    Trust {
        #[arg(env = "NOTATION_SIG_SIGNER_INFO")]
        signer_info: PathBuf,
        /// JSON array of hex-encoded DER certificates
        #[arg(long, env = "NOTATION_SIG_TRUSTED_CERTS")]
        trusted_certs: PathBuf,
    },
    /// List supported signature algorithms.
    Algorithms,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match args.command {
        Command::AuthenticTime { signer_info } => {
            let info: SignerInfo = read_json(&signer_info)?;
            match info.authentic_signing_time() {
                Ok(time) => println!("{}", time.to_rfc3339()),
                Err(err) if info.timestamp_token().is_some() => {
                    bail!("{err}; derive signing time from the attached timestamp token instead")
                }
                Err(err) => bail!(err),
            }
        }
        Command::Validate { request } => {
            let request: SignRequest = read_json(&request)?;
            request.validate()?;
            println!("sign request is valid");
        }
        Command::Trust {
            signer_info,
            trusted_certs,
        } => {
            let info: SignerInfo = read_json(&signer_info)?;
            let trusted: Vec<Certificate> = read_json(&trusted_certs)?;
            let anchor = verify_authenticity(&info, &trusted)?;
            println!("trusted by {}", anchor.fingerprint());
        }
        Command::Algorithms => {
            for alg in Algorithm::ALL {
                let spec = alg.key_spec();
                println!("{alg}\t{:?} {}", spec.key_type, spec.size);
            }
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}
