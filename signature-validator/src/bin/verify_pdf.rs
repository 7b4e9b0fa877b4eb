use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use signature_validator::{SignatureField, Verifier, VerifyOptions};

#[derive(Parser)]
#[command(name = "verify-pdf")]
#[command(about = "Verify the detached PKCS#7 signatures of a PDF document")]
#[command(long_about = "
Verify the detached PKCS#7 signatures of a PDF document

For every signature field the document integrity, the embedded certificate
chain and the signature over the authenticated attributes are checked.

ENVIRONMENT VARIABLES:
    RUST_LOG        Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    /// Signed PDF file
    #[arg(value_name = "INPUT_FILE")]
    input_file: PathBuf,

    /// Skip certificate validity period checks
    #[arg(long)]
    no_time_check: bool,

    /// Judge certificate validity at this Unix time instead of now
    #[arg(long, value_name = "UNIX_SECONDS")]
    at: Option<i64>,

    /// Print the certificates embedded in each signature
    #[arg(short = 'c', long)]
    list_certs: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let pdf = match std::fs::read(&cli.input_file) {
        Ok(pdf) => pdf,
        Err(e) => {
            log::error!("cannot read {}: {}", cli.input_file.display(), e);
            return ExitCode::from(2);
        }
    };

    let mut options = VerifyOptions::new().with_validity_check(!cli.no_time_check);
    if let Some(at) = cli.at {
        options = options.at_time(at);
    }
    let verifier = Verifier::new(options);

    let fields = match SignatureField::find_all(&pdf) {
        Ok(fields) => fields,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(2);
        }
    };

    let mut all_valid = true;
    for (i, field) in fields.iter().enumerate() {
        println!("Signature {} (byte range {:?})", i + 1, field.byte_range.0);

        if cli.list_certs {
            match verifier.envelope(field) {
                Ok(envelope) => {
                    for (n, cert) in envelope.certificates.iter().enumerate() {
                        println!("  certificate {}", n);
                        for line in cert.to_string().lines() {
                            println!("    {}", line);
                        }
                    }
                }
                Err(e) => println!("  certificates unavailable: {}", e),
            }
        }

        let verdict = verifier.verify(&pdf, field);
        println!("  {}", verdict.certification_status());
        println!("  {}", verdict.signature_status());
        println!("  {}", verdict.overall_status());
        for detail in verdict.details() {
            println!("  - {}", detail);
        }
        all_valid &= verdict.is_valid();
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
