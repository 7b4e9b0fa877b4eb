use crate::certificate::Certificate;
use crate::crypto::CryptoProvider;
use crate::error::{Result, VerifyError};
use crate::options::VerifyOptions;

/// Orders the embedded certificates leaf first with the anchor last.
///
/// The anchor is the CA-flagged certificate at the end of the list, or else
/// at the start, in which case the remaining certificates are reversed.
pub fn order_chain(certificates: &[Certificate]) -> Result<Vec<&Certificate>> {
    let last = certificates
        .len()
        .checked_sub(1)
        .ok_or_else(|| VerifyError::ChainBuild("no certificates in envelope".into()))?;

    let ca_indices: Vec<usize> = certificates
        .iter()
        .enumerate()
        .filter(|(_, cert)| cert.is_ca())
        .map(|(i, _)| i)
        .collect();

    match ca_indices.as_slice() {
        [] => Err(VerifyError::ChainBuild("no CA certificate in chain".into())),
        indices if indices.len() > 2 => Err(VerifyError::ChainBuild(format!(
            "{} CA certificates make the chain orientation ambiguous",
            indices.len()
        ))),
        [.., l] if *l == last => {
            log_anchor(&certificates[last], last);
            Ok(certificates.iter().collect())
        }
        [0, ..] => {
            log_anchor(&certificates[0], 0);
            let mut chain: Vec<&Certificate> = certificates[1..].iter().rev().collect();
            chain.push(&certificates[0]);
            Ok(chain)
        }
        _ => Err(VerifyError::ChainBuild(
            "CA certificates are neither first nor last".into(),
        )),
    }
}

fn log_anchor(anchor: &Certificate, position: usize) {
    log::info!(
        "root CA: {} (position {})",
        anchor.common_name().unwrap_or("<no CN>"),
        position
    );
}

/// Verifies the embedded chain against a store holding only its anchor.
pub fn validate_chain<P: CryptoProvider + ?Sized>(
    provider: &P,
    certificates: &[Certificate],
    options: &VerifyOptions,
) -> Result<bool> {
    let chain = order_chain(certificates)?;
    let anchor = chain[chain.len() - 1];

    let problems =
        provider.verify_certificate_chain(std::slice::from_ref(anchor), &chain, options);
    if problems.is_empty() {
        Ok(true)
    } else {
        Err(VerifyError::CertificateRejected(problems.join("; ")))
    }
}
