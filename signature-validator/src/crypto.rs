use std::time::{SystemTime, UNIX_EPOCH};

use num_bigint::BigUint;
use num_traits::Zero;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use x509_parser::prelude::*;

use crate::certificate::{Certificate, PublicKey};
use crate::der;
use crate::digest::DigestAlgorithm;
use crate::envelope::{self, SignatureEnvelope};
use crate::error::{Result, VerifyError};
use crate::options::VerifyOptions;
use crate::pkcs7_signature;

/// Backend the verification stages use for ASN.1, hashing, RSA and X.509.
pub trait CryptoProvider: Send + Sync {
    /// Parses a PEM framed PKCS7 container.
    fn parse_pkcs7_pem(&self, pem: &str) -> Result<SignatureEnvelope>;

    /// Encodes the content octets of an attribute set as a universal SET.
    fn encode_attribute_set(&self, content: &[u8]) -> Vec<u8>;

    fn digest(&self, algorithm: DigestAlgorithm, data: &[u8]) -> Vec<u8>;

    /// Raw public key operation `s^e mod n`, left padded to the modulus
    /// length. Padding is not removed.
    fn rsa_public_decrypt(&self, key: &PublicKey, signature: &[u8]) -> Result<Vec<u8>>;

    /// Verifies `chain` (leaf first, anchor last) against `anchors` and
    /// returns every problem found. An empty list means the chain is trusted.
    fn verify_certificate_chain(
        &self,
        anchors: &[Certificate],
        chain: &[&Certificate],
        options: &VerifyOptions,
    ) -> Vec<String>;
}

/// Default provider built on `simple_asn1`, `sha1`/`sha2`, `rsa` and
/// `x509-parser`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoProvider;

impl CryptoProvider for RustCryptoProvider {
    fn parse_pkcs7_pem(&self, pem: &str) -> Result<SignatureEnvelope> {
        let der_bytes = envelope::unframe_pem(pem)?;
        pkcs7_signature::parse_signed_data(&der_bytes)
    }

    fn encode_attribute_set(&self, content: &[u8]) -> Vec<u8> {
        der::wrap(der::TAG_SET, content)
    }

    fn digest(&self, algorithm: DigestAlgorithm, data: &[u8]) -> Vec<u8> {
        algorithm.hash(data)
    }

    fn rsa_public_decrypt(&self, key: &PublicKey, signature: &[u8]) -> Result<Vec<u8>> {
        let (modulus, exponent) = match key {
            PublicKey::Rsa { modulus, exponent } => (modulus, exponent),
            PublicKey::Unsupported { algorithm } => {
                return Err(VerifyError::SignatureDecrypt(format!(
                    "public key algorithm {} is not RSA",
                    algorithm
                )))
            }
        };

        // rejects keys the rsa crate would refuse to use
        let rsa_key = RsaPublicKey::new(
            rsa::BigUint::from_bytes_be(modulus),
            rsa::BigUint::from_bytes_be(exponent),
        )
        .map_err(|e| VerifyError::SignatureDecrypt(format!("invalid RSA key: {}", e)))?;
        let size = rsa_key.size();

        let n = BigUint::from_bytes_be(modulus);
        let e = BigUint::from_bytes_be(exponent);
        let s = BigUint::from_bytes_be(signature);
        if s.is_zero() {
            return Err(VerifyError::SignatureDecrypt("empty signature".into()));
        }
        if s >= n {
            return Err(VerifyError::SignatureDecrypt(
                "signature is not smaller than the modulus".into(),
            ));
        }

        let m = s.modpow(&e, &n).to_bytes_be();
        let mut block = vec![0u8; size.saturating_sub(m.len())];
        block.extend_from_slice(&m);
        log::trace!("opened {} byte signature block", block.len());
        Ok(block)
    }

    fn verify_certificate_chain(
        &self,
        anchors: &[Certificate],
        chain: &[&Certificate],
        options: &VerifyOptions,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        let Some(last) = chain.last() else {
            errors.push("empty certificate chain".to_string());
            return errors;
        };

        let mut parsed = Vec::with_capacity(chain.len());
        for (i, cert) in chain.iter().enumerate() {
            match parse_x509_certificate(&cert.der) {
                Ok((_, x509)) => parsed.push(x509),
                Err(e) => {
                    errors.push(format!("certificate at depth {} does not parse: {}", i, e));
                    return errors;
                }
            }
        }

        if options.check_validity_period {
            let now = options.verification_time.unwrap_or_else(unix_now);
            for (i, x509) in parsed.iter().enumerate() {
                let subject = x509.subject().to_string();
                if now < x509.validity().not_before.timestamp() {
                    errors.push(format!(
                        "certificate at depth {} ({}) is not yet valid",
                        i, subject
                    ));
                }
                if now > x509.validity().not_after.timestamp() {
                    errors.push(format!(
                        "certificate at depth {} ({}) has expired",
                        i, subject
                    ));
                }
            }
        }

        // every issuer must be a CA, and may limit the intermediates below it
        for (i, x509) in parsed.iter().enumerate().skip(1) {
            let subject = x509.subject().to_string();
            match x509.basic_constraints().ok().flatten().map(|bc| bc.value) {
                Some(constraints) if constraints.ca => {
                    if let Some(pathlen) = constraints.path_len_constraint {
                        let intermediates_below = (i - 1) as u32;
                        if intermediates_below > pathlen {
                            errors.push(format!(
                                "certificate at depth {} ({}) path length constraint violated",
                                i, subject
                            ));
                        }
                    }
                }
                _ => errors.push(format!(
                    "certificate at depth {} ({}) is not a CA but is used as issuer",
                    i, subject
                )),
            }
        }

        for (i, (child, parent)) in parsed.iter().zip(parsed.iter().skip(1)).enumerate() {
            if child.issuer().as_raw() != parent.subject().as_raw() {
                errors.push(format!(
                    "certificate at depth {} was not issued by {}",
                    i,
                    parent.subject()
                ));
                continue;
            }
            if let Err(e) = child.verify_signature(Some(parent.public_key())) {
                errors.push(format!(
                    "signature verification failed ({} -> {}): {}",
                    child.subject(),
                    parent.subject(),
                    e
                ));
            }
        }

        let root = &parsed[parsed.len() - 1];
        if !anchors.iter().any(|anchor| anchor.der == last.der) {
            errors.push(format!("root certificate ({}) is not trusted", root.subject()));
        } else if root.subject().as_raw() == root.issuer().as_raw()
            && root.verify_signature(None).is_err()
        {
            errors.push(format!(
                "self-signed root ({}) has an invalid signature",
                root.subject()
            ));
        }

        log::trace!("chain of {} verified with {} problem(s)", chain.len(), errors.len());
        errors
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
