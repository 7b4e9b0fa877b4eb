use crate::crypto::CryptoProvider;
use crate::digest::{DigestAlgorithm, DigestResult};
use crate::envelope::SignatureEnvelope;
use crate::error::{Result, VerifyError};

pub const VALID_SIGNATURE: &str = "Valid Signature";
pub const INVALID_SIGNATURE: &str = "Invalid Signature!";

/// Hash used over the authenticated attributes: SHA-1 when the declared
/// document digest is SHA-1, SHA-256 otherwise.
pub fn signature_algorithm(declared: Option<&DigestResult>) -> DigestAlgorithm {
    match declared {
        Some(d) if d.hex_value.len() == DigestAlgorithm::Sha1.hex_len() => DigestAlgorithm::Sha1,
        _ => DigestAlgorithm::Sha256,
    }
}

/// Checks the signature over the authenticated attributes with the key of
/// the first embedded certificate.
///
/// The attributes are re-tagged as a SET before hashing and the opened
/// signature block is compared by its trailing digest only.
pub fn verify_signature<P: CryptoProvider + ?Sized>(
    provider: &P,
    envelope: &SignatureEnvelope,
    algorithm: DigestAlgorithm,
) -> Result<bool> {
    let signer = envelope
        .certificates
        .first()
        .ok_or_else(|| VerifyError::SignatureDecrypt("no signer certificate".into()))?;

    let capture = &envelope.raw_capture;
    let encoded = provider.encode_attribute_set(&capture.authenticated_attributes_der);
    log::debug!("authenticated attributes: {}", hex::encode(&encoded));

    let expected = hex::encode(provider.digest(algorithm, &encoded));
    let decrypted = provider.rsa_public_decrypt(&signer.public_key, &capture.signature)?;
    let decrypted = hex::encode(decrypted);

    let tail_len = algorithm.hex_len();
    let valid = decrypted.len() >= tail_len
        && decrypted[decrypted.len() - tail_len..].eq_ignore_ascii_case(&expected);

    log::debug!("attributes {:?} hash: {}", algorithm, expected);
    log::info!("{}", if valid { VALID_SIGNATURE } else { INVALID_SIGNATURE });
    Ok(valid)
}
