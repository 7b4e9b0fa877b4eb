use base64::{engine::general_purpose::STANDARD, Engine as _};
use num_bigint::BigUint;

use crate::attributes::AttributeNode;
use crate::certificate::Certificate;
use crate::crypto::CryptoProvider;
use crate::digest::DigestAlgorithm;
use crate::error::{Result, VerifyError};

pub const PEM_BEGIN: &str = "-----BEGIN PKCS7-----";
pub const PEM_END: &str = "-----END PKCS7-----";
const PEM_COLUMNS: usize = 64;

/// Signed values captured verbatim from the first SignerInfo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCapture {
    pub authenticated_attributes: AttributeNode,
    /// Content octets of the `[0] IMPLICIT` attribute set.
    pub authenticated_attributes_der: Vec<u8>,
    pub signature: Vec<u8>,
    /// Digest algorithm named by the SignerInfo, when it is one we know.
    pub digest_algorithm: Option<DigestAlgorithm>,
    /// Serial number from issuerAndSerialNumber.
    pub signer_serial: Option<BigUint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEnvelope {
    /// Certificates in the order they were embedded.
    pub certificates: Vec<Certificate>,
    pub raw_capture: RawCapture,
}

/// Turns the field's hex contents into the PEM text handed to the provider.
pub fn frame_contents(contents: &[u8]) -> Result<String> {
    let hex: Vec<u8> = contents
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let der = hex::decode(&hex)
        .map_err(|e| VerifyError::EnvelopeDecode(format!("invalid hex contents: {}", e)))?;
    Ok(frame_pem(&der))
}

pub fn frame_pem(der: &[u8]) -> String {
    let encoded = STANDARD.encode(der);
    let mut pem = String::with_capacity(encoded.len() + encoded.len() / PEM_COLUMNS + 48);
    pem.push_str(PEM_BEGIN);
    pem.push('\n');
    for line in encoded.as_bytes().chunks(PEM_COLUMNS) {
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str(PEM_END);
    pem.push('\n');
    pem
}

/// Strips the PKCS7 framing and returns the encoded bytes.
pub fn unframe_pem(pem: &str) -> Result<Vec<u8>> {
    let body = pem
        .trim()
        .strip_prefix(PEM_BEGIN)
        .and_then(|rest| rest.strip_suffix(PEM_END))
        .ok_or_else(|| VerifyError::EnvelopeDecode("missing PKCS7 framing".into()))?;
    let body: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(body)
        .map_err(|e| VerifyError::EnvelopeDecode(format!("invalid base64: {}", e)))
}

/// Decodes a signature field's contents into an envelope.
pub fn decode<P: CryptoProvider + ?Sized>(
    contents: &[u8],
    provider: &P,
) -> Result<SignatureEnvelope> {
    let pem = frame_contents(contents)?;
    let envelope = provider.parse_pkcs7_pem(&pem)?;

    log::debug!(
        "envelope holds {} certificate(s) and a {} byte signature",
        envelope.certificates.len(),
        envelope.raw_capture.signature.len()
    );
    if let (Some(serial), Some(first)) = (
        envelope.raw_capture.signer_serial.as_ref(),
        envelope.certificates.first(),
    ) {
        if *serial != first.serial {
            log::warn!(
                "signer serial {:x} differs from first certificate serial {:x}",
                serial,
                first.serial
            );
        }
    }
    Ok(envelope)
}
