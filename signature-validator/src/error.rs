/// Result type alias for verification operations.
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Failures raised by the individual verification stages.
///
/// All kinds except [`VerifyError::MissingSignatureField`] are recovered by the
/// pipeline and reported as a failed check in the [`crate::Verdict`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// Byte range values are negative, out of order or outside the document.
    #[error("malformed byte range: {0}")]
    MalformedByteRange(String),

    /// The signature contents could not be decoded into a signed-data envelope.
    #[error("cannot decode signature envelope: {0}")]
    EnvelopeDecode(String),

    /// No 20 or 32 byte value exists in the authenticated attributes.
    #[error("no message digest found in authenticated attributes")]
    DigestNotFound,

    /// A digest whose hex length matches neither SHA-1 nor SHA-256.
    #[error("unsupported digest algorithm for a {0} character digest")]
    UnsupportedDigestAlgorithm(usize),

    /// The embedded certificates do not form a usable chain.
    #[error("cannot build certificate chain: {0}")]
    ChainBuild(String),

    /// The chain was built but failed verification against its anchor.
    #[error("certificate chain rejected: {0}")]
    CertificateRejected(String),

    /// The signature could not be opened with the signer's public key.
    #[error("cannot decrypt signature: {0}")]
    SignatureDecrypt(String),

    /// The document has no usable signature field.
    #[error("signature field missing: {0}")]
    MissingSignatureField(String),
}
