use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

use crate::chain;
use crate::crypto::{CryptoProvider, RustCryptoProvider};
use crate::digest::{self, DigestResult};
use crate::envelope::{self, SignatureEnvelope};
use crate::error::Result;
use crate::field::SignatureField;
use crate::options::VerifyOptions;
use crate::signature;
use crate::signed_bytes_extractor::extract_signed_bytes;
use crate::verdict::Verdict;

/// Inputs of one run, passed to every stage.
#[derive(Debug, Clone, Copy)]
pub struct VerificationContext<'a> {
    pub document: &'a [u8],
    pub field: &'a SignatureField,
    pub options: &'a VerifyOptions,
}

#[derive(Debug, Clone, Default)]
pub struct Verifier<P: CryptoProvider = RustCryptoProvider> {
    provider: P,
    options: VerifyOptions,
}

impl Verifier<RustCryptoProvider> {
    pub fn new(options: VerifyOptions) -> Self {
        Self::with_provider(RustCryptoProvider, options)
    }
}

impl<P: CryptoProvider> Verifier<P> {
    pub fn with_provider(provider: P, options: VerifyOptions) -> Self {
        Verifier { provider, options }
    }

    pub fn options(&self) -> &VerifyOptions {
        &self.options
    }

    /// Decodes the envelope of `field` without verifying it.
    pub fn envelope(&self, field: &SignatureField) -> Result<SignatureEnvelope> {
        envelope::decode(&field.contents, &self.provider)
    }

    /// Runs every check on `field` and always produces a verdict.
    pub fn verify(&self, document: &[u8], field: &SignatureField) -> Verdict {
        let ctx = VerificationContext {
            document,
            field,
            options: &self.options,
        };
        self.run(&ctx)
    }

    /// Verifies the first signature field of a PDF.
    pub fn verify_document(&self, pdf: &[u8]) -> Result<Verdict> {
        let field = SignatureField::from_pdf(pdf)?;
        Ok(self.verify(pdf, &field))
    }

    /// Verifies every signature field of a PDF in file order.
    pub fn verify_all(&self, pdf: &[u8]) -> Result<Vec<Verdict>> {
        Ok(SignatureField::find_all(pdf)?
            .iter()
            .map(|field| self.verify(pdf, field))
            .collect())
    }

    fn run(&self, ctx: &VerificationContext<'_>) -> Verdict {
        let envelope = self.envelope(ctx.field);
        let declared = envelope
            .as_ref()
            .map_err(Clone::clone)
            .and_then(|env| env.raw_capture.authenticated_attributes.locate_digest());

        let integrity = self.check_integrity(ctx, &declared);
        let certificate = envelope.as_ref().map_err(Clone::clone).and_then(|env| {
            chain::validate_chain(&self.provider, &env.certificates, ctx.options)
        });
        let signature = envelope.as_ref().map_err(Clone::clone).and_then(|env| {
            let algorithm = signature::signature_algorithm(declared.as_ref().ok());
            if let Some(named) = env.raw_capture.digest_algorithm {
                if named != algorithm {
                    log::warn!(
                        "signer names {:?} but attributes are hashed with {:?}",
                        named,
                        algorithm
                    );
                }
            }
            signature::verify_signature(&self.provider, env, algorithm)
        });

        Verdict::aggregate(integrity, certificate, signature)
    }

    fn check_integrity(
        &self,
        ctx: &VerificationContext<'_>,
        declared: &Result<DigestResult>,
    ) -> Result<bool> {
        let signed_bytes = extract_signed_bytes(ctx.document, &ctx.field.byte_range)?;
        let declared = declared.as_ref().map_err(Clone::clone)?;
        let valid = digest::check_integrity(
            |algorithm, data| self.provider.digest(algorithm, data),
            &signed_bytes,
            declared,
        )?;
        log::info!("document integrity {}", if valid { "intact" } else { "altered" });
        Ok(valid)
    }
}

impl<P: CryptoProvider + Clone + 'static> Verifier<P> {
    /// Runs [`Verifier::verify`] on a worker thread.
    ///
    /// The verdict is published once all checks have finished. Dropping the
    /// handle discards it.
    pub fn spawn(&self, document: Arc<[u8]>, field: SignatureField) -> PendingVerification {
        let verifier = self.clone();
        let (sender, receiver) = mpsc::sync_channel(1);
        thread::spawn(move || {
            let verdict = verifier.verify(&document, &field);
            if sender.send(verdict).is_err() {
                log::debug!("verification finished after its handle was dropped");
            }
        });
        PendingVerification { receiver }
    }
}

/// Handle to a verification running in the background.
#[derive(Debug)]
pub struct PendingVerification {
    receiver: Receiver<Verdict>,
}

impl PendingVerification {
    /// Blocks until the verdict is ready. `None` if the worker died.
    pub fn wait(self) -> Option<Verdict> {
        self.receiver.recv().ok()
    }

    /// The verdict, if it is already available.
    pub fn try_verdict(&self) -> Option<Verdict> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::DigestAlgorithm;
    use crate::error::VerifyError;
    use crate::field::ByteRange;

    static SIGNED_PDF: &[u8] = include_bytes!("../../sample-pdfs/signed_sha256.pdf");

    fn verifier() -> Verifier {
        Verifier::new(VerifyOptions::default().at_time(1_893_456_000))
    }

    #[test]
    fn verifies_signed_pdf() {
        let verdict = verifier().verify_document(SIGNED_PDF).unwrap();
        assert!(verdict.is_valid(), "{:?}", verdict);
    }

    #[test]
    fn missing_field_is_fatal() {
        assert!(matches!(
            verifier().verify_document(b"%PDF-1.7\n%%EOF\n"),
            Err(VerifyError::MissingSignatureField(_))
        ));
    }

    #[test]
    fn malformed_byte_range_only_fails_integrity() {
        let mut field = SignatureField::from_pdf(SIGNED_PDF).unwrap();
        field.byte_range = ByteRange::new(0, 500, 16886, 86);
        let verdict = verifier().verify(SIGNED_PDF, &field);
        assert_eq!(verdict.reasons(), ["integrity"]);
        assert!(verdict.details()[0].starts_with("malformed byte range"));
    }

    #[test]
    fn undecodable_contents_fail_every_check() {
        let field = SignatureField::new(b"not hex".to_vec(), ByteRange::new(0, 500, 16886, 85));
        let verdict = verifier().verify(SIGNED_PDF, &field);
        assert_eq!(verdict.reasons(), ["integrity", "certificate", "signature"]);
        assert_eq!(verdict.details().len(), 1);
    }

    #[derive(Clone)]
    struct BrokenHashes;

    impl CryptoProvider for BrokenHashes {
        fn parse_pkcs7_pem(&self, pem: &str) -> Result<SignatureEnvelope> {
            RustCryptoProvider.parse_pkcs7_pem(pem)
        }
        fn encode_attribute_set(&self, content: &[u8]) -> Vec<u8> {
            RustCryptoProvider.encode_attribute_set(content)
        }
        fn digest(&self, algorithm: DigestAlgorithm, _data: &[u8]) -> Vec<u8> {
            vec![0; algorithm.hex_len() / 2]
        }
        fn rsa_public_decrypt(&self, key: &crate::PublicKey, signature: &[u8]) -> Result<Vec<u8>> {
            RustCryptoProvider.rsa_public_decrypt(key, signature)
        }
        fn verify_certificate_chain(
            &self,
            anchors: &[crate::Certificate],
            chain: &[&crate::Certificate],
            options: &VerifyOptions,
        ) -> Vec<String> {
            RustCryptoProvider.verify_certificate_chain(anchors, chain, options)
        }
    }

    #[test]
    fn stages_use_the_injected_provider() {
        let options = VerifyOptions::default().at_time(1_893_456_000);
        let verifier = Verifier::with_provider(BrokenHashes, options);
        let verdict = verifier.verify_document(SIGNED_PDF).unwrap();
        assert_eq!(verdict.reasons(), ["integrity", "signature"]);
    }

    /// Reports each RSA decryption, the last step of a run.
    #[derive(Clone)]
    struct ReportsSignatureStage(mpsc::SyncSender<()>);

    impl CryptoProvider for ReportsSignatureStage {
        fn parse_pkcs7_pem(&self, pem: &str) -> Result<SignatureEnvelope> {
            RustCryptoProvider.parse_pkcs7_pem(pem)
        }
        fn encode_attribute_set(&self, content: &[u8]) -> Vec<u8> {
            RustCryptoProvider.encode_attribute_set(content)
        }
        fn digest(&self, algorithm: DigestAlgorithm, data: &[u8]) -> Vec<u8> {
            RustCryptoProvider.digest(algorithm, data)
        }
        fn rsa_public_decrypt(&self, key: &crate::PublicKey, signature: &[u8]) -> Result<Vec<u8>> {
            let decrypted = RustCryptoProvider.rsa_public_decrypt(key, signature);
            let _ = self.0.send(());
            decrypted
        }
        fn verify_certificate_chain(
            &self,
            anchors: &[crate::Certificate],
            chain: &[&crate::Certificate],
            options: &VerifyOptions,
        ) -> Vec<String> {
            RustCryptoProvider.verify_certificate_chain(anchors, chain, options)
        }
    }

    #[test]
    fn background_verification() {
        let field = SignatureField::from_pdf(SIGNED_PDF).unwrap();
        let pending = verifier().spawn(Arc::from(SIGNED_PDF), field.clone());
        let verdict = pending.wait().unwrap();
        assert!(verdict.is_valid());
    }

    #[test]
    fn dropped_handle_lets_the_worker_finish() {
        let (reached, signature_stage) = mpsc::sync_channel(1);
        let options = VerifyOptions::default().at_time(1_893_456_000);
        let verifier = Verifier::with_provider(ReportsSignatureStage(reached), options);
        let field = SignatureField::from_pdf(SIGNED_PDF).unwrap();

        drop(verifier.spawn(Arc::from(SIGNED_PDF), field));
        drop(verifier);
        signature_stage
            .recv_timeout(std::time::Duration::from_secs(30))
            .unwrap();
    }
}
