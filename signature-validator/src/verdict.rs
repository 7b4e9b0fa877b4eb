use crate::error::Result;
use crate::signature::{INVALID_SIGNATURE, VALID_SIGNATURE};

pub const VALID_CERTIFICATE: &str = "Valid Certificate!";
pub const INVALID_CERTIFICATE: &str = "Invalid Certificate!";
pub const DOCUMENT_VALID: &str = "The authentication on this document is valid!";
pub const DOCUMENT_INVALID: &str = "The authentication on this document is invalid!";

/// Outcome of the three checks for one signature field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    valid_integrity: bool,
    valid_certificate: bool,
    valid_signature: bool,
    reasons: Vec<String>,
    details: Vec<String>,
}

impl Verdict {
    /// Combines the stage outcomes. Errors count as failed checks and their
    /// messages are kept as details.
    pub fn aggregate(
        integrity: Result<bool>,
        certificate: Result<bool>,
        signature: Result<bool>,
    ) -> Self {
        let mut reasons = Vec::new();
        let mut details = Vec::new();
        let mut judge = |name: &str, outcome: Result<bool>| -> bool {
            let passed = match outcome {
                Ok(passed) => passed,
                Err(e) => {
                    let message = e.to_string();
                    log::warn!("{} check failed: {}", name, message);
                    if !details.contains(&message) {
                        details.push(message);
                    }
                    false
                }
            };
            if !passed {
                reasons.push(name.to_string());
            }
            passed
        };

        let valid_integrity = judge("integrity", integrity);
        let valid_certificate = judge("certificate", certificate);
        let valid_signature = judge("signature", signature);

        let verdict = Verdict {
            valid_integrity,
            valid_certificate,
            valid_signature,
            reasons,
            details,
        };
        log::info!("{}", verdict.overall_status());
        verdict
    }

    pub fn valid_integrity(&self) -> bool {
        self.valid_integrity
    }

    pub fn valid_certificate(&self) -> bool {
        self.valid_certificate
    }

    pub fn valid_signature(&self) -> bool {
        self.valid_signature
    }

    pub fn is_valid(&self) -> bool {
        self.valid_integrity && self.valid_certificate && self.valid_signature
    }

    /// Names of the failed checks, in pipeline order.
    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn details(&self) -> &[String] {
        &self.details
    }

    pub fn certification_status(&self) -> &'static str {
        if self.valid_certificate {
            VALID_CERTIFICATE
        } else {
            INVALID_CERTIFICATE
        }
    }

    pub fn signature_status(&self) -> &'static str {
        if self.valid_signature {
            VALID_SIGNATURE
        } else {
            INVALID_SIGNATURE
        }
    }

    pub fn overall_status(&self) -> &'static str {
        if self.is_valid() {
            DOCUMENT_VALID
        } else {
            DOCUMENT_INVALID
        }
    }
}
