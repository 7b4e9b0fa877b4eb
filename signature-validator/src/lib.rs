//! Verification of detached PKCS#7/CMS signatures embedded in PDF files.
//!
//! ```no_run
//! use signature_validator::{Verifier, VerifyOptions};
//!
//! let pdf = std::fs::read("signed.pdf")?;
//! let verdict = Verifier::new(VerifyOptions::default()).verify_document(&pdf)?;
//! println!("{}", verdict.overall_status());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod attributes;
pub mod certificate;
pub mod chain;
pub mod crypto;
mod der;
pub mod digest;
pub mod envelope;
pub mod error;
pub mod field;
pub mod options;
pub mod pkcs7_signature;
pub mod signature;
pub mod signed_bytes_extractor;
pub mod verdict;
pub mod verifier;

pub use attributes::AttributeNode;
pub use certificate::{Certificate, Extension, NameAttribute, PublicKey};
pub use crypto::{CryptoProvider, RustCryptoProvider};
pub use digest::{DigestAlgorithm, DigestResult};
pub use envelope::{RawCapture, SignatureEnvelope};
pub use error::{Result, VerifyError};
pub use field::{ByteRange, SignatureField};
pub use options::VerifyOptions;
pub use verdict::Verdict;
pub use verifier::{PendingVerification, VerificationContext, Verifier};
