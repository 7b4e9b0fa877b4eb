//! Real-world signed documents kept outside the repository.
//!
//! Drop PDFs into `samples-private/` at the workspace root and run with
//! `--features private_tests`.
#![cfg(feature = "private_tests")]

use std::path::Path;

use signature_validator::{Verifier, VerifyOptions};

#[test]
fn private_samples_verify() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../samples-private");
    let entries = std::fs::read_dir(&dir).expect("samples-private directory");
    let verifier = Verifier::new(VerifyOptions::default().with_validity_check(false));

    let mut checked = 0;
    for entry in entries {
        let path = entry.unwrap().path();
        if path.extension().and_then(|e| e.to_str()) != Some("pdf") {
            continue;
        }
        let pdf = std::fs::read(&path).unwrap();
        for verdict in verifier.verify_all(&pdf).unwrap() {
            assert!(verdict.valid_integrity(), "{}: {:?}", path.display(), verdict);
            assert!(verdict.valid_signature(), "{}: {:?}", path.display(), verdict);
        }
        checked += 1;
    }
    assert!(checked > 0, "no PDFs in {}", dir.display());
}
