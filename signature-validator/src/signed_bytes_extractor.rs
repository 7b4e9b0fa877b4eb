use crate::error::{Result, VerifyError};
use crate::field::ByteRange;

/// Rebuilds the bytes covered by a signature: `[lim1, lim2)` followed by
/// `[lim3, lim3 + lim4)`.
pub fn extract_signed_bytes(document: &[u8], byte_range: &ByteRange) -> Result<Vec<u8>> {
    let [lim1, lim2, lim3, lim4] = byte_range.0;
    let malformed = |msg: String| Err(VerifyError::MalformedByteRange(msg));

    if byte_range.0.iter().any(|v| *v < 0) {
        return malformed(format!("negative value in {:?}", byte_range.0));
    }
    if lim1 > lim2 {
        return malformed(format!("first span is reversed ({} > {})", lim1, lim2));
    }
    if lim2 > lim3 {
        return malformed(format!("spans overlap ({} > {})", lim2, lim3));
    }

    let doc_len = document.len() as i64;
    let end = lim3
        .checked_add(lim4)
        .ok_or_else(|| VerifyError::MalformedByteRange("second span overflows".into()))?;
    if lim2 > doc_len || end > doc_len {
        return malformed(format!(
            "range {:?} exceeds document of {} bytes",
            byte_range.0, doc_len
        ));
    }

    // all values are non-negative and within the document
    let (lim1, lim2, lim3, end) = (lim1 as usize, lim2 as usize, lim3 as usize, end as usize);
    let mut signed_data = Vec::with_capacity((lim2 - lim1) + (end - lim3));
    signed_data.extend_from_slice(&document[lim1..lim2]);
    signed_data.extend_from_slice(&document[lim3..end]);
    Ok(signed_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sha2::{Digest, Sha256};

    static SIGNED_PDF: &[u8] = include_bytes!("../../sample-pdfs/signed_sha256.pdf");

    #[test]
    fn signed_pdf_sha256_hash() {
        let signed_data =
            extract_signed_bytes(SIGNED_PDF, &ByteRange::new(0, 500, 16886, 85)).unwrap();
        assert_eq!(signed_data.len(), 585);

        let digest = Sha256::digest(&signed_data);
        assert_eq!(
            hex::encode(digest),
            "80ca6c2fefd2bd1800976b08e87dc9e3af7c301cd9eb653e4d6ff370e2333be9"
        );
    }

    #[test]
    fn concatenates_both_spans() {
        let doc = b"0123456789";
        let out = extract_signed_bytes(doc, &ByteRange::new(1, 3, 6, 2)).unwrap();
        assert_eq!(out, b"1267");

        let out = extract_signed_bytes(doc, &ByteRange::new(0, 0, 10, 0)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn rejects_malformed_ranges() {
        let doc = b"0123456789";
        for range in [
            ByteRange::new(-1, 3, 6, 2),
            ByteRange::new(0, 3, 6, -2),
            ByteRange::new(4, 3, 6, 2),
            ByteRange::new(0, 7, 6, 2),
            ByteRange::new(0, 3, 6, 5),
            ByteRange::new(0, 11, 11, 0),
            ByteRange::new(0, 3, i64::MAX, 1),
        ] {
            assert!(
                matches!(
                    extract_signed_bytes(doc, &range),
                    Err(VerifyError::MalformedByteRange(_))
                ),
                "{:?} accepted",
                range
            );
        }
    }

    proptest! {
        #[test]
        fn excluded_gap_never_leaks(len in 2usize..512, gap in 0usize..64) {
            let half = len / 2;
            let gap = gap.min(len - half);
            // gap bytes are the only 0xff bytes in the document
            let doc: Vec<u8> = (0..len)
                .map(|i| if i >= half && i < half + gap { 0xff } else { (i % 251) as u8 })
                .collect();
            let range = ByteRange::new(
                0,
                half as i64,
                (half + gap) as i64,
                (len - half - gap) as i64,
            );

            let out = extract_signed_bytes(&doc, &range).unwrap();
            prop_assert_eq!(out.len(), len - gap);
            prop_assert!(!out.contains(&0xff));
        }
    }
}
