use std::str;

use memchr::{memchr, memmem};

use crate::error::{Result, VerifyError};

/// `[start1, end1, start2, len2]` as written in the signature dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange(pub [i64; 4]);

impl ByteRange {
    pub fn new(start1: i64, end1: i64, start2: i64, len2: i64) -> Self {
        ByteRange([start1, end1, start2, len2])
    }

    /// The span `[end1, start2)` left out of the signature, when it is sane
    /// for a document of `doc_len` bytes.
    pub fn gap(&self, doc_len: usize) -> Option<(usize, usize)> {
        let [_, end1, start2, _] = self.0;
        let end1 = usize::try_from(end1).ok()?;
        let start2 = usize::try_from(start2).ok()?;
        (end1 <= start2 && start2 <= doc_len).then_some((end1, start2))
    }
}

/// A signature value together with the byte range it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureField {
    /// Hex text of the detached signature, as stored between `<` and `>`.
    pub contents: Vec<u8>,
    pub byte_range: ByteRange,
}

impl SignatureField {
    pub fn new(contents: impl Into<Vec<u8>>, byte_range: ByteRange) -> Self {
        SignatureField {
            contents: contents.into(),
            byte_range,
        }
    }

    /// First signature field of the document.
    pub fn from_pdf(document: &[u8]) -> Result<SignatureField> {
        Self::find_all(document)?
            .into_iter()
            .next()
            .ok_or_else(|| VerifyError::MissingSignatureField("no /ByteRange entry".into()))
    }

    /// Every signature field of the document in file order.
    ///
    /// Occurrences of `/ByteRange` that cannot be read as a field are
    /// skipped. Fails only when no field is left.
    pub fn find_all(document: &[u8]) -> Result<Vec<SignatureField>> {
        let mut fields = Vec::new();
        let mut last_error = None;
        for br_pos in memmem::find_iter(document, b"/ByteRange") {
            match field_at(document, br_pos) {
                Ok(field) => fields.push(field),
                Err(e) => {
                    log::warn!("skipping /ByteRange at offset {}: {}", br_pos, e);
                    last_error = Some(e);
                }
            }
        }

        if fields.is_empty() {
            return Err(last_error.unwrap_or_else(|| {
                VerifyError::MissingSignatureField("no /ByteRange entry".into())
            }));
        }
        Ok(fields)
    }
}

fn field_at(document: &[u8], br_pos: usize) -> Result<SignatureField> {
    let (byte_range, after) = parse_byte_range(document, br_pos)?;
    let contents = match byte_range.gap(document.len()) {
        Some((from, to)) => hex_string_in(&document[from..to]),
        None => None,
    }
    .or_else(|| contents_after(document, after))
    .ok_or_else(|| {
        VerifyError::MissingSignatureField(format!(
            "no /Contents hex string for byte range at offset {}",
            br_pos
        ))
    })?;

    log::debug!(
        "signature field at offset {}: byte range {:?}, {} hex characters",
        br_pos,
        byte_range.0,
        contents.len()
    );
    Ok(SignatureField {
        contents: contents.to_vec(),
        byte_range,
    })
}

/// Parses the array following `/ByteRange` and returns it with the offset of
/// the closing bracket.
fn parse_byte_range(document: &[u8], br_pos: usize) -> Result<(ByteRange, usize)> {
    let malformed = |msg: &str| VerifyError::MissingSignatureField(msg.to_string());

    let open = memchr(b'[', &document[br_pos..])
        .ok_or_else(|| malformed("ByteRange '[' not found"))?
        + br_pos
        + 1;
    let close = memchr(b']', &document[open..])
        .ok_or_else(|| malformed("ByteRange ']' not found"))?
        + open;
    let text = str::from_utf8(&document[open..close])
        .map_err(|_| malformed("ByteRange is not ASCII"))?;

    let nums = text
        .split_whitespace()
        .map(|s| s.parse::<i64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| malformed("ByteRange holds a non-integer value"))?;
    let values: [i64; 4] = nums
        .try_into()
        .map_err(|_| malformed("expected exactly 4 numbers inside ByteRange"))?;

    Ok((ByteRange(values), close))
}

/// Content of the first `<...>` string in `region`.
fn hex_string_in(region: &[u8]) -> Option<&[u8]> {
    let start = memchr(b'<', region)? + 1;
    let end = memchr(b'>', &region[start..])? + start;
    Some(&region[start..end])
}

fn contents_after(document: &[u8], from: usize) -> Option<&[u8]> {
    let pos = memmem::find(&document[from..], b"/Contents")? + from;
    hex_string_in(&document[pos..])
}

#[cfg(test)]
mod tests {
    use super::*;

    static SIGNED_PDF: &[u8] = include_bytes!("../../sample-pdfs/signed_sha256.pdf");

    #[test]
    fn finds_field_in_signed_pdf() {
        let field = SignatureField::from_pdf(SIGNED_PDF).unwrap();
        assert_eq!(field.byte_range, ByteRange::new(0, 500, 16886, 85));
        assert_eq!(field.contents.len(), 16384);
        assert!(field.contents.starts_with(b"308208a9"));
    }

    #[test]
    fn finds_every_field() {
        let doc = b"<< /ByteRange [0 5 9 3] /Contents <ab> >>\n\
                    << /ByteRange [0 52 58 0] /Contents <cdef> >>";
        let fields = SignatureField::find_all(doc).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].contents, b"ab");
        assert_eq!(fields[1].contents, b"cdef");
        assert_eq!(fields[1].byte_range, ByteRange::new(0, 52, 58, 0));
    }

    #[test]
    fn negative_range_still_yields_contents() {
        let doc = b"<< /ByteRange [-1 5 10 2] /Contents <abcd> >>";
        let field = SignatureField::from_pdf(doc).unwrap();
        assert_eq!(field.byte_range.0[0], -1);
        assert_eq!(field.contents, b"abcd");
    }

    #[test]
    fn missing_or_malformed_fields() {
        assert!(matches!(
            SignatureField::from_pdf(b"%PDF-1.7\n%%EOF"),
            Err(VerifyError::MissingSignatureField(_))
        ));
        assert!(matches!(
            SignatureField::from_pdf(b"/ByteRange [0 10 20] /Contents <00>"),
            Err(VerifyError::MissingSignatureField(_))
        ));
        assert!(matches!(
            SignatureField::from_pdf(b"/ByteRange [0 1 2 3]"),
            Err(VerifyError::MissingSignatureField(_))
        ));
    }

    #[test]
    fn stray_byte_range_is_skipped() {
        let doc = b"% /ByteRange [0 1]\n\
                    << /ByteRange [0 5 9 3] /Contents <ab> >>\n\
                    /ByteRange [x y z w]";
        let fields = SignatureField::find_all(doc).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].contents, b"ab");
        assert_eq!(fields[0].byte_range, ByteRange::new(0, 5, 9, 3));

        let mut pdf = b"%stray /ByteRange [1 2] ".to_vec();
        pdf.extend_from_slice(SIGNED_PDF);
        assert_eq!(SignatureField::find_all(&pdf).unwrap().len(), 1);
    }

    #[test]
    fn gap_requires_ordered_in_bounds_values() {
        assert_eq!(ByteRange::new(0, 5, 9, 3).gap(12), Some((5, 9)));
        assert_eq!(ByteRange::new(0, 9, 5, 3).gap(12), None);
        assert_eq!(ByteRange::new(0, -5, 9, 3).gap(12), None);
        assert_eq!(ByteRange::new(0, 5, 20, 3).gap(12), None);
    }
}
