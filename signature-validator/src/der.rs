use crate::error::{Result, VerifyError};

pub const TAG_INTEGER: u8 = 0x02;
pub const TAG_OCTET_STRING: u8 = 0x04;
pub const TAG_OID: u8 = 0x06;
pub const TAG_SEQUENCE: u8 = 0x30;
pub const TAG_SET: u8 = 0x31;
/// `[0]` constructed, context specific.
pub const TAG_CONTEXT_0: u8 = 0xa0;

/// Deepest nesting of indefinite-length elements that is followed.
pub const MAX_DEPTH: usize = 64;

/// One tag-length-value element borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    /// First identifier octet.
    pub tag: u8,
    /// Identifier, length and content octets.
    pub raw: &'a [u8],
    /// Content octets only, without the end-of-contents marker.
    pub content: &'a [u8],
    /// Encoded with the BER indefinite length form.
    pub indefinite: bool,
}

impl<'a> Tlv<'a> {
    pub fn is_constructed(&self) -> bool {
        self.tag & 0x20 != 0
    }

    pub fn children(&self) -> Result<Vec<Tlv<'a>>> {
        split_tlvs(self.content)
    }
}

fn truncated(what: &str) -> VerifyError {
    VerifyError::EnvelopeDecode(format!("truncated DER {}", what))
}

/// Reads the element at the start of `input` and returns it with the rest.
///
/// Definite lengths must be DER. Constructed elements may also use the
/// indefinite form, in which case the content runs up to the `00 00`
/// end-of-contents marker.
pub fn read_tlv(input: &[u8]) -> Result<(Tlv<'_>, &[u8])> {
    read_tlv_nested(input, 0)
}

fn read_tlv_nested(input: &[u8], depth: usize) -> Result<(Tlv<'_>, &[u8])> {
    let tag = *input.first().ok_or_else(|| truncated("tag"))?;
    let mut pos = 1;

    // high tag numbers continue while bit 8 is set
    if tag & 0x1f == 0x1f {
        loop {
            let b = *input.get(pos).ok_or_else(|| truncated("tag"))?;
            pos += 1;
            if b & 0x80 == 0 {
                break;
            }
        }
    }

    let first = *input.get(pos).ok_or_else(|| truncated("length"))?;
    pos += 1;
    if first == 0x80 {
        return read_indefinite(input, tag, pos, depth);
    }

    let len = if first < 0x80 {
        first as usize
    } else {
        let n = (first & 0x7f) as usize;
        if n > 4 {
            return Err(VerifyError::EnvelopeDecode(format!(
                "length field of {} octets is too large",
                n
            )));
        }
        let bytes = input.get(pos..pos + n).ok_or_else(|| truncated("length"))?;
        pos += n;
        bytes.iter().fold(0usize, |acc, b| (acc << 8) | *b as usize)
    };

    let end = pos
        .checked_add(len)
        .filter(|end| *end <= input.len())
        .ok_or_else(|| truncated("content"))?;

    let tlv = Tlv {
        tag,
        raw: &input[..end],
        content: &input[pos..end],
        indefinite: false,
    };
    Ok((tlv, &input[end..]))
}

fn read_indefinite(
    input: &[u8],
    tag: u8,
    start: usize,
    depth: usize,
) -> Result<(Tlv<'_>, &[u8])> {
    if tag & 0x20 == 0 {
        return Err(VerifyError::EnvelopeDecode(
            "indefinite length on a primitive element".into(),
        ));
    }
    if depth >= MAX_DEPTH {
        return Err(VerifyError::EnvelopeDecode(
            "indefinite-length nesting too deep".into(),
        ));
    }

    let mut pos = start;
    loop {
        let rest = input.get(pos..).ok_or_else(|| truncated("content"))?;
        if rest.starts_with(&[0x00, 0x00]) {
            break;
        }
        if rest.is_empty() {
            return Err(truncated("content, missing end-of-contents"));
        }
        let (child, _) = read_tlv_nested(rest, depth + 1)?;
        pos += child.raw.len();
    }

    let end = pos + 2;
    let tlv = Tlv {
        tag,
        raw: &input[..end],
        content: &input[start..pos],
        indefinite: true,
    };
    Ok((tlv, &input[end..]))
}

/// Splits a run of consecutive elements.
pub fn split_tlvs(mut input: &[u8]) -> Result<Vec<Tlv<'_>>> {
    let mut out = Vec::new();
    while !input.is_empty() {
        let (tlv, rest) = read_tlv(input)?;
        out.push(tlv);
        input = rest;
    }
    Ok(out)
}

/// DER length octets for `len`.
pub fn encode_length(len: usize) -> Vec<u8> {
    if len < 0x80 {
        return vec![len as u8];
    }
    let bytes: Vec<u8> = len
        .to_be_bytes()
        .iter()
        .copied()
        .skip_while(|b| *b == 0)
        .collect();
    let mut out = Vec::with_capacity(bytes.len() + 1);
    out.push(0x80 | bytes.len() as u8);
    out.extend_from_slice(&bytes);
    out
}

/// Wraps `content` in a new element with identifier `tag`.
pub fn wrap(tag: u8, content: &[u8]) -> Vec<u8> {
    let len = encode_length(content.len());
    let mut out = Vec::with_capacity(1 + len.len() + content.len());
    out.push(tag);
    out.extend_from_slice(&len);
    out.extend_from_slice(content);
    out
}
