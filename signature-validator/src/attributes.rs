use crate::der::{self, Tlv};
use crate::digest::DigestResult;
use crate::error::{Result, VerifyError};

/// Deepest attribute nesting accepted from an envelope.
const MAX_ATTRIBUTE_DEPTH: usize = 64;

/// A value inside the authenticated attributes: the content octets of a
/// primitive value, or the children of a constructed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeNode {
    Scalar(Vec<u8>),
    Nested(Vec<AttributeNode>),
}

impl AttributeNode {
    /// Builds the tree for the content octets of the `[0] IMPLICIT SET`.
    pub fn from_set_content(content: &[u8]) -> Result<AttributeNode> {
        let children = der::split_tlvs(content)?
            .iter()
            .map(|tlv| Self::from_tlv(tlv, 1))
            .collect::<Result<Vec<_>>>()?;
        Ok(AttributeNode::Nested(children))
    }

    fn from_tlv(tlv: &Tlv<'_>, depth: usize) -> Result<AttributeNode> {
        if tlv.is_constructed() {
            if depth >= MAX_ATTRIBUTE_DEPTH {
                return Err(VerifyError::EnvelopeDecode(
                    "attribute nesting too deep".into(),
                ));
            }
            let children = tlv
                .children()?
                .iter()
                .map(|child| Self::from_tlv(child, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            Ok(AttributeNode::Nested(children))
        } else {
            Ok(AttributeNode::Scalar(tlv.content.to_vec()))
        }
    }

    /// Depth-first, first match: the first scalar of 32 bytes (SHA-256) or
    /// 20 bytes (SHA-1).
    pub fn locate_digest(&self) -> Result<DigestResult> {
        self.first_digest_scalar()
            .ok_or(VerifyError::DigestNotFound)
            .and_then(DigestResult::from_bytes)
    }

    fn first_digest_scalar(&self) -> Option<&[u8]> {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                AttributeNode::Scalar(bytes) if bytes.len() == 32 || bytes.len() == 20 => {
                    return Some(bytes);
                }
                AttributeNode::Scalar(_) => {}
                AttributeNode::Nested(children) => pending.extend(children.iter().rev()),
            }
        }
        None
    }
}
