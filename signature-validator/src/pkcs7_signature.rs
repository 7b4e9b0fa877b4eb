use num_bigint::BigUint;
use simple_asn1::{from_der, oid, ASN1Block, OID};

use crate::attributes::AttributeNode;
use crate::certificate::Certificate;
use crate::der::{self, Tlv};
use crate::digest::DigestAlgorithm;
use crate::envelope::{RawCapture, SignatureEnvelope};
use crate::error::{Result, VerifyError};

fn decode_err(msg: impl Into<String>) -> VerifyError {
    VerifyError::EnvelopeDecode(msg.into())
}

/// Parses a DER `ContentInfo` holding `SignedData`.
///
/// Only the first element is read, so zero padding left over from the PDF
/// placeholder is ignored.
pub fn parse_signed_data(der_bytes: &[u8]) -> Result<SignatureEnvelope> {
    let (content_info, _padding) = der::read_tlv(der_bytes)?;
    if content_info.tag != der::TAG_SEQUENCE {
        return Err(decode_err("top-level not a SEQUENCE"));
    }

    let children = content_info.children()?;
    extract_content_info(&children)?;
    let signed_children = extract_signed_children(&children)?;

    let certificates = extract_certificates(&signed_children)?;
    let raw_capture = extract_signer_info(&signed_children)?;

    Ok(SignatureEnvelope {
        certificates,
        raw_capture,
    })
}

fn decode_oid(tlv: &Tlv<'_>) -> Result<OID> {
    let blocks = from_der(tlv.raw).map_err(|e| decode_err(format!("OID parse error: {}", e)))?;
    match blocks.into_iter().next() {
        Some(ASN1Block::ObjectIdentifier(_, oid)) => Ok(oid),
        other => Err(decode_err(format!("expected OBJECT IDENTIFIER, got {:?}", other))),
    }
}

fn extract_content_info(children: &[Tlv<'_>]) -> Result<()> {
    let content_type = children
        .first()
        .filter(|tlv| tlv.tag == der::TAG_OID)
        .ok_or_else(|| decode_err("missing contentType OID"))?;
    let content_type = decode_oid(content_type)?;
    if content_type != oid!(1, 2, 840, 113549, 1, 7, 2) {
        return Err(decode_err(format!(
            "unsupported content type {:?}",
            content_type
        )));
    }
    Ok(())
}

/// Children of the `SignedData` SEQUENCE inside `[0] EXPLICIT`.
fn extract_signed_children<'a>(children: &[Tlv<'a>]) -> Result<Vec<Tlv<'a>>> {
    let explicit = children
        .get(1)
        .filter(|tlv| tlv.tag == der::TAG_CONTEXT_0)
        .ok_or_else(|| decode_err("missing SignedData content"))?;
    let (signed_data, _) = der::read_tlv(explicit.content)?;
    if signed_data.tag != der::TAG_SEQUENCE {
        return Err(decode_err("SignedData not a SEQUENCE"));
    }
    signed_data.children()
}

// SignedData ::= SEQUENCE {
//   version, digestAlgorithms SET, encapContentInfo,
//   certificates [0] IMPLICIT OPTIONAL, crls [1] IMPLICIT OPTIONAL,
//   signerInfos SET }
fn extract_certificates(signed_children: &[Tlv<'_>]) -> Result<Vec<Certificate>> {
    let certs_block = signed_children
        .iter()
        .skip(3)
        .find(|tlv| tlv.tag == der::TAG_CONTEXT_0);

    match certs_block {
        Some(block) => block
            .children()?
            .iter()
            .filter(|tlv| tlv.tag == der::TAG_SEQUENCE)
            .map(|tlv| Certificate::from_der(tlv.raw))
            .collect(),
        None => Ok(Vec::new()),
    }
}

// SignerInfo ::= SEQUENCE {
//   version, sid, digestAlgorithm, signedAttrs [0] IMPLICIT OPTIONAL,
//   signatureAlgorithm, signature OCTET STRING, unsignedAttrs [1] OPTIONAL }
fn extract_signer_info(signed_children: &[Tlv<'_>]) -> Result<RawCapture> {
    let signer_infos = signed_children
        .last()
        .filter(|tlv| tlv.tag == der::TAG_SET)
        .ok_or_else(|| decode_err("expected SignerInfos SET in SignedData"))?;
    let signer_info = signer_infos
        .children()?
        .into_iter()
        .next()
        .filter(|tlv| tlv.tag == der::TAG_SEQUENCE)
        .ok_or_else(|| decode_err("expected SignerInfo in SignedData"))?;
    let fields = signer_info.children()?;
    if fields.len() < 5 {
        return Err(decode_err("SignerInfo is too short"));
    }

    // subjectKeyIdentifier sids carry no serial
    let signer_serial = match fields[1].tag {
        der::TAG_SEQUENCE => Some(extract_serial(&fields[1])?),
        _ => None,
    };

    let digest_algorithm = match fields[2].children()?.first() {
        Some(tlv) if tlv.tag == der::TAG_OID => digest_algorithm_of(&decode_oid(tlv)?),
        _ => return Err(decode_err("digest algorithm missing")),
    };

    let signed_attrs = fields
        .iter()
        .find(|tlv| tlv.tag == der::TAG_CONTEXT_0)
        .ok_or_else(|| decode_err("signedAttrs [0] not found"))?;
    // the attribute bytes are hashed again, so they must be DER
    if signed_attrs.indefinite {
        return Err(decode_err("signedAttrs use an indefinite length"));
    }
    let signature = fields
        .iter()
        .find(|tlv| tlv.tag == der::TAG_OCTET_STRING)
        .ok_or_else(|| decode_err("signature OCTET STRING not found"))?;

    Ok(RawCapture {
        authenticated_attributes: AttributeNode::from_set_content(signed_attrs.content)?,
        authenticated_attributes_der: signed_attrs.content.to_vec(),
        signature: signature.content.to_vec(),
        digest_algorithm,
        signer_serial,
    })
}

// issuerAndSerialNumber ::= SEQUENCE { issuer Name, serialNumber INTEGER }
fn extract_serial(issuer_and_serial: &Tlv<'_>) -> Result<BigUint> {
    let parts = issuer_and_serial.children()?;
    let serial = parts
        .get(1)
        .filter(|tlv| tlv.tag == der::TAG_INTEGER)
        .ok_or_else(|| decode_err("expected serialNumber INTEGER"))?;
    let blocks =
        from_der(serial.raw).map_err(|e| decode_err(format!("serial parse error: {}", e)))?;
    match blocks.first() {
        Some(ASN1Block::Integer(_, big_int)) => {
            Ok(BigUint::from_bytes_be(&big_int.to_signed_bytes_be()))
        }
        other => Err(decode_err(format!(
            "expected serialNumber INTEGER, got {:?}",
            other
        ))),
    }
}

fn digest_algorithm_of(oid: &OID) -> Option<DigestAlgorithm> {
    if *oid == oid!(2, 16, 840, 1, 101, 3, 4, 2, 1) {
        Some(DigestAlgorithm::Sha256)
    } else if *oid == oid!(1, 3, 14, 3, 2, 26) {
        Some(DigestAlgorithm::Sha1)
    } else {
        log::debug!("signer uses digest algorithm {:?}", oid);
        None
    }
}
