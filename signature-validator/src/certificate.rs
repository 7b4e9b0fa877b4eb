use std::fmt;

use num_bigint::BigUint;
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey as X509PublicKey;

use crate::error::{Result, VerifyError};

const OID_BASIC_CONSTRAINTS: &str = "2.5.29.19";

/// One attribute of a distinguished name, e.g. `CN=Document Signer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameAttribute {
    pub oid: String,
    /// Short name such as `CN`, or the dotted OID when it has none.
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub oid: String,
    pub critical: bool,
    /// `cA` flag, only for basicConstraints.
    pub ca: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// Big-endian modulus and exponent, without sign padding.
    Rsa { modulus: Vec<u8>, exponent: Vec<u8> },
    Unsupported { algorithm: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// Exact encoding the certificate was parsed from.
    pub der: Vec<u8>,
    pub serial: BigUint,
    pub subject_attributes: Vec<NameAttribute>,
    pub issuer_attributes: Vec<NameAttribute>,
    pub extensions: Vec<Extension>,
    pub public_key: PublicKey,
}

impl Certificate {
    pub fn from_der(der: &[u8]) -> Result<Certificate> {
        let (_, x509) = parse_x509_certificate(der)
            .map_err(|e| VerifyError::EnvelopeDecode(format!("certificate parse error: {}", e)))?;

        let extensions = x509
            .extensions()
            .iter()
            .map(|ext| {
                let ca = match ext.parsed_extension() {
                    ParsedExtension::BasicConstraints(bc) => Some(bc.ca),
                    _ => None,
                };
                Extension {
                    oid: ext.oid.to_id_string(),
                    critical: ext.critical,
                    ca,
                }
            })
            .collect();

        let public_key = match x509.public_key().parsed() {
            Ok(X509PublicKey::RSA(rsa)) => PublicKey::Rsa {
                modulus: strip_leading_zeros(rsa.modulus),
                exponent: strip_leading_zeros(rsa.exponent),
            },
            _ => PublicKey::Unsupported {
                algorithm: x509.public_key().algorithm.algorithm.to_id_string(),
            },
        };

        Ok(Certificate {
            der: der.to_vec(),
            serial: BigUint::from_bytes_be(x509.raw_serial()),
            subject_attributes: name_attributes(x509.subject()),
            issuer_attributes: name_attributes(x509.issuer()),
            extensions,
            public_key,
        })
    }

    /// True when basicConstraints is present with `cA` set.
    pub fn is_ca(&self) -> bool {
        self.extensions
            .iter()
            .any(|ext| ext.oid == OID_BASIC_CONSTRAINTS && ext.ca == Some(true))
    }

    pub fn common_name(&self) -> Option<&str> {
        self.subject_attributes
            .iter()
            .find(|attr| attr.name == "CN")
            .map(|attr| attr.value.as_str())
    }
}

impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subject: ")?;
        write_name(f, &self.subject_attributes)?;
        write!(f, "\nissuer: ")?;
        write_name(f, &self.issuer_attributes)?;
        write!(f, "\nserial: {:x}", self.serial)
    }
}

fn write_name(f: &mut fmt::Formatter<'_>, attrs: &[NameAttribute]) -> fmt::Result {
    for (i, attr) in attrs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}={}", attr.name, attr.value)?;
    }
    Ok(())
}

fn name_attributes(name: &X509Name<'_>) -> Vec<NameAttribute> {
    name.iter_attributes()
        .map(|attr| {
            let oid = attr.attr_type().to_id_string();
            let value = match attr.as_str() {
                Ok(s) => s.to_string(),
                Err(_) => hex::encode(attr.attr_value().data),
            };
            NameAttribute {
                name: short_name(&oid).unwrap_or(&oid).to_string(),
                oid,
                value,
            }
        })
        .collect()
}

fn short_name(oid: &str) -> Option<&'static str> {
    Some(match oid {
        "2.5.4.3" => "CN",
        "2.5.4.5" => "serialNumber",
        "2.5.4.6" => "C",
        "2.5.4.7" => "L",
        "2.5.4.8" => "ST",
        "2.5.4.10" => "O",
        "2.5.4.11" => "OU",
        "1.2.840.113549.1.9.1" => "emailAddress",
        _ => return None,
    })
}

fn strip_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}
