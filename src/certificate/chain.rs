//! PEM certificate chain parsing, as returned by a certificate-GET
//! response (RFC 8555 §7.4.2): a leaf followed by zero or more
//! intermediates, in the order the server sent them.
use crate::error::{AcmeError, Result};
use jiff::Zoned;
use pem::parse_many;
use std::io::Write;
use x509_parser::asn1_rs::FromDer;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::{GeneralName, ParsedExtension};

#[derive(Debug, Clone)]
pub struct CertificateChain {
    pub leaf: Vec<u8>,
    pub intermediates: Vec<Vec<u8>>,
}

impl CertificateChain {
    pub fn from_pem(pem_data: &[u8]) -> Result<Self> {
        let mut certs = Vec::new();
        for p in parse_many(pem_data).map_err(|e| AcmeError::crypto(format!("failed to parse PEM: {e}")))? {
            if p.tag() == "CERTIFICATE" {
                certs.push(p.contents().to_vec());
            }
        }
        if certs.is_empty() {
            return Err(AcmeError::crypto("no certificates found in PEM data"));
        }
        let leaf = certs.remove(0);
        Ok(Self {
            leaf,
            intermediates: certs,
        })
    }

    /// Write the full chain back out as PEM, leaf first.
    pub fn write_pem(&self, writer: &mut impl Write) -> Result<()> {
        for der in std::iter::once(&self.leaf).chain(self.intermediates.iter()) {
            let pem = crate::crypto::encoding::PemEncoding::encode(der, "CERTIFICATE");
            writer.write_all(pem.as_bytes())?;
        }
        Ok(())
    }

    /// Structural and validity-window checks: every certificate parses
    /// as X.509 and is within its validity period. Does not verify the
    /// signature chain up to a root.
    pub fn verify(&self) -> Result<()> {
        let (_, leaf_cert) = X509Certificate::from_der(&self.leaf)
            .map_err(|e| AcmeError::crypto(format!("invalid leaf certificate: {e}")))?;

        let now = Zoned::now().timestamp().as_second();
        if leaf_cert.validity().not_after.timestamp() < now {
            return Err(AcmeError::crypto("leaf certificate expired"));
        }
        if leaf_cert.validity().not_before.timestamp() > now {
            return Err(AcmeError::crypto("leaf certificate not yet valid"));
        }

        for (i, cert_der) in self.intermediates.iter().enumerate() {
            let (_, cert) = X509Certificate::from_der(cert_der)
                .map_err(|e| AcmeError::crypto(format!("invalid intermediate certificate {i}: {e}")))?;
            if cert.validity().not_after.timestamp() < now {
                return Err(AcmeError::crypto(format!("intermediate certificate {i} expired")));
            }
        }

        Ok(())
    }

    pub fn common_name(&self) -> Result<String> {
        let (_, cert) = X509Certificate::from_der(&self.leaf)
            .map_err(|e| AcmeError::crypto(format!("invalid leaf certificate: {e}")))?;
        for extension in cert.subject().iter_common_name() {
            if let Ok(cn) = extension.as_str() {
                return Ok(cn.to_string());
            }
        }
        Err(AcmeError::crypto("no Common Name found in certificate"))
    }

    /// The leaf's issuer Common Name, used to pick an alternate chain
    /// by issuer name (§7.4.2 `findIssuer`).
    pub fn issuer_common_name(&self) -> Result<Option<String>> {
        let (_, cert) = X509Certificate::from_der(&self.leaf)
            .map_err(|e| AcmeError::crypto(format!("invalid leaf certificate: {e}")))?;
        for extension in cert.issuer().iter_common_name() {
            if let Ok(cn) = extension.as_str() {
                return Ok(Some(cn.to_string()));
            }
        }
        Ok(None)
    }

    pub fn subject_alt_names(&self) -> Result<Vec<String>> {
        let (_, cert) = X509Certificate::from_der(&self.leaf)
            .map_err(|e| AcmeError::crypto(format!("invalid leaf certificate: {e}")))?;

        let mut sans = Vec::new();
        for ext in cert.extensions() {
            if let ParsedExtension::SubjectAlternativeName(san_ext) = ext.parsed_extension() {
                for name in &san_ext.general_names {
                    match name {
                        GeneralName::DNSName(dns) => sans.push(dns.to_string()),
                        GeneralName::IPAddress(ip) if ip.len() == 4 => {
                            sans.push(std::net::Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3]).to_string());
                        }
                        GeneralName::IPAddress(ip) if ip.len() == 16 => {
                            let mut octets = [0u8; 16];
                            octets.copy_from_slice(ip);
                            sans.push(std::net::Ipv6Addr::from(octets).to_string());
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(sans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::CertificateParams;

    #[test]
    fn from_pem_splits_leaf_and_intermediates() {
        let params = CertificateParams::new(vec!["example.com".to_string()]).unwrap();
        let key_pair = rcgen::KeyPair::generate().unwrap();
        let cert = params.self_signed(&key_pair).unwrap();
        let pem = cert.pem();

        let chain = CertificateChain::from_pem(pem.as_bytes()).unwrap();
        assert!(!chain.leaf.is_empty());
        assert!(chain.intermediates.is_empty());
        assert_eq!(chain.common_name().unwrap(), "example.com");
        assert_eq!(chain.subject_alt_names().unwrap(), vec!["example.com"]);
    }

    #[test]
    fn write_pem_round_trips_through_from_pem() {
        let params = CertificateParams::new(vec!["example.com".to_string()]).unwrap();
        let key_pair = rcgen::KeyPair::generate().unwrap();
        let cert = params.self_signed(&key_pair).unwrap();
        let chain = CertificateChain::from_pem(cert.pem().as_bytes()).unwrap();

        let mut buf = Vec::new();
        chain.write_pem(&mut buf).unwrap();
        let reparsed = CertificateChain::from_pem(&buf).unwrap();
        assert_eq!(reparsed.leaf, chain.leaf);
    }
}
