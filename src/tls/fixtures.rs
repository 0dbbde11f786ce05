//! RSA certificates for unit tests.
//!
//! The key is checked in under `tests/fixtures/` in two encodings: PKCS#1
//! (`RSA PRIVATE KEY`), which is what the loader reads, and PKCS#8, which is
//! what rcgen signs with.

use rcgen::{CertificateParams, KeyPair};

pub(crate) const RSA_KEY_PEM: &str = include_str!("../../tests/fixtures/leaf-a.rsa.pem");
const SIGNING_KEY_PEM: &str = include_str!("../../tests/fixtures/leaf-a.pk8.pem");

pub(crate) struct Pair {
    pub cert_pem: String,
    pub key_pem: String,
    pub der: Vec<u8>,
}

/// A self-signed certificate for `hostname` over the checked-in RSA key.
pub(crate) fn generate(hostname: &str) -> Pair {
    let key = KeyPair::from_pem(SIGNING_KEY_PEM).expect("RSA signing key");
    let cert = CertificateParams::new(vec![hostname.to_string()])
        .expect("params")
        .self_signed(&key)
        .expect("self-signed");
    Pair {
        cert_pem: cert.pem(),
        key_pem: RSA_KEY_PEM.to_string(),
        der: cert.der().to_vec(),
    }
}
