//! Shared fixtures for integration tests: a throwaway CA, leaf certificates
//! written to a scratch directory, and TLS clients that trust the CA.

#![allow(dead_code)]

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    KeyUsagePurpose,
};
use rustls::pki_types::{CertificateDer, ServerName};
use sni_terminator::config::{ServerConfig, Transport};
use sni_terminator::sni::AdapterSettings;
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

/// Upper bound for any single network step in a test.
pub const STEP: Duration = Duration::from_secs(5);

/// Checked-in RSA leaf keys: (PKCS#8 for signing, PKCS#1 for the server).
const LEAF_KEYS: [(&str, &str); 2] = [
    (
        include_str!("../fixtures/leaf-a.pk8.pem"),
        include_str!("../fixtures/leaf-a.rsa.pem"),
    ),
    (
        include_str!("../fixtures/leaf-b.pk8.pem"),
        include_str!("../fixtures/leaf-b.rsa.pem"),
    ),
];

/// A certificate issued by the test CA, written to disk.
pub struct Issued {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub der: Vec<u8>,
}

impl Issued {
    /// `cert,key` pattern list for adapter settings.
    pub fn globs(&self) -> String {
        format!("{},{}", self.cert_path.display(), self.key_path.display())
    }
}

/// Scratch directory plus a CA that signs every test certificate.
pub struct Fixtures {
    dir: TempDir,
    ca_cert: rcgen::Certificate,
    ca_key: KeyPair,
    issued: Cell<usize>,
}

impl Fixtures {
    pub fn new() -> Self {
        let mut params = CertificateParams::new(Vec::<String>::new()).expect("ca params");
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, "sni-terminator test CA");
        params.distinguished_name = dn;
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];

        let ca_key = KeyPair::generate().expect("ca key");
        let ca_cert = params.self_signed(&ca_key).expect("ca cert");

        Self {
            dir: TempDir::new().expect("tempdir"),
            ca_cert,
            ca_key,
            issued: Cell::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Path for a Unix socket inside the scratch directory.
    pub fn socket_path(&self) -> PathBuf {
        self.dir.path().join("server.sock")
    }

    /// Issue a leaf certificate for `names` and write `<file>.crt` / `<file>.key`.
    ///
    /// Keys are written as `RSA PRIVATE KEY`; consecutive leaves use different keys.
    pub fn issue(&self, file: &str, names: &[&str]) -> Issued {
        let sans: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let mut params = CertificateParams::new(sans).expect("leaf params");
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, names[0]);
        params.distinguished_name = dn;

        let n = self.issued.replace(self.issued.get() + 1);
        let (signing_pem, rsa_pem) = LEAF_KEYS[n % LEAF_KEYS.len()];
        let key = KeyPair::from_pem(signing_pem).expect("leaf key");
        let cert = params
            .signed_by(&key, &self.ca_cert, &self.ca_key)
            .expect("leaf cert");

        let cert_path = self.dir.path().join(format!("{file}.crt"));
        let key_path = self.dir.path().join(format!("{file}.key"));
        std::fs::write(&cert_path, cert.pem()).expect("write cert");
        std::fs::write(&key_path, rsa_pem).expect("write key");

        Issued {
            cert_path,
            key_path,
            der: cert.der().to_vec(),
        }
    }

    /// A Unix-socket server config presenting `default` when nothing else matches.
    pub fn unix_config(&self, default: &Issued) -> ServerConfig {
        ServerConfig {
            address: self.socket_path().display().to_string(),
            transport: Transport::Unix,
            certificate: default.cert_path.clone(),
            key: default.key_path.clone(),
            log: "stdout".to_string(),
            sni_adapter: "inmemory".to_string(),
            sni_adapter_settings: AdapterSettings::new(),
        }
    }

    /// A client trusting the test CA. With `sni` off, no server name is sent.
    pub fn connector(&self, sni: bool) -> TlsConnector {
        let mut roots = rustls::RootCertStore::empty();
        roots
            .add(CertificateDer::from(self.ca_cert.der().to_vec()))
            .expect("trust CA");

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let mut config = rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .expect("protocol versions")
            .with_root_certificates(roots)
            .with_no_client_auth();
        config.enable_sni = sni;

        TlsConnector::from(Arc::new(config))
    }
}

/// Open a raw Unix connection to `path`.
pub async fn unix_conn(path: &Path) -> UnixStream {
    tokio::time::timeout(STEP, UnixStream::connect(path))
        .await
        .expect("connect timed out")
        .expect("connect failed")
}

/// Drive a client handshake, verifying the server as `name`.
pub async fn handshake<IO>(
    connector: &TlsConnector,
    name: &str,
    io: IO,
) -> std::io::Result<TlsStream<IO>>
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    let server_name = ServerName::try_from(name.to_string())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    tokio::time::timeout(STEP, connector.connect(server_name, io))
        .await
        .map_err(|_| std::io::Error::from(std::io::ErrorKind::TimedOut))?
}

/// DER of the leaf certificate the server presented.
pub fn presented<IO>(stream: &TlsStream<IO>) -> Vec<u8> {
    let (_, session) = stream.get_ref();
    session
        .peer_certificates()
        .and_then(|chain| chain.first())
        .map(|leaf| leaf.to_vec())
        .expect("server presented a certificate")
}
