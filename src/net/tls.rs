//! TLS configuration and certificate loading.
//!
//! Certificate and key are both mandatory. They are read fully into memory
//! and checked as PEM before the listener is bound, so bad material fails
//! startup instead of the first handshake.

use std::io;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("malformed PEM in {}: {source}", path.display())]
    Pem { path: PathBuf, source: io::Error },

    #[error("no certificate found in {}", path.display())]
    NoCertificate { path: PathBuf },

    #[error("no private key found in {}", path.display())]
    NoPrivateKey { path: PathBuf },

    #[error("rejected TLS material: {0}")]
    Config(io::Error),
}

/// PEM-encoded certificate chain and private key, held in memory.
#[derive(Clone)]
pub struct TlsMaterial {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
}

impl std::fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("cert_pem_len", &self.cert_pem.len())
            .field("key_pem_len", &"<redacted>")
            .finish()
    }
}

/// Read and validate certificate and key files.
pub async fn read_tls_material(cert_path: &Path, key_path: &Path) -> Result<TlsMaterial, TlsError> {
    let cert_pem = read(cert_path).await?;
    let key_pem = read(key_path).await?;

    let mut reader = cert_pem.as_slice();
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Pem {
            path: cert_path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificate {
            path: cert_path.to_path_buf(),
        });
    }

    let mut reader = key_pem.as_slice();
    match rustls_pemfile::private_key(&mut reader) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Err(TlsError::NoPrivateKey {
                path: key_path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(TlsError::Pem {
                path: key_path.to_path_buf(),
                source,
            })
        }
    }

    tracing::info!(
        cert_path = %cert_path.display(),
        key_path = %key_path.display(),
        certificates = certs.len(),
        "TLS material loaded"
    );

    Ok(TlsMaterial { cert_pem, key_pem })
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    let material = read_tls_material(cert_path, key_path).await?;
    RustlsConfig::from_pem(material.cert_pem, material.key_pem)
        .await
        .map_err(TlsError::Config)
}

async fn read(path: &Path) -> Result<Vec<u8>, TlsError> {
    tokio::fs::read(path).await.map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })
}
