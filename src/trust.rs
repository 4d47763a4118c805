//! Persistent, file-backed certificate trust store
//!
//! The store keeps server certificates keyed by alias in a password-guarded
//! container on disk (`~/.credo/truststore.enc` by default) and builds TLS
//! client configurations that trust exactly those certificates. Mutations
//! persist synchronously: the in-memory container and the backing file are
//! never allowed to diverge.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{CredoError, Result};

const STORE_MAGIC: &[u8; 4] = b"CTS1";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 24;
const KEY_LEN: usize = 32;
const KEY_DERIVE_ITERATIONS: u32 = 100_000;

const DEFAULT_STORE_DIR: &str = ".credo";
const DEFAULT_STORE_FILE: &str = "truststore.enc";
const PASSWORD_ENV: &str = "CREDO_STORE_PASSWORD";
const DEFAULT_PASSWORD: &str = "changeit";

/// File-backed set of trusted server certificates.
#[derive(Debug)]
pub struct TrustStore {
    path: PathBuf,
    password: String,
    entries: BTreeMap<String, Vec<u8>>,
    initialized: bool,
}

impl TrustStore {
    /// Open the store at `path`, creating the backing file (and parent
    /// directories) if absent. An empty or newly created file loads as an
    /// initialized, empty store.
    ///
    /// Fails with [`CredoError::TrustStoreCorrupt`] if the file exists but
    /// cannot be decrypted under `password`. That failure is fatal to this
    /// store instance; the caller must supply a new path or fix the file.
    pub fn open(path: impl Into<PathBuf>, password: &str) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::write(&path, [])?;
                set_owner_only_permissions(&path)?;
                log::info!("created trust store file at {}", path.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let entries = if bytes.is_empty() {
            log::debug!("blank trust store loaded from {}", path.display());
            BTreeMap::new()
        } else {
            let entries = decrypt_entries(&bytes, password)?;
            log::debug!(
                "trust store loaded from {} with {} certificate(s)",
                path.display(),
                entries.len()
            );
            entries
        };

        Ok(Self {
            path,
            password: password.to_string(),
            entries,
            initialized: true,
        })
    }

    /// Open the store at the default path under the user's home directory.
    pub fn open_default(password: &str) -> Result<Self> {
        Self::open(Self::default_path()?, password)
    }

    /// Caller convenience: the default path with the password taken from
    /// `CREDO_STORE_PASSWORD`, falling back to the stock password.
    pub fn default_store() -> Result<Self> {
        let password = env::var(PASSWORD_ENV).unwrap_or_else(|_| DEFAULT_PASSWORD.to_string());
        Self::open_default(&password)
    }

    /// The default trust store location, `~/.credo/truststore.enc`.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            CredoError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "home directory unavailable",
            ))
        })?;
        Ok(home.join(DEFAULT_STORE_DIR).join(DEFAULT_STORE_FILE))
    }

    /// Insert or overwrite the certificate stored under `alias` and persist
    /// the full container. Accepts PEM or DER bytes.
    ///
    /// On persist failure the in-memory insertion is rolled back so memory
    /// and disk stay consistent.
    pub fn add_certificate(&mut self, certificate: &[u8], alias: &str) -> Result<()> {
        self.ensure_initialized()?;
        parse_certificate(certificate)?;

        let previous = self
            .entries
            .insert(alias.to_string(), certificate.to_vec());
        if let Err(err) = self.save() {
            match previous {
                Some(prev) => {
                    self.entries.insert(alias.to_string(), prev);
                }
                None => {
                    self.entries.remove(alias);
                }
            }
            return Err(err);
        }

        log::info!(
            "'{}' added, {} now holds {} certificate(s)",
            alias,
            self.path.display(),
            self.entries.len()
        );
        Ok(())
    }

    /// Re-encrypt and re-persist the store under a new password.
    pub fn change_password(&mut self, new_password: &str) -> Result<()> {
        self.ensure_initialized()?;

        let old_password = std::mem::replace(&mut self.password, new_password.to_string());
        if let Err(err) = self.save() {
            self.password = old_password;
            return Err(err);
        }

        log::info!("trust store password changed for {}", self.path.display());
        Ok(())
    }

    /// Build a TLS-capable client configuration trusting exactly the stored
    /// certificates.
    ///
    /// `protocol` optionally names the minimum TLS protocol version
    /// (`"TLSv1.3"`, `"TLSv1.2"`, `"TLSv1.1"`, `"TLSv1"`). An unrecognized
    /// name substitutes the transport default rather than failing.
    pub fn client_builder(&self, protocol: Option<&str>) -> Result<reqwest::ClientBuilder> {
        self.ensure_initialized()?;

        let mut builder = reqwest::ClientBuilder::new().use_rustls_tls();
        if let Some(version) = min_tls_version(protocol) {
            builder = builder.min_tls_version(version);
        }
        for bytes in self.entries.values() {
            builder = builder.add_root_certificate(parse_certificate(bytes)?);
        }
        Ok(builder)
    }

    /// Number of certificates currently in the store.
    pub fn certificate_count(&self) -> usize {
        self.entries.len()
    }

    /// Aliases of the stored certificates, in sorted order.
    pub fn aliases(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Whether a certificate is stored under `alias`.
    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(CredoError::NotInitialized)
        }
    }

    fn save(&self) -> Result<()> {
        let payload = encrypt_entries(&self.entries, &self.password)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CredoError::Persist(format!("{}: {}", self.path.display(), e)))?;
        }
        fs::write(&self.path, payload)
            .map_err(|e| CredoError::Persist(format!("{}: {}", self.path.display(), e)))?;
        set_owner_only_permissions(&self.path)
            .map_err(|e| CredoError::Persist(format!("{}: {}", self.path.display(), e)))?;
        Ok(())
    }
}

fn parse_certificate(bytes: &[u8]) -> Result<reqwest::Certificate> {
    reqwest::Certificate::from_pem(bytes)
        .or_else(|_| reqwest::Certificate::from_der(bytes))
        .map_err(|e| CredoError::CertificateParse(e.to_string()))
}

fn min_tls_version(protocol: Option<&str>) -> Option<reqwest::tls::Version> {
    match protocol? {
        "TLSv1.3" | "TLSv1_3" | "1.3" => Some(reqwest::tls::Version::TLS_1_3),
        "TLSv1.2" | "TLSv1_2" | "1.2" => Some(reqwest::tls::Version::TLS_1_2),
        "TLSv1.1" | "TLSv1_1" | "1.1" => Some(reqwest::tls::Version::TLS_1_1),
        "TLSv1" | "TLSv1.0" | "1.0" => Some(reqwest::tls::Version::TLS_1_0),
        other => {
            log::warn!(
                "unsupported TLS protocol name '{}', using the transport default",
                other
            );
            None
        }
    }
}

fn derive_key(password: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0_u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, KEY_DERIVE_ITERATIONS, &mut key);
    key
}

/// Container layout: magic, random salt, random nonce, ciphertext over a
/// JSON `alias -> base64(certificate bytes)` map.
fn encrypt_entries(entries: &BTreeMap<String, Vec<u8>>, password: &str) -> Result<Vec<u8>> {
    let encoded: BTreeMap<&str, String> = entries
        .iter()
        .map(|(alias, bytes)| {
            (
                alias.as_str(),
                base64::engine::general_purpose::STANDARD.encode(bytes),
            )
        })
        .collect();
    let plaintext = serde_json::to_vec(&encoded)
        .map_err(|e| CredoError::Persist(format!("serialize failed: {}", e)))?;

    let mut salt = [0_u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut nonce = [0_u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let key = derive_key(password, &salt);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key));
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext.as_slice())
        .map_err(|_| CredoError::Persist("encryption failed".to_string()))?;

    let mut output = Vec::with_capacity(STORE_MAGIC.len() + SALT_LEN + NONCE_LEN + ciphertext.len());
    output.extend_from_slice(STORE_MAGIC);
    output.extend_from_slice(&salt);
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

fn decrypt_entries(payload: &[u8], password: &str) -> Result<BTreeMap<String, Vec<u8>>> {
    let header_len = STORE_MAGIC.len() + SALT_LEN + NONCE_LEN;
    if payload.len() < header_len || &payload[..STORE_MAGIC.len()] != STORE_MAGIC {
        return Err(CredoError::TrustStoreCorrupt(
            "unrecognized container format".to_string(),
        ));
    }

    let salt = &payload[STORE_MAGIC.len()..STORE_MAGIC.len() + SALT_LEN];
    let nonce = &payload[STORE_MAGIC.len() + SALT_LEN..header_len];
    let ciphertext = &payload[header_len..];

    let key = derive_key(password, salt);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key));
    let plaintext = cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| {
            CredoError::TrustStoreCorrupt("decryption failed, wrong password?".to_string())
        })?;

    let encoded: BTreeMap<String, String> = serde_json::from_slice(&plaintext)
        .map_err(|e| CredoError::TrustStoreCorrupt(format!("invalid payload: {}", e)))?;

    let mut entries = BTreeMap::new();
    for (alias, text) in encoded {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(text.as_bytes())
            .map_err(|e| {
                CredoError::TrustStoreCorrupt(format!("invalid entry '{}': {}", alias, e))
            })?;
        entries.insert(alias, bytes);
    }
    Ok(entries)
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
