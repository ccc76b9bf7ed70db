//! Encrypted credential storage
//!
//! Registered applications and tokens are persisted per instance host,
//! encrypted with AES-256-GCM. The key is derived from machine-specific
//! identifiers, so the file does not roam between machines.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::models::{Instance, RegisteredApplication, Token};
use crate::paths;

const NONCE_SIZE: usize = 12;

/// Credentials persisted for one instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceCredentials {
    /// Registered application, if registration completed.
    pub application: Option<RegisteredApplication>,
    /// Bearer token, if authorization completed.
    pub token: Option<Token>,
}

/// Encrypted file-backed store, keyed by instance host.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at the default credentials path.
    pub fn open() -> Result<Self> {
        Ok(Self {
            path: paths::credentials_path()?,
        })
    }

    /// Store at an explicit path.
    pub fn open_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Credentials for an instance; defaults when none are stored.
    pub fn load(&self, instance: &Instance) -> Result<InstanceCredentials> {
        let all = self.load_all()?;
        Ok(all.get(&instance.host).cloned().unwrap_or_default())
    }

    /// Persist a registered application for an instance.
    pub fn store_application(
        &self,
        instance: &Instance,
        application: &RegisteredApplication,
    ) -> Result<()> {
        let mut all = self.load_all()?;
        all.entry(instance.host.clone()).or_default().application =
            Some(application.clone());
        self.save_all(&all)
    }

    /// Persist a token for an instance.
    pub fn store_token(&self, instance: &Instance, token: &Token) -> Result<()> {
        let mut all = self.load_all()?;
        all.entry(instance.host.clone()).or_default().token = Some(token.clone());
        self.save_all(&all)
    }

    /// Forget everything stored for an instance.
    pub fn clear(&self, instance: &Instance) -> Result<()> {
        let mut all = self.load_all()?;
        all.remove(&instance.host);
        self.save_all(&all)
    }

    fn load_all(&self) -> Result<HashMap<String, InstanceCredentials>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let encrypted = fs::read(&self.path)
            .map_err(|e| Error::Storage(format!("failed to read credentials file: {e}")))?;
        if encrypted.len() < NONCE_SIZE {
            return Ok(HashMap::new());
        }

        let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);
        let cipher = Aes256Gcm::new(&derive_key().into());

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| Error::Storage("failed to decrypt credentials".into()))?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| Error::Storage(format!("corrupt credentials file: {e}")))
    }

    fn save_all(&self, all: &HashMap<String, InstanceCredentials>) -> Result<()> {
        let json = serde_json::to_vec(all)
            .map_err(|e| Error::Storage(format!("failed to serialize credentials: {e}")))?;

        let cipher = Aes256Gcm::new(&derive_key().into());
        let mut rng = rand::rng();
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rng.fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, json.as_slice())
            .map_err(|_| Error::Storage("failed to encrypt credentials".into()))?;

        let mut output = nonce_bytes.to_vec();
        output.extend(ciphertext);
        fs::write(&self.path, output)
            .map_err(|e| Error::Storage(format!("failed to write credentials file: {e}")))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)
                .map_err(|e| Error::Storage(format!("failed to stat credentials file: {e}")))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)
                .map_err(|e| Error::Storage(format!("failed to chmod credentials file: {e}")))?;
        }

        Ok(())
    }
}

/// Machine identifier used for key derivation. Falls back to the home
/// directory path when no OS identifier is readable.
fn machine_id() -> String {
    #[cfg(target_os = "linux")]
    for candidate in ["/etc/machine-id", "/var/lib/dbus/machine-id"] {
        if let Ok(id) = fs::read_to_string(candidate) {
            return id.trim().to_string();
        }
    }

    dirs::home_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "roost-fallback-key".to_string())
}

fn derive_key() -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(machine_id().as_bytes());
    if let Some(home) = dirs::home_dir() {
        hasher.update(home.to_string_lossy().as_bytes());
    }
    hasher.update(b"roost-credentials-v1");
    hasher.finalize().into()
}
