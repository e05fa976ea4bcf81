//! Platform credential sealing
//!
//! The credential is stored only in sealed (authenticated-encrypted)
//! form; the master key lives in a mode-0600 key file and never leaves
//! the process. Plaintext exists in memory only for the duration of an
//! outbound platform call, wrapped in a type that refuses to print it.

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use modwatch_core::{Error, Result};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// A plaintext secret that redacts itself in any formatted output
pub struct SecretString(String);

impl SecretString {
    /// Access the plaintext for an outbound platform call
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Seals and unseals the platform credential at rest
pub struct SecretManager {
    cipher: ChaCha20Poly1305,
}

impl SecretManager {
    /// Build from an existing 256-bit master key
    pub fn from_key(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }

    /// Build from a key file, generating the key on first use.
    ///
    /// A key file of the wrong size is treated as tampering, not
    /// regenerated — silently replacing the key would orphan every
    /// previously sealed credential.
    pub fn from_key_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut key = [0u8; KEY_LEN];

        if path.exists() {
            let bytes = fs::read(path)?;
            if bytes.len() != KEY_LEN {
                return Err(Error::Integrity);
            }
            key.copy_from_slice(&bytes);
        } else {
            let generated = ChaCha20Poly1305::generate_key(&mut OsRng);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, generated.as_slice())?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
            }
            key.copy_from_slice(generated.as_slice());
            info!(path = %path.display(), "generated new master key");
        }

        Ok(Self::from_key(&key))
    }

    /// Seal a secret for storage: random nonce prepended to the
    /// authenticated ciphertext.
    pub fn seal(&self, secret: &str) -> Result<Vec<u8>> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, secret.as_bytes())
            .map_err(|_| Error::Integrity)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(nonce.as_slice());
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Unseal a stored secret. Any tampering fails authentication and
    /// surfaces as [`Error::Integrity`].
    pub fn unseal(&self, sealed: &[u8]) -> Result<SecretString> {
        if sealed.len() <= NONCE_LEN {
            return Err(Error::Integrity);
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::Integrity)?;

        String::from_utf8(plaintext)
            .map(SecretString)
            .map_err(|_| Error::Integrity)
    }
}
