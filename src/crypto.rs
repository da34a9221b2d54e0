//! Symmetric encryption of identifier columns.
//!
//! A [`Cipher`] wraps a Fernet key. Tokens are URL-safe text, so they store
//! directly in a text column. Encryption is **not** deterministic: the
//! primitive mixes in a random nonce and a timestamp, so the same
//! `(value, key)` pair yields a different token on every call — never
//! compare ciphertexts for equality. One key must encrypt every value of a
//! run, or later decryption becomes impossible for part of the data.

use fernet::Fernet;
use log::debug;

use crate::config::KeySource;
use crate::error::EtlError;
use crate::frame::Frame;

/// A process-lifetime symmetric cipher.
pub struct Cipher {
    inner: Fernet,
    key: String,
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher").finish_non_exhaustive()
    }
}

impl Cipher {
    /// Generate a fresh key from the crypto-secure generator.
    #[must_use]
    pub fn generate() -> Self {
        let key = Fernet::generate_key();
        let inner = Fernet::new(&key).expect("generated key is always well-formed");
        Self { inner, key }
    }

    /// Build a cipher from operator-supplied base64 key material.
    ///
    /// # Errors
    /// `Crypto` if the key is not a valid 32-byte url-safe base64 string.
    pub fn from_key(key: &str) -> Result<Self, EtlError> {
        let inner = Fernet::new(key)
            .ok_or_else(|| EtlError::Crypto("malformed key material".to_string()))?;
        Ok(Self {
            inner,
            key: key.to_string(),
        })
    }

    /// Build a cipher per the configured [`KeySource`].
    ///
    /// # Errors
    /// `Crypto` if a provided key is malformed.
    pub fn from_source(source: &KeySource) -> Result<Self, EtlError> {
        match source {
            KeySource::Generate => Ok(Self::generate()),
            KeySource::Provided(key) => Self::from_key(key),
        }
    }

    /// The base64 key this cipher was built with.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Encrypt a value into a Fernet token.
    #[must_use]
    pub fn encrypt(&self, value: &str) -> String {
        self.inner.encrypt(value.as_bytes())
    }

    /// Decrypt a token back to the original string.
    ///
    /// # Errors
    /// `Crypto` if the token was produced under a different key or is
    /// corrupt; never returns wrong plaintext silently.
    pub fn decrypt(&self, token: &str) -> Result<String, EtlError> {
        let plain = self
            .inner
            .decrypt(token)
            .map_err(|_| EtlError::Crypto("token does not verify under this key".to_string()))?;
        String::from_utf8(plain)
            .map_err(|_| EtlError::Crypto("decrypted payload is not valid text".to_string()))
    }

    /// Copy of `frame` with every present value of `column` encrypted.
    /// Null cells stay null.
    ///
    /// # Errors
    /// `MissingColumn` if `column` is not in the header.
    pub fn encrypt_column(&self, frame: &Frame, column: &str) -> Result<Frame, EtlError> {
        let index = frame
            .column_index(column)
            .ok_or_else(|| EtlError::MissingColumn(column.to_string()))?;
        debug!("encrypting column '{column}' over {} rows", frame.len());
        Ok(frame.map_column(index, |value| self.encrypt(value)))
    }
}
