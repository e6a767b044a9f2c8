use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use keyring::Entry;
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};

const KEYRING_SERVICE: &str = "saveraks.ai.vault";
const VERSION_PREFIX: &str = "v1:";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const PBKDF2_ITERATIONS: u32 = 120_000;

/// Encrypts the stored scanner API key at rest. The master secret lives
/// in the OS keyring, keyed per database path so two installs on one
/// machine do not share credentials.
#[derive(Clone)]
pub struct CryptoVault {
    account: String,
}

impl CryptoVault {
    pub fn from_database_path(path: &Path) -> AppResult<Self> {
        let account = account_from_path(path);
        Self::new(&account)
    }

    pub fn new(account_id: &str) -> AppResult<Self> {
        Entry::new(KEYRING_SERVICE, account_id)
            .map_err(|err| AppError::other(format!("failed to open system keyring: {err}")))?;
        Ok(Self {
            account: account_id.to_string(),
        })
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> AppResult<String> {
        let master = self.load_or_create_master_secret()?;
        encrypt_with_master(&master, plaintext)
    }

    pub fn decrypt(&self, ciphertext: &str) -> AppResult<Vec<u8>> {
        let master = self.load_or_create_master_secret()?;
        decrypt_with_master(&master, ciphertext)
    }

    pub fn clear_master_secret(&self) -> AppResult<()> {
        let entry = self.entry()?;
        match entry.delete_password() {
            Ok(_) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(AppError::other(format!(
                "failed to remove keyring credential: {err}"
            ))),
        }
    }

    fn load_or_create_master_secret(&self) -> AppResult<Vec<u8>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(secret) => decode_master_secret(&secret),
            Err(keyring::Error::NoEntry) => self.create_master_secret(entry),
            Err(err) => Err(AppError::other(format!(
                "failed to read system keyring: {err}"
            ))),
        }
    }

    fn create_master_secret(&self, entry: Entry) -> AppResult<Vec<u8>> {
        let mut secret = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut secret);
        let encoded = Base64.encode(&secret);
        entry
            .set_password(&encoded)
            .map_err(|err| AppError::other(format!("failed to write system keyring: {err}")))?;
        Ok(secret)
    }

    fn entry(&self) -> AppResult<Entry> {
        Entry::new(KEYRING_SERVICE, &self.account)
            .map_err(|err| AppError::other(format!("failed to open system keyring: {err}")))
    }
}

pub(crate) fn encrypt_with_master(master_secret: &[u8], plaintext: &[u8]) -> AppResult<String> {
    if master_secret.len() != KEY_LEN {
        return Err(AppError::other("master secret has invalid length"));
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let key = derive_key(master_secret, &salt);
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|_| AppError::other("failed to initialize cipher"))?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| AppError::other("encryption failed"))?;

    let mut payload = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    payload.extend_from_slice(&salt);
    payload.extend_from_slice(&nonce);
    payload.extend_from_slice(&ciphertext);

    Ok(format!("{VERSION_PREFIX}{}", Base64.encode(payload)))
}

pub(crate) fn decrypt_with_master(master_secret: &[u8], ciphertext: &str) -> AppResult<Vec<u8>> {
    if master_secret.len() != KEY_LEN {
        return Err(AppError::other("master secret has invalid length"));
    }

    let encoded = ciphertext
        .strip_prefix(VERSION_PREFIX)
        .ok_or_else(|| AppError::other("unsupported ciphertext format"))?;

    let decoded = Base64
        .decode(encoded.as_bytes())
        .map_err(|_| AppError::other("ciphertext is corrupted"))?;

    if decoded.len() <= SALT_LEN + NONCE_LEN {
        return Err(AppError::other("ciphertext is truncated"));
    }

    let (salt, rest) = decoded.split_at(SALT_LEN);
    let (nonce_bytes, ciphertext_bytes) = rest.split_at(NONCE_LEN);

    let key = derive_key(master_secret, salt);
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|_| AppError::other("failed to initialize cipher"))?;

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext_bytes)
        .map_err(|_| AppError::other("decryption failed"))
}

fn derive_key(master: &[u8], salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(master, salt, PBKDF2_ITERATIONS, &mut key);
    key
}

fn decode_master_secret(encoded: &str) -> AppResult<Vec<u8>> {
    let secret = Base64
        .decode(encoded.as_bytes())
        .map_err(|_| AppError::other("keyring credential is corrupted"))?;
    if secret.len() != KEY_LEN {
        return Err(AppError::other("keyring credential has invalid length"));
    }
    Ok(secret)
}

fn account_from_path(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"saveraks.scanner.v1");
    hasher.update(path.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(32);
    for byte in digest[..16].iter() {
        hex.push_str(&format!("{:02x}", byte));
    }
    format!("gemini-{}", hex)
}
