//! AES-256-GCM 加密/解密模块
//! 用于 `.vult` 容器载荷：nonce(12) || ciphertext || tag(16)

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::VaultError;
use crate::infrastructure::pbkdf2::{self, SALT_LENGTH};

pub const NONCE_LENGTH: usize = 12;
pub const TAG_LENGTH: usize = 16;
/// 最短合法密文：nonce + 空明文 + tag
pub const MIN_SEALED_LENGTH: usize = NONCE_LENGTH + TAG_LENGTH;

/// 容器密码 → AES 密钥的派生方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyDerivation {
    /// key = SHA-256(password)，现有 .vult 文件使用
    #[default]
    LegacySha256,
    /// key = PBKDF2-HMAC-SHA256(password, salt, iterations)，载荷前置 16 字节盐值
    Pbkdf2Sha256 { iterations: u32 },
}

impl KeyDerivation {
    /// 该方式下载荷的最短长度
    pub fn min_payload_len(&self) -> usize {
        match self {
            KeyDerivation::LegacySha256 => MIN_SEALED_LENGTH,
            KeyDerivation::Pbkdf2Sha256 { .. } => SALT_LENGTH + MIN_SEALED_LENGTH,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KeyDerivation::LegacySha256 => "sha256",
            KeyDerivation::Pbkdf2Sha256 { .. } => "pbkdf2",
        }
    }
}

/// 加密密钥（使用Zeroize保护）
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    key: [u8; 32],
}

impl EncryptionKey {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// 兼容模式：SHA-256(password)
    pub fn from_password_sha256(password: &str) -> Self {
        Self {
            key: Sha256::digest(password.as_bytes()).into(),
        }
    }

    pub fn from_password_pbkdf2(
        password: &str,
        salt: &[u8],
        iterations: u32,
    ) -> Result<Self, VaultError> {
        Ok(Self {
            key: pbkdf2::derive_key_with_salt(password, salt, iterations)?,
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.key
    }
}

/// 加密数据
///
/// 返回 nonce (12字节) || ciphertext || tag (16字节)，每次使用新的随机 nonce
pub fn encrypt_data(data: &[u8], key: &EncryptionKey) -> Result<Vec<u8>, VaultError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|e| VaultError::Encryption(format!("Invalid key: {}", e)))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, data)
        .map_err(|e| VaultError::Encryption(format!("Encryption failed: {}", e)))?;

    // 将 nonce (12字节) 和 ciphertext 组合
    let mut result = nonce.to_vec();
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// 解密数据
///
/// 标签校验失败（密码错误或数据被篡改）统一返回 `AuthenticationFailed`，
/// 不区分具体原因。
pub fn decrypt_data(
    encrypted: &[u8],
    key: &EncryptionKey,
) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    if encrypted.len() < MIN_SEALED_LENGTH {
        return Err(VaultError::MalformedCiphertext {
            len: encrypted.len(),
            min: MIN_SEALED_LENGTH,
        });
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|e| VaultError::Encryption(format!("Invalid key: {}", e)))?;

    // 提取 nonce（前12字节）
    let nonce = Nonce::from_slice(&encrypted[..NONCE_LENGTH]);
    let ciphertext = &encrypted[NONCE_LENGTH..];

    cipher
        .decrypt(nonce, ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| VaultError::AuthenticationFailed)
}

/// 使用密码加密
pub fn seal_with_password(
    data: &[u8],
    password: &str,
    kdf: KeyDerivation,
) -> Result<Vec<u8>, VaultError> {
    match kdf {
        KeyDerivation::LegacySha256 => {
            encrypt_data(data, &EncryptionKey::from_password_sha256(password))
        }
        KeyDerivation::Pbkdf2Sha256 { iterations } => {
            let salt = pbkdf2::generate_salt();
            let key = EncryptionKey::from_password_pbkdf2(password, &salt, iterations)?;
            let mut sealed = salt.to_vec();
            sealed.extend_from_slice(&encrypt_data(data, &key)?);
            Ok(sealed)
        }
    }
}

/// 使用密码解密
pub fn open_with_password(
    encrypted: &[u8],
    password: &str,
    kdf: KeyDerivation,
) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    let min = kdf.min_payload_len();
    if encrypted.len() < min {
        return Err(VaultError::MalformedCiphertext {
            len: encrypted.len(),
            min,
        });
    }

    match kdf {
        KeyDerivation::LegacySha256 => {
            decrypt_data(encrypted, &EncryptionKey::from_password_sha256(password))
        }
        KeyDerivation::Pbkdf2Sha256 { iterations } => {
            let (salt, sealed) = encrypted.split_at(SALT_LENGTH);
            let key = EncryptionKey::from_password_pbkdf2(password, salt, iterations)?;
            decrypt_data(sealed, &key)
        }
    }
}
