//! PBKDF2 密钥派生模块
//! 可选的容器密码派生方式（默认仍是兼容旧文件的 SHA-256）

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use crate::error::VaultError;

/// PBKDF2 密钥派生参数
pub const DEFAULT_ITERATIONS: u32 = 100_000; // 100,000次迭代
pub const MIN_ITERATIONS: u32 = 10_000;
pub const SALT_LENGTH: usize = 16; // 16字节盐值
pub const KEY_LENGTH: usize = 32; // 32字节密钥（AES-256）

/// 生成随机盐值
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// 从密码和盐值派生密钥
pub fn derive_key_with_salt(
    password: &str,
    salt: &[u8],
    iterations: u32,
) -> Result<[u8; KEY_LENGTH], VaultError> {
    if salt.len() != SALT_LENGTH {
        return Err(VaultError::Encryption(format!(
            "Salt must be {} bytes",
            SALT_LENGTH
        )));
    }
    if iterations == 0 {
        return Err(VaultError::Encryption(
            "PBKDF2 iterations must be positive".to_string(),
        ));
    }

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    Ok(key)
}
