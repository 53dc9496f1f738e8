//! `.vult` 容器编解码
//!
//! 文件内容：base64(VaultContainer protobuf)；
//! 容器内 `vault` 字段：base64(Vault protobuf) 或 base64(nonce || 密文 || tag)。

use base64::{engine::general_purpose::STANDARD, Engine as _};
use prost::Message;
use zeroize::Zeroizing;

use crate::domain::vault::{VaultContainer, VaultRecord};
use crate::error::VaultError;
use crate::infrastructure::encryption::{self, KeyDerivation};
use crate::infrastructure::proto::VaultContainerProto;
use crate::service::vault_record_codec;

/// 当前写出的容器版本
pub const CONTAINER_VERSION: u64 = 1;

/// 解码外层容器（不解密）
pub fn decode_container(input: &[u8]) -> Result<VaultContainer, VaultError> {
    // 文件可能带换行或首尾空白
    let text: Vec<u8> = input
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if text.is_empty() {
        return Err(VaultError::MalformedContainer("empty input".to_string()));
    }

    let raw = STANDARD
        .decode(&text)
        .map_err(|e| VaultError::MalformedContainer(format!("outer base64: {}", e)))?;
    let proto = VaultContainerProto::decode(raw.as_slice())
        .map_err(|e| VaultError::MalformedContainer(format!("protobuf: {}", e)))?;
    let payload = STANDARD
        .decode(proto.vault.trim())
        .map_err(|e| VaultError::MalformedContainer(format!("inner base64: {}", e)))?;

    tracing::info!(
        version = proto.version,
        encrypted = proto.is_encrypted,
        payload_len = payload.len(),
        "vault container decoded"
    );

    Ok(VaultContainer {
        version: proto.version,
        payload,
        is_encrypted: proto.is_encrypted,
    })
}

/// 编码外层容器（.vult 文件内容）
pub fn encode_container(container: &VaultContainer) -> String {
    let proto = VaultContainerProto {
        version: container.version,
        vault: STANDARD.encode(&container.payload),
        is_encrypted: container.is_encrypted,
    };
    STANDARD.encode(proto.encode_to_vec())
}

/// 取出记录字节（按需解密，兼容模式 SHA-256 密钥）
pub fn open_container(
    container: &VaultContainer,
    password: Option<&str>,
) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    open_container_with(container, password, KeyDerivation::LegacySha256)
}

/// 取出记录字节（指定密钥派生方式）
///
/// 未加密的容器忽略密码；加密容器缺少密码（或为空）返回 `PasswordRequired`。
pub fn open_container_with(
    container: &VaultContainer,
    password: Option<&str>,
    kdf: KeyDerivation,
) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    if !container.is_encrypted {
        return Ok(Zeroizing::new(container.payload.clone()));
    }

    let password = password
        .filter(|p| !p.is_empty())
        .ok_or(VaultError::PasswordRequired)?;

    let plaintext =
        encryption::open_with_password(&container.payload, password, kdf).map_err(|e| {
            tracing::warn!(error_code = e.code(), kdf = kdf.name(), "vault decryption failed");
            e
        })?;
    tracing::debug!(kdf = kdf.name(), "vault payload decrypted");
    Ok(plaintext)
}

/// 封装记录字节为容器（有密码则加密，兼容模式）
pub fn seal_container(
    record_bytes: &[u8],
    password: Option<&str>,
) -> Result<VaultContainer, VaultError> {
    seal_container_with(record_bytes, password, KeyDerivation::LegacySha256)
}

/// 封装记录字节为容器（指定密钥派生方式）
pub fn seal_container_with(
    record_bytes: &[u8],
    password: Option<&str>,
    kdf: KeyDerivation,
) -> Result<VaultContainer, VaultError> {
    match password.filter(|p| !p.is_empty()) {
        Some(password) => Ok(VaultContainer {
            version: CONTAINER_VERSION,
            payload: encryption::seal_with_password(record_bytes, password, kdf)?,
            is_encrypted: true,
        }),
        None => Ok(VaultContainer {
            version: CONTAINER_VERSION,
            payload: record_bytes.to_vec(),
            is_encrypted: false,
        }),
    }
}

/// 一步加载：解码容器 → 解密 → 解码记录
pub fn load_vault(input: &[u8], password: Option<&str>) -> Result<VaultRecord, VaultError> {
    load_vault_with(input, password, KeyDerivation::LegacySha256)
}

pub fn load_vault_with(
    input: &[u8],
    password: Option<&str>,
    kdf: KeyDerivation,
) -> Result<VaultRecord, VaultError> {
    let container = decode_container(input)?;
    let record_bytes = open_container_with(&container, password, kdf)?;
    vault_record_codec::decode_vault_record(&record_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> VaultRecord {
        VaultRecord {
            name: "Test".into(),
            public_key_eddsa: Some([0x11; 32]),
            local_party_id: "laptop".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_unencrypted_container() {
        let bytes = vault_record_codec::encode_vault_record(&record());
        let container = seal_container(&bytes, None).unwrap();
        assert!(!container.is_encrypted);

        let text = encode_container(&container);
        let decoded = decode_container(format!("\n{}\r\n", text).as_bytes()).unwrap();
        assert_eq!(decoded, container);

        // 未加密时忽略密码
        let opened = open_container(&decoded, Some("ignored")).unwrap();
        assert_eq!(opened.as_slice(), bytes.as_slice());
    }

    #[test]
    fn test_encrypted_container() {
        let bytes = vault_record_codec::encode_vault_record(&record());
        let text = encode_container(&seal_container(&bytes, Some("hunter2")).unwrap());

        assert_eq!(load_vault(text.as_bytes(), Some("hunter2")).unwrap(), record());
        assert_eq!(
            load_vault(text.as_bytes(), Some("hunter3")).unwrap_err(),
            VaultError::AuthenticationFailed
        );
        assert_eq!(
            load_vault(text.as_bytes(), None).unwrap_err(),
            VaultError::PasswordRequired
        );
        assert_eq!(
            load_vault(text.as_bytes(), Some("")).unwrap_err(),
            VaultError::PasswordRequired
        );
    }

    #[test]
    fn test_pbkdf2_container() {
        let kdf = KeyDerivation::Pbkdf2Sha256 { iterations: 1_000 };
        let bytes = vault_record_codec::encode_vault_record(&record());
        let container = seal_container_with(&bytes, Some("pw"), kdf).unwrap();
        let text = encode_container(&container);

        assert_eq!(load_vault_with(text.as_bytes(), Some("pw"), kdf).unwrap(), record());
    }

    #[test]
    fn test_short_ciphertext() {
        let container = VaultContainer {
            version: 1,
            payload: vec![0u8; 20],
            is_encrypted: true,
        };
        assert_eq!(
            open_container(&container, Some("pw")).unwrap_err(),
            VaultError::MalformedCiphertext { len: 20, min: 28 }
        );
    }

    #[test]
    fn test_malformed_outer_layers() {
        assert!(matches!(
            decode_container(b""),
            Err(VaultError::MalformedContainer(_))
        ));
        assert!(matches!(
            decode_container(b"not base64 !!!"),
            Err(VaultError::MalformedContainer(_))
        ));

        // 合法 base64，但内层不是 base64
        let proto = VaultContainerProto {
            version: 1,
            vault: "%%%".into(),
            is_encrypted: false,
        };
        let text = STANDARD.encode(proto.encode_to_vec());
        let err = decode_container(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("inner base64"));
    }
}
